//! Mapping between Rust types and reflected values.
//!
//! - [`FiatType`]: a type with a [`TypeSpec`] and conversions to and from [`FiatValue`]
//! - [`FiatReturn`]: what a wrapped function may return (a value, or a `Result`)

use core::fmt;

use variadics_please::all_tuples;

use crate::error::ValueError;
use crate::schema::TypeSpec;
use crate::value::FiatValue;

/// A Rust type that Fiatlight can build widgets for.
///
/// Implemented for integers, floats, `bool`, `String`, `()`, `Option<T>`,
/// `Vec<T>` and tuples of up to eight elements. Records, enums and new
/// types derive it with `#[derive(FiatRecord)]`, `#[derive(FiatEnum)]` and
/// `#[derive(FiatNewType)]`.
pub trait FiatType: Sized + Send + 'static {
    /// Shape of the type.
    fn type_spec() -> TypeSpec;

    /// Converts into a dynamic value.
    fn into_fiat(self) -> FiatValue;

    /// Converts from a dynamic value.
    fn from_fiat(value: FiatValue) -> Result<Self, ValueError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Primitives
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! impl_fiat_type_int {
    ($($ty:ty),*) => {
        $(
            impl FiatType for $ty {
                fn type_spec() -> TypeSpec {
                    TypeSpec::Int
                }

                fn into_fiat(self) -> FiatValue {
                    FiatValue::Int(i64::try_from(self).unwrap_or(i64::MAX))
                }

                fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
                    match value {
                        FiatValue::Int(v) => <$ty>::try_from(v).map_err(|_| ValueError::IntOutOfRange {
                            value: v,
                            target: stringify!($ty),
                        }),
                        other => Err(ValueError::mismatch("int", &other)),
                    }
                }
            }
        )*
    };
}

impl_fiat_type_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FiatType for f64 {
    fn type_spec() -> TypeSpec {
        TypeSpec::Float
    }

    fn into_fiat(self) -> FiatValue {
        FiatValue::Float(self)
    }

    fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
        value
            .as_float()
            .ok_or_else(|| ValueError::mismatch("float", &value))
    }
}

impl FiatType for f32 {
    fn type_spec() -> TypeSpec {
        TypeSpec::Float
    }

    fn into_fiat(self) -> FiatValue {
        FiatValue::Float(f64::from(self))
    }

    fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
        f64::from_fiat(value).map(|v| v as f32)
    }
}

impl FiatType for bool {
    fn type_spec() -> TypeSpec {
        TypeSpec::Bool
    }

    fn into_fiat(self) -> FiatValue {
        FiatValue::Bool(self)
    }

    fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
        value
            .as_bool()
            .ok_or_else(|| ValueError::mismatch("bool", &value))
    }
}

impl FiatType for String {
    fn type_spec() -> TypeSpec {
        TypeSpec::Str
    }

    fn into_fiat(self) -> FiatValue {
        FiatValue::Str(self)
    }

    fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
        match value {
            FiatValue::Str(v) => Ok(v),
            other => Err(ValueError::mismatch("str", &other)),
        }
    }
}

impl FiatType for () {
    fn type_spec() -> TypeSpec {
        TypeSpec::NoneType
    }

    fn into_fiat(self) -> FiatValue {
        FiatValue::None
    }

    fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
        match value {
            FiatValue::None => Ok(()),
            other => Err(ValueError::mismatch("None", &other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Containers
// ─────────────────────────────────────────────────────────────────────────────

impl<T: FiatType> FiatType for Option<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::optional(T::type_spec())
    }

    fn into_fiat(self) -> FiatValue {
        self.map_or(FiatValue::None, FiatType::into_fiat)
    }

    fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
        match value {
            FiatValue::None => Ok(None),
            other => T::from_fiat(other).map(Some),
        }
    }
}

impl<T: FiatType> FiatType for Vec<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::list(T::type_spec())
    }

    fn into_fiat(self) -> FiatValue {
        FiatValue::List(self.into_iter().map(FiatType::into_fiat).collect())
    }

    fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
        match value {
            FiatValue::List(items) => items.into_iter().map(T::from_fiat).collect(),
            other => Err(ValueError::mismatch("list", &other)),
        }
    }
}

macro_rules! impl_fiat_type_tuple {
    ($(($ty:ident, $var:ident)),*) => {
        impl<$($ty: FiatType),*> FiatType for ($($ty,)*) {
            fn type_spec() -> TypeSpec {
                TypeSpec::Tuple(vec![$($ty::type_spec()),*])
            }

            fn into_fiat(self) -> FiatValue {
                let ($($var,)*) = self;
                FiatValue::Tuple(vec![$($var.into_fiat()),*])
            }

            fn from_fiat(value: FiatValue) -> Result<Self, ValueError> {
                let items = match value {
                    FiatValue::Tuple(items) => items,
                    other => return Err(ValueError::mismatch("tuple", &other)),
                };
                let expected = [$(stringify!($ty)),*].len();
                if items.len() != expected {
                    return Err(ValueError::TupleArity {
                        expected,
                        got: items.len(),
                    });
                }
                let mut items = items.into_iter();
                Ok(($(
                    $ty::from_fiat(items.next().ok_or(ValueError::TupleArity { expected, got: 0 })?)?,
                )*))
            }
        }
    };
}

all_tuples!(impl_fiat_type_tuple, 2, 8, T, t);

// ─────────────────────────────────────────────────────────────────────────────
// Return values
// ─────────────────────────────────────────────────────────────────────────────

/// What a wrapped function may return.
///
/// A plain [`FiatType`] always succeeds; `Result<T, E>` maps `Err` to a
/// failed invocation whose message is `E`'s `Display`.
pub trait FiatReturn: Send + 'static {
    /// Shape of the successful value.
    fn return_spec() -> TypeSpec;

    /// Converts into a value or a failure message.
    fn into_outcome(self) -> Result<FiatValue, String>;
}

impl<T: FiatType> FiatReturn for T {
    fn return_spec() -> TypeSpec {
        T::type_spec()
    }

    fn into_outcome(self) -> Result<FiatValue, String> {
        Ok(self.into_fiat())
    }
}

impl<T: FiatType, E: fmt::Display + Send + 'static> FiatReturn for Result<T, E> {
    fn return_spec() -> TypeSpec {
        T::type_spec()
    }

    fn into_outcome(self) -> Result<FiatValue, String> {
        self.map(FiatType::into_fiat).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_check_their_range() {
        assert_eq!(u8::from_fiat(FiatValue::Int(255)), Ok(255));
        assert_eq!(
            u8::from_fiat(FiatValue::Int(256)),
            Err(ValueError::IntOutOfRange {
                value: 256,
                target: "u8"
            })
        );
        assert!(i32::from_fiat(FiatValue::Str("1".into())).is_err());
    }

    #[test]
    fn floats_accept_integers() {
        assert_eq!(f64::from_fiat(FiatValue::Int(2)), Ok(2.0));
    }

    #[test]
    fn containers_round_trip() {
        let value = (3_i64, vec![Some("a".to_string()), None], 1.5_f64);
        let fiat = value.clone().into_fiat();
        assert_eq!(
            fiat,
            FiatValue::Tuple(vec![
                FiatValue::Int(3),
                FiatValue::List(vec![FiatValue::Str("a".into()), FiatValue::None]),
                FiatValue::Float(1.5),
            ])
        );
        assert_eq!(<(i64, Vec<Option<String>>, f64)>::from_fiat(fiat), Ok(value));
    }

    #[test]
    fn tuple_arity_is_checked() {
        let fiat = FiatValue::Tuple(vec![FiatValue::Int(1)]);
        assert_eq!(
            <(i64, i64)>::from_fiat(fiat),
            Err(ValueError::TupleArity { expected: 2, got: 1 })
        );
    }

    #[test]
    fn specs_name_containers() {
        assert_eq!(<Option<Vec<(i32, bool)>>>::type_spec().typename(), "Optional[List[Tuple[int, bool]]]");
        assert_eq!(<()>::type_spec().typename(), "None");
    }

    #[test]
    fn results_map_errors_to_messages() {
        let ok: Result<i64, String> = Ok(1);
        assert_eq!(ok.into_outcome(), Ok(FiatValue::Int(1)));
        let err: Result<i64, String> = Err("boom".into());
        assert_eq!(err.into_outcome(), Err("boom".to_string()));
        assert_eq!(<Result<f64, String>>::return_spec().typename(), "float");
    }
}
