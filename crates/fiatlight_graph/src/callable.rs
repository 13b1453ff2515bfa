//! Typed Rust functions adapted into dynamic callables.
//!
//! [`IntoFiatFunction`] is implemented for every `Fn(P0, .., Pn) -> R`
//! (n ≤ 8) whose parameters are [`FiatType`]s and whose return is a
//! [`FiatReturn`]. The adapted callable takes its arguments as
//! [`FiatValue`]s, converts them, calls the function and converts the
//! result back.

use core::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use fiatlight_core::{FiatReturn, FiatType, FiatValue, TypeSpec};
use variadics_please::all_tuples;

use crate::error::FunctionError;

/// A type-erased function over dynamic values.
///
/// `Err` carries the failure message (the error's `Display`, or an
/// argument conversion failure).
pub type DynCallable = Arc<dyn Fn(Vec<FiatValue>) -> Result<FiatValue, String> + Send + Sync>;

/// A callable together with the shapes of its parameters and return.
pub struct FiatFunctionParts {
    /// One spec per parameter, in call order.
    pub param_specs: Vec<TypeSpec>,
    /// Spec of the successful return value.
    pub return_spec: TypeSpec,
    /// The adapted callable.
    pub callable: DynCallable,
}

/// Converts a typed function into [`FiatFunctionParts`].
///
/// The `Marker` parameter distinguishes the implementations for each
/// arity; it is always inferred.
///
/// # Example
///
/// ```
/// use fiatlight_core::FiatValue;
/// use fiatlight_graph::IntoFiatFunction;
///
/// let parts = (|a: i64, b: i64| a + b).into_parts();
/// assert_eq!(parts.param_specs.len(), 2);
/// assert_eq!((parts.callable)(vec![FiatValue::Int(3), FiatValue::Int(2)]), Ok(FiatValue::Int(5)));
/// ```
pub trait IntoFiatFunction<Marker>: Send + Sync + 'static {
    /// Performs the conversion.
    fn into_parts(self) -> FiatFunctionParts;
}

fn take_arg<T: FiatType>(args: &mut std::vec::IntoIter<FiatValue>, name: &str) -> Result<T, String> {
    let value = args.next().ok_or_else(|| format!("missing argument {name}"))?;
    T::from_fiat(value).map_err(|e| format!("argument {name}: {e}"))
}

impl<Func, R> IntoFiatFunction<fn() -> R> for Func
where
    Func: Fn() -> R + Send + Sync + 'static,
    R: FiatReturn,
{
    fn into_parts(self) -> FiatFunctionParts {
        let callable = move |args: Vec<FiatValue>| -> Result<FiatValue, String> {
            if !args.is_empty() {
                return Err(format!("expected 0 arguments, got {}", args.len()));
            }
            self().into_outcome()
        };
        FiatFunctionParts {
            param_specs: Vec::new(),
            return_spec: R::return_spec(),
            callable: Arc::new(callable),
        }
    }
}

macro_rules! impl_into_fiat_function {
    ($(($P:ident, $p:ident)),*) => {
        impl<Func, R, $($P),*> IntoFiatFunction<fn($($P,)*) -> R> for Func
        where
            Func: Fn($($P),*) -> R + Send + Sync + 'static,
            R: FiatReturn,
            $($P: FiatType,)*
        {
            fn into_parts(self) -> FiatFunctionParts {
                let callable = move |args: Vec<FiatValue>| -> Result<FiatValue, String> {
                    let arity = <[&str]>::len(&[$(stringify!($P)),*]);
                    if args.len() != arity {
                        return Err(format!("expected {arity} arguments, got {}", args.len()));
                    }
                    let mut args = args.into_iter();
                    $(
                        let $p = take_arg::<$P>(&mut args, stringify!($p))?;
                    )*
                    self($($p),*).into_outcome()
                };
                FiatFunctionParts {
                    param_specs: vec![$($P::type_spec()),*],
                    return_spec: R::return_spec(),
                    callable: Arc::new(callable),
                }
            }
        }
    };
}

all_tuples!(impl_into_fiat_function, 1, 8, P, p);

// ─────────────────────────────────────────────────────────────────────────────
// Failure capture
// ─────────────────────────────────────────────────────────────────────────────

/// A failed call: the error message and, for panics, a backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionFailure {
    /// Error message, or panic payload.
    pub message: String,
    /// Backtrace captured when a panic was caught.
    pub traceback: Option<String>,
}

impl FunctionFailure {
    /// Whether the failure was a panic.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.traceback.is_some()
    }

    /// Converts into the error surfaced when failures are not caught.
    #[must_use]
    pub fn into_function_error(self, function: &str) -> FunctionError {
        let function = function.to_string();
        match self.traceback {
            Some(traceback) => FunctionError::Panicked {
                function,
                message: self.message,
                traceback,
            },
            None => FunctionError::Failed {
                function,
                message: self.message,
            },
        }
    }
}

/// Calls `callable`, turning both returned errors and panics into a [`FunctionFailure`].
pub fn call_catching(callable: &DynCallable, args: Vec<FiatValue>) -> Result<FiatValue, FunctionFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| callable(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(FunctionFailure {
            message,
            traceback: None,
        }),
        Err(payload) => Err(FunctionFailure {
            message: panic_message(payload.as_ref()),
            traceback: Some(Backtrace::force_capture().to_string()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(a: i64, b: i64) -> i64 {
        a + b
    }

    fn checked_div(a: f64, b: f64) -> Result<f64, String> {
        if b == 0.0 { Err("division by zero".into()) } else { Ok(a / b) }
    }

    #[test]
    fn function_items_and_closures_adapt() {
        let parts = add.into_parts();
        assert_eq!(parts.return_spec.typename(), "int");
        assert_eq!(
            (parts.callable)(vec![FiatValue::Int(3), FiatValue::Int(2)]),
            Ok(FiatValue::Int(5))
        );

        let parts = (|| "hello".to_string()).into_parts();
        assert!(parts.param_specs.is_empty());
        assert_eq!((parts.callable)(vec![]), Ok(FiatValue::Str("hello".into())));
    }

    #[test]
    fn arity_and_conversion_errors_are_messages() {
        let parts = add.into_parts();
        assert_eq!(
            (parts.callable)(vec![FiatValue::Int(3)]),
            Err("expected 2 arguments, got 1".to_string())
        );
        let err = (parts.callable)(vec![FiatValue::Int(3), FiatValue::Str("x".into())]).unwrap_err();
        assert!(err.starts_with("argument p1"), "{err}");
    }

    #[test]
    fn tuple_returns_keep_their_shape() {
        let parts = (|x: i64| (x, x * 2)).into_parts();
        assert_eq!(parts.return_spec.typename(), "Tuple[int, int]");
        assert_eq!(
            (parts.callable)(vec![FiatValue::Int(2)]),
            Ok(FiatValue::Tuple(vec![FiatValue::Int(2), FiatValue::Int(4)]))
        );
    }

    #[test]
    fn errors_and_panics_are_caught() {
        let parts = checked_div.into_parts();
        let failure = call_catching(&parts.callable, vec![FiatValue::Float(1.0), FiatValue::Float(0.0)]).unwrap_err();
        assert_eq!(failure.message, "division by zero");
        assert!(!failure.is_panic());

        let parts = (|x: i64| -> i64 { panic!("bad input {x}") }).into_parts();
        let failure = call_catching(&parts.callable, vec![FiatValue::Int(7)]).unwrap_err();
        assert_eq!(failure.message, "bad input 7");
        assert!(failure.is_panic());
    }
}
