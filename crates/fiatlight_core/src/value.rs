//! Dynamic values carried by widgets.
//!
//! - [`FiatValue`]: a concrete value of any reflected type
//! - [`DataValue`]: the four states a widget value can be in
//! - [`CustomValue`]: an opaque payload for types that come with a hand-written widget

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

// ─────────────────────────────────────────────────────────────────────────────
// CustomValue
// ─────────────────────────────────────────────────────────────────────────────

/// An opaque value whose widget was registered by the application.
///
/// The payload is shared; cloning a `CustomValue` does not clone the payload.
/// Two custom values are equal when they share the same payload.
#[derive(Clone)]
pub struct CustomValue {
    typename: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    /// Wraps `payload` under the given fully-qualified typename.
    pub fn new<T: Any + Send + Sync>(typename: impl Into<String>, payload: T) -> Self {
        Self {
            typename: typename.into(),
            payload: Arc::new(payload),
        }
    }

    /// Returns the typename this value was created with.
    #[must_use]
    pub fn typename(&self) -> &str {
        &self.typename
    }

    /// Returns the payload if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.typename == other.typename && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomValue").field(&self.typename).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FiatValue
// ─────────────────────────────────────────────────────────────────────────────

/// A concrete, structurally comparable value.
///
/// Every [`FiatType`](crate::FiatType) converts to and from this
/// representation, which is what widgets, links and persistence operate on.
#[derive(Debug, Clone, PartialEq)]
pub enum FiatValue {
    /// The absence of a value (`None` in an optional).
    None,
    /// A boolean.
    Bool(bool),
    /// Any integer type.
    Int(i64),
    /// Any floating point type.
    Float(f64),
    /// A string.
    Str(String),
    /// A homogeneous list.
    List(Vec<FiatValue>),
    /// A fixed-arity tuple.
    Tuple(Vec<FiatValue>),
    /// A unit variant of an enum.
    Enum {
        /// Name of the enum type (without module path).
        class: String,
        /// Name of the selected variant.
        variant: String,
    },
    /// A record (struct with named fields).
    Record {
        /// Fully-qualified typename of the record.
        typename: String,
        /// Field values, in declaration order.
        fields: IndexMap<String, FiatValue>,
    },
    /// An opaque application value.
    Custom(CustomValue),
}

impl FiatValue {
    /// Builds a record value from `(name, value)` pairs.
    pub fn record<K, I>(typename: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FiatValue)>,
    {
        Self::Record {
            typename: typename.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Builds an enum value.
    pub fn variant(class: impl Into<String>, variant: impl Into<String>) -> Self {
        Self::Enum {
            class: class.into(),
            variant: variant.into(),
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Enum { .. } => "enum",
            Self::Record { .. } => "record",
            Self::Custom(_) => "custom",
        }
    }

    /// Returns `true` for [`FiatValue::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the integer, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a numeric value as `f64` (integers are widened).
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string, if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the elements of a `List` or a `Tuple`.
    #[must_use]
    pub fn as_items(&self) -> Option<&[FiatValue]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the named field of a record.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FiatValue> {
        match self {
            Self::Record { fields, .. } => fields.get(name),
            _ => None,
        }
    }
}

impl fmt::Display for FiatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[FiatValue]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Self::None => f.write_str("None"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                join(f, items)?;
                f.write_str(")")
            }
            Self::Enum { class, variant } => write!(f, "{class}::{variant}"),
            Self::Record { typename, fields } => {
                let basename = typename.rsplit("::").next().unwrap_or(typename);
                write!(f, "{basename} {{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str(" }")
            }
            Self::Custom(custom) => write!(f, "<{}>", custom.typename()),
        }
    }
}

impl From<bool> for FiatValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FiatValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FiatValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for FiatValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for FiatValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for FiatValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<String> for FiatValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for FiatValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl<A: Into<FiatValue>, B: Into<FiatValue>> From<(A, B)> for FiatValue {
    fn from((a, b): (A, B)) -> Self {
        Self::Tuple(vec![a.into(), b.into()])
    }
}

impl From<CustomValue> for FiatValue {
    fn from(v: CustomValue) -> Self {
        Self::Custom(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DataValue
// ─────────────────────────────────────────────────────────────────────────────

/// The value held by a widget.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    /// No value was ever assigned.
    #[default]
    Unspecified,
    /// The producing function failed.
    Error,
    /// The user entered a value that a validator rejected.
    ///
    /// The value is retained so that it can be corrected.
    Invalid {
        /// The rejected value.
        value: FiatValue,
        /// Validator messages, joined with `"; "`.
        message: String,
    },
    /// A valid value.
    Value(FiatValue),
}

impl DataValue {
    /// Builds an invalid value.
    pub fn invalid(value: FiatValue, message: impl Into<String>) -> Self {
        Self::Invalid {
            value,
            message: message.into(),
        }
    }

    /// Returns `true` if no value was assigned.
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }

    /// Returns `true` if the producing function failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns `true` if a validator rejected the value.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// Returns `true` if this holds a valid value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns the valid value, if any.
    #[must_use]
    pub fn as_value(&self) -> Option<&FiatValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value that should be displayed: the valid value or the
    /// retained invalid one.
    #[must_use]
    pub fn displayed_value(&self) -> Option<&FiatValue> {
        match self {
            Self::Value(v) | Self::Invalid { value: v, .. } => Some(v),
            Self::Unspecified | Self::Error => None,
        }
    }

    /// Returns the validation message of an invalid value.
    #[must_use]
    pub fn invalid_message(&self) -> Option<&str> {
        match self {
            Self::Invalid { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Name of the state, used in messages.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Error => "Error",
            Self::Invalid { .. } => "Invalid",
            Self::Value(_) => "Value",
        }
    }
}

impl From<FiatValue> for DataValue {
    fn from(v: FiatValue) -> Self {
        Self::Value(v)
    }
}
