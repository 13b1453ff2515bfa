//! Error types for registration, value conversion, serialization and configuration.

use thiserror::Error;

/// Errors raised while wrapping types and functions (at setup time, not at runtime).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A new type was registered without documentation.
    #[error("new type `{typename}` has no docstring: document the alias before registering it")]
    MissingDocstring {
        /// Alias name.
        typename: String,
    },
    /// `register_new_type` was called with a type that is not a new type.
    #[error("`{typename}` is not a new type")]
    NotANewType {
        /// Offending typename.
        typename: String,
    },
    /// A record registration was given a type that is not a record.
    #[error("`{typename}` is not a record")]
    NotARecord {
        /// Offending typename.
        typename: String,
    },
    /// An attribute is not understood by the widget.
    #[error("unknown fiat attribute `{name}` for {widget} (available: {available})")]
    UnknownAttribute {
        /// Widget kind.
        widget: String,
        /// Attribute name.
        name: String,
        /// Comma separated list of understood attributes.
        available: String,
    },
    /// An attribute has the wrong kind of value.
    #[error("fiat attribute `{name}` for {widget} expects {expected}, got {got}")]
    AttributeKind {
        /// Widget kind.
        widget: String,
        /// Attribute name.
        name: String,
        /// Expected kind.
        expected: String,
        /// Received kind.
        got: String,
    },
    /// A string attribute has a value outside its allowed set.
    #[error("fiat attribute `{name}` for {widget} must be one of [{allowed}], got `{got}`")]
    AttributeValue {
        /// Widget kind.
        widget: String,
        /// Attribute name.
        name: String,
        /// Comma separated allowed values.
        allowed: String,
        /// Received value.
        got: String,
    },
    /// A default value cannot be built.
    #[error("cannot construct a default value for `{typename}`: {reason}")]
    DefaultNotConstructible {
        /// Type whose default failed.
        typename: String,
        /// Why it failed.
        reason: String,
    },
    /// An attribute addresses a parameter that does not exist.
    #[error("fiat attribute `{attribute}` refers to parameter `{param}`, which does not exist in `{function}`")]
    UnknownParameter {
        /// Function name.
        function: String,
        /// Referenced parameter.
        param: String,
        /// Full attribute name.
        attribute: String,
    },
    /// A user-supplied signature does not match the callable.
    #[error("signature of `{function}` does not match the callable: {reason}")]
    SignatureMismatch {
        /// Function name.
        function: String,
        /// What differs.
        reason: String,
    },
    /// A user-supplied signature cannot be parsed.
    #[error("cannot parse signature `{signature}`: {reason}")]
    InvalidSignature {
        /// The signature text.
        signature: String,
        /// What is wrong.
        reason: String,
    },
}

impl RegistryError {
    /// Creates a [`RegistryError::SignatureMismatch`].
    pub fn signature_mismatch(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SignatureMismatch {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`RegistryError::InvalidSignature`].
    pub fn invalid_signature(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            signature: signature.into(),
            reason: reason.into(),
        }
    }
}

/// Errors converting a dynamic value into a typed Rust value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    /// The value has the wrong shape.
    #[error("expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected shape.
        expected: String,
        /// Received shape.
        got: String,
    },
    /// An integer does not fit the target type.
    #[error("integer {value} is out of range for {target}")]
    IntOutOfRange {
        /// The integer.
        value: i64,
        /// Target Rust type.
        target: &'static str,
    },
    /// A record field is missing.
    #[error("missing field `{field}` in {typename}")]
    MissingField {
        /// Record type.
        typename: String,
        /// Field name.
        field: String,
    },
    /// An enum variant name is unknown.
    #[error("unknown variant `{variant}` for enum {class}")]
    UnknownVariant {
        /// Enum class.
        class: String,
        /// Variant name.
        variant: String,
    },
    /// A tuple has the wrong number of elements.
    #[error("expected a tuple of {expected} elements, got {got}")]
    TupleArity {
        /// Expected arity.
        expected: usize,
        /// Received arity.
        got: usize,
    },
    /// The widget does not hold a concrete value.
    #[error("value is {state}, not a concrete value")]
    NotConcrete {
        /// State name (`Unspecified`, `Error`, `Invalid`).
        state: &'static str,
    },
}

impl ValueError {
    /// Creates a [`ValueError::TypeMismatch`] from the expected shape and the received value.
    pub fn mismatch(expected: impl Into<String>, got: &crate::FiatValue) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            got: got.kind_name().to_string(),
        }
    }
}

/// Errors while saving or loading values and GUI options.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A required key is absent.
    #[error("missing key `{0}`")]
    MissingKey(String),
    /// The `type` tag is not the one this widget produces.
    #[error("unexpected type tag `{found}` (expected `{expected}`)")]
    UnexpectedTag {
        /// Tag this widget understands.
        expected: String,
        /// Tag found in the document.
        found: String,
    },
    /// An enum was saved for another class.
    #[error("enum class mismatch: expected `{expected}`, got `{found}`")]
    EnumClassMismatch {
        /// Class of this widget.
        expected: String,
        /// Class found in the document.
        found: String,
    },
    /// The document has the right tag but malformed content.
    #[error("malformed {what}: {reason}")]
    Malformed {
        /// What was being read.
        what: String,
        /// What is wrong.
        reason: String,
    },
    /// The widget cannot serialize values.
    #[error("values of `{typename}` cannot be serialized")]
    NotSerializable {
        /// Widget typename.
        typename: String,
    },
    /// A loaded value could not be converted.
    #[error(transparent)]
    Value(#[from] ValueError),
    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SerializationError {
    /// Creates a [`SerializationError::Malformed`].
    pub fn malformed(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

/// Errors reading or writing the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON for the configuration.
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let err = RegistryError::MissingDocstring {
            typename: "app::Meters".into(),
        };
        assert_eq!(
            err.to_string(),
            "new type `app::Meters` has no docstring: document the alias before registering it"
        );

        let err = ValueError::mismatch("int", &crate::FiatValue::Str("a".into()));
        assert_eq!(err.to_string(), "expected int, got str");
    }

    #[test]
    fn json_errors_convert() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SerializationError = json_err.into();
        assert!(matches!(err, SerializationError::Json(_)));
    }
}
