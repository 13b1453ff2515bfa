//! Form schema describing reflected types.
//!
//! A [`TypeSpec`] is what the registry walks to build a widget tree. It is
//! produced by [`FiatType::type_spec`](crate::FiatType::type_spec) (hand-written
//! for primitives and containers, derived for records, enums and new types).

use core::fmt;
use std::sync::Arc;

use crate::attributes::FiatAttributes;
use crate::data::Validator;
use crate::value::FiatValue;

/// The shape of a reflected type.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// The unit type; functions returning it have no output.
    NoneType,
    /// Integers.
    Int,
    /// Floating point numbers.
    Float,
    /// Booleans.
    Bool,
    /// Strings.
    Str,
    /// `Option<T>`.
    Optional(Box<TypeSpec>),
    /// `Vec<T>`.
    List(Box<TypeSpec>),
    /// Tuples.
    Tuple(Vec<TypeSpec>),
    /// A union of several types, handled by union-prefix factories.
    Union(Vec<TypeSpec>),
    /// An enum with unit variants.
    Enum(EnumSpec),
    /// A struct with named fields.
    Record(RecordSpec),
    /// A documented alias of another type.
    NewType(NewTypeSpec),
    /// A type with numeric bounds attached.
    Annotated(Box<TypeSpec>, Bounds),
    /// An opaque type that needs a registered widget.
    Custom(String),
}

impl TypeSpec {
    /// Shorthand for [`TypeSpec::Optional`].
    #[must_use]
    pub fn optional(inner: TypeSpec) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Shorthand for [`TypeSpec::List`].
    #[must_use]
    pub fn list(inner: TypeSpec) -> Self {
        Self::List(Box::new(inner))
    }

    /// Shorthand for [`TypeSpec::Annotated`].
    #[must_use]
    pub fn annotated(inner: TypeSpec, bounds: Bounds) -> Self {
        Self::Annotated(Box::new(inner), bounds)
    }

    /// Fully-qualified name used by the registry to match factories.
    #[must_use]
    pub fn typename(&self) -> String {
        fn joined(items: &[TypeSpec]) -> String {
            items
                .iter()
                .map(TypeSpec::typename)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Self::NoneType => "None".to_string(),
            Self::Int => "int".to_string(),
            Self::Float => "float".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Str => "str".to_string(),
            Self::Optional(inner) => format!("Optional[{}]", inner.typename()),
            Self::List(inner) => format!("List[{}]", inner.typename()),
            Self::Tuple(items) => format!("Tuple[{}]", joined(items)),
            Self::Union(items) => format!("Union[{}]", joined(items)),
            Self::Enum(spec) => spec.typename.clone(),
            Self::Record(spec) => spec.typename.clone(),
            Self::NewType(spec) => spec.typename.clone(),
            Self::Annotated(inner, _) => inner.typename(),
            Self::Custom(typename) => typename.clone(),
        }
    }

    /// Last path segment of [`typename`](Self::typename), used in labels.
    #[must_use]
    pub fn basename(&self) -> String {
        let typename = self.typename();
        match typename.find('[') {
            Some(_) => typename,
            None => typename
                .rsplit("::")
                .next()
                .map_or_else(String::new, str::to_string),
        }
    }

    /// Returns `true` for optionals and unions containing `None`.
    #[must_use]
    pub fn can_be_none(&self) -> bool {
        match self {
            Self::Optional(_) | Self::NoneType => true,
            Self::Union(items) => items.iter().any(|item| matches!(item, Self::NoneType)),
            Self::Annotated(inner, _) => inner.can_be_none(),
            Self::NewType(spec) => spec.inner.can_be_none(),
            _ => false,
        }
    }

    /// Returns `true` if this is an integral type (possibly annotated or aliased).
    #[must_use]
    pub fn is_integral(&self) -> bool {
        match self {
            Self::Int => true,
            Self::Annotated(inner, _) => inner.is_integral(),
            Self::NewType(spec) => spec.inner.is_integral(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.typename())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

/// Description of an enum with unit variants.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSpec {
    /// Fully-qualified typename.
    pub typename: String,
    /// Variants, in declaration order.
    pub variants: Vec<EnumVariantSpec>,
}

impl EnumSpec {
    /// Name of the enum without its module path.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.typename.rsplit("::").next().unwrap_or(&self.typename)
    }
}

/// One variant of an [`EnumSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariantSpec {
    /// Variant identifier.
    pub name: String,
    /// Label shown instead of the identifier.
    pub label: Option<String>,
    /// Tooltip shown when hovering the variant.
    pub tooltip: Option<String>,
}

impl EnumVariantSpec {
    /// A variant with no label or tooltip override.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            tooltip: None,
        }
    }

    /// Label to display for this variant.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a record behaves like a plain data class or a validated model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Plain record; serialized with the `Dataclass` tag.
    Dataclass,
    /// Validated model; serialized with the `Pydantic` tag.
    Model,
}

/// Description of a struct with named fields.
#[derive(Clone)]
pub struct RecordSpec {
    /// Fully-qualified typename.
    pub typename: String,
    /// Record flavour.
    pub kind: RecordKind,
    /// Documentation of the record.
    pub doc: Option<String>,
    /// Fields, in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Record-wide validator, run after every field validated.
    pub model_validator: Option<Validator>,
    /// Attributes attached to the record type (`<field>__<name>` forwarding).
    pub fiat_attributes: FiatAttributes,
}

impl RecordSpec {
    /// Creates a record description with no fields.
    pub fn new(typename: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            typename: typename.into(),
            kind,
            doc: None,
            fields: Vec::new(),
            model_validator: None,
            fiat_attributes: FiatAttributes::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Debug for RecordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSpec")
            .field("typename", &self.typename)
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("has_model_validator", &self.model_validator.is_some())
            .finish()
    }
}

/// A default for a record field.
#[derive(Clone)]
pub enum FieldDefault {
    /// A constant default.
    Value(FiatValue),
    /// A default computed on demand.
    Factory(Arc<dyn Fn() -> FiatValue + Send + Sync>),
}

impl FieldDefault {
    /// Produces the default value.
    #[must_use]
    pub fn produce(&self) -> FiatValue {
        match self {
            Self::Value(v) => v.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// One field of a [`RecordSpec`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Field type.
    pub spec: TypeSpec,
    /// Default value, if any.
    pub default: Option<FieldDefault>,
    /// Field documentation, used as tooltip.
    pub doc: Option<String>,
    /// Attributes attached to this field.
    pub fiat_attributes: FiatAttributes,
}

impl FieldSpec {
    /// A field with no default and no attributes.
    pub fn new(name: impl Into<String>, spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            default: None,
            doc: None,
            fiat_attributes: FiatAttributes::new(),
        }
    }

    /// Sets a constant default.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<FiatValue>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// New types and bounds
// ─────────────────────────────────────────────────────────────────────────────

/// A named alias of another type.
#[derive(Debug, Clone)]
pub struct NewTypeSpec {
    /// Fully-qualified name of the alias.
    pub typename: String,
    /// Documentation of the alias. Registration requires it.
    pub doc: Option<String>,
    /// The aliased type.
    pub inner: Box<TypeSpec>,
}

/// Numeric bounds attached to a type, in the style of validated model fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    /// Inclusive lower bound.
    pub ge: Option<f64>,
    /// Exclusive lower bound.
    pub gt: Option<f64>,
    /// Inclusive upper bound.
    pub le: Option<f64>,
    /// Exclusive upper bound.
    pub lt: Option<f64>,
}

impl Bounds {
    /// Inclusive bounds on both ends.
    #[must_use]
    pub fn between(lo: f64, hi: f64) -> Self {
        Self {
            ge: Some(lo),
            le: Some(hi),
            ..Self::default()
        }
    }

    /// Returns `true` when no bound is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ge.is_none() && self.gt.is_none() && self.le.is_none() && self.lt.is_none()
    }

    /// Checks a number against every bound.
    ///
    /// Messages follow the wording of model validation errors.
    pub fn check(&self, value: f64) -> Result<(), String> {
        if let Some(ge) = self.ge
            && value < ge
        {
            return Err(format!("Input should be greater than or equal to {ge}"));
        }
        if let Some(gt) = self.gt
            && value <= gt
        {
            return Err(format!("Input should be greater than {gt}"));
        }
        if let Some(le) = self.le
            && value > le
        {
            return Err(format!("Input should be less than or equal to {le}"));
        }
        if let Some(lt) = self.lt
            && value >= lt
        {
            return Err(format!("Input should be less than {lt}"));
        }
        Ok(())
    }

    /// Inclusive `(lo, hi)` range, when both ends are bounded.
    ///
    /// Exclusive bounds are tightened by one for integral types.
    #[must_use]
    pub fn inclusive_range(&self, integral: bool) -> Option<(f64, f64)> {
        let step = if integral { 1.0 } else { 0.0 };
        let lo = self.ge.or(self.gt.map(|gt| gt + step))?;
        let hi = self.le.or(self.lt.map(|lt| lt - step))?;
        Some((lo, hi))
    }

    /// Builds a validator enforcing these bounds on numeric values.
    #[must_use]
    pub fn validator(self) -> Validator {
        Arc::new(move |value: &FiatValue| match value.as_float() {
            Some(number) => self.check(number).map(|()| value.clone()),
            None => Ok(value.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typenames_compose() {
        let spec = TypeSpec::optional(TypeSpec::Tuple(vec![TypeSpec::Int, TypeSpec::list(TypeSpec::Str)]));
        assert_eq!(spec.typename(), "Optional[Tuple[int, List[str]]]");
        assert_eq!(TypeSpec::Custom("app::image::ImageRgb".into()).basename(), "ImageRgb");
        assert_eq!(TypeSpec::annotated(TypeSpec::Float, Bounds::between(0.0, 1.0)).typename(), "float");
    }

    #[test]
    fn bounds_messages() {
        let bounds = Bounds {
            ge: Some(0.0),
            le: Some(10.0),
            ..Bounds::default()
        };
        assert!(bounds.check(10.0).is_ok());
        assert_eq!(
            bounds.check(11.0),
            Err("Input should be less than or equal to 10".to_string())
        );
        assert_eq!(
            bounds.check(-1.0),
            Err("Input should be greater than or equal to 0".to_string())
        );
    }

    #[test]
    fn exclusive_bounds_tighten_for_integers() {
        let bounds = Bounds {
            gt: Some(0.0),
            lt: Some(10.0),
            ..Bounds::default()
        };
        assert_eq!(bounds.inclusive_range(true), Some((1.0, 9.0)));
        assert_eq!(bounds.inclusive_range(false), Some((0.0, 10.0)));
        assert_eq!(Bounds::default().inclusive_range(true), None);
    }
}
