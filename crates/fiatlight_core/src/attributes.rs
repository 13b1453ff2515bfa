//! Fiat attributes: string-keyed hints that configure widgets.
//!
//! Attributes are forwarded to sub-widgets by prefix: `x__range` on a
//! function reaches the widget of parameter `x` as `range`, and `0_range` on
//! a tuple reaches its first slot.
//!
//! - [`FiatAttributes`]: the ordered attribute bag
//! - [`AttrValue`]: a plain value or a validator
//! - [`PossibleFiatAttributes`]: the table of attributes a widget understands

use core::fmt;

use indexmap::IndexMap;

use crate::data::Validator;
use crate::error::RegistryError;
use crate::value::FiatValue;

/// Attributes understood by every widget.
pub const GENERIC_ATTRIBUTES: [&str; 4] = ["label", "tooltip", "validator", "label_color"];

/// The value of one attribute.
#[derive(Clone)]
pub enum AttrValue {
    /// A plain value (`range = (0, 10)`, `edit_type = "slider"`, ...).
    Value(FiatValue),
    /// A validator (`validator`, `x__validator`, ...).
    Validator(Validator),
}

impl AttrValue {
    /// Returns the plain value, if this is not a validator.
    #[must_use]
    pub fn as_value(&self) -> Option<&FiatValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Validator(_) => None,
        }
    }

    /// Short description of the attribute's kind, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Value(v) => v.kind_name(),
            Self::Validator(_) => "validator",
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:?}"),
            Self::Validator(_) => f.write_str("<validator>"),
        }
    }
}

impl From<FiatValue> for AttrValue {
    fn from(v: FiatValue) -> Self {
        Self::Value(v)
    }
}

impl From<Validator> for AttrValue {
    fn from(v: Validator) -> Self {
        Self::Validator(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FiatAttributes
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered bag of attributes.
///
/// # Example
///
/// ```
/// use fiatlight_core::FiatAttributes;
///
/// let attrs = FiatAttributes::new()
///     .with("x__range", (0, 10))
///     .with("invoke_manually", true);
///
/// let x_attrs = attrs.forwarded("x__");
/// assert_eq!(x_attrs.range(), Some((0.0, 10.0)));
/// ```
#[derive(Clone, Default)]
pub struct FiatAttributes {
    entries: IndexMap<String, AttrValue>,
}

impl FiatAttributes {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FiatValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a validator, builder style.
    #[must_use]
    pub fn with_validator<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&FiatValue) -> Result<FiatValue, String> + Send + Sync + 'static,
    {
        self.entries
            .insert(name.into(), AttrValue::Validator(std::sync::Arc::new(validator)));
        self
    }

    /// Inserts a plain value, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FiatValue>) {
        self.entries
            .insert(name.into(), AttrValue::Value(value.into()));
    }

    /// Inserts an attribute value, replacing any previous entry.
    pub fn insert_attr(&mut self, name: impl Into<String>, value: AttrValue) {
        self.entries.insert(name.into(), value);
    }

    /// Removes an entry.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.entries.shift_remove(name)
    }

    /// Returns the entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.get(name)
    }

    /// Returns the plain value for `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&FiatValue> {
        self.get(name).and_then(AttrValue::as_value)
    }

    /// Returns the validator stored under `name`.
    #[must_use]
    pub fn validator(&self, name: &str) -> Option<&Validator> {
        match self.get(name) {
            Some(AttrValue::Validator(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over attribute names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Merges `other` into `self`; entries of `other` win.
    pub fn merge(&mut self, other: &FiatAttributes) {
        for (name, value) in other.iter() {
            self.entries.insert(name.to_string(), value.clone());
        }
    }

    /// Returns the entries whose name starts with `prefix`, with the prefix stripped.
    #[must_use]
    pub fn forwarded(&self, prefix: &str) -> FiatAttributes {
        let entries = self
            .entries
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect();
        Self { entries }
    }

    /// Attributes for the parameter (or field) `name`: `name__*`.
    #[must_use]
    pub fn for_param(&self, name: &str) -> FiatAttributes {
        self.forwarded(&format!("{name}__"))
    }

    /// Attributes for tuple slot `idx`: `<idx>_*`.
    #[must_use]
    pub fn for_tuple_slot(&self, idx: usize) -> FiatAttributes {
        self.forwarded(&format!("{idx}_"))
    }

    /// Entries addressed to this widget itself (not forwarded to a child).
    #[must_use]
    pub fn own(&self) -> FiatAttributes {
        let entries = self
            .entries
            .iter()
            .filter(|(name, _)| !is_forwarded_name(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self { entries }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Reads a `(lo, hi)` pair stored under `range`.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        self.pair("range")
    }

    /// Reads a numeric pair stored as a two-element tuple or list.
    #[must_use]
    pub fn pair(&self, name: &str) -> Option<(f64, f64)> {
        match self.value(name)?.as_items()? {
            [lo, hi] => Some((lo.as_float()?, hi.as_float()?)),
            _ => None,
        }
    }

    /// Reads a boolean.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(FiatValue::as_bool)
    }

    /// Reads an integer.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(FiatValue::as_int)
    }

    /// Reads a number (integers are widened).
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(FiatValue::as_float)
    }

    /// Reads a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(FiatValue::as_str)
    }
}

impl fmt::Debug for FiatAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Returns `true` for names addressed to a sub-widget (`x__range`, `0_range`).
#[must_use]
pub fn is_forwarded_name(name: &str) -> bool {
    if name.contains("__") {
        return true;
    }
    match name.split_once('_') {
        Some((idx, rest)) => !idx.is_empty() && !rest.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PossibleFiatAttributes
// ─────────────────────────────────────────────────────────────────────────────

/// The expected kind of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// A boolean.
    Bool,
    /// An integer.
    Int,
    /// A number (integers accepted).
    Float,
    /// A string.
    Str,
    /// A `(lo, hi)` numeric pair.
    Range,
    /// A validator.
    Validator,
    /// Anything.
    Any,
}

impl AttrKind {
    fn accepts(self, value: &AttrValue) -> bool {
        match (self, value) {
            (Self::Any, _) | (Self::Validator, AttrValue::Validator(_)) => true,
            (_, AttrValue::Validator(_)) | (Self::Validator, AttrValue::Value(_)) => false,
            (Self::Bool, AttrValue::Value(v)) => matches!(v, FiatValue::Bool(_)),
            (Self::Int, AttrValue::Value(v)) => matches!(v, FiatValue::Int(_)),
            (Self::Float, AttrValue::Value(v)) => v.as_float().is_some(),
            (Self::Str, AttrValue::Value(v)) => matches!(v, FiatValue::Str(_)),
            (Self::Range, AttrValue::Value(v)) => matches!(
                v.as_items(),
                Some([lo, hi]) if lo.as_float().is_some() && hi.as_float().is_some()
            ),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Range => "a (lo, hi) pair",
            Self::Validator => "a validator",
            Self::Any => "any value",
        }
    }
}

/// One entry of a [`PossibleFiatAttributes`] table.
#[derive(Debug, Clone)]
pub struct PossibleFiatAttr {
    /// Attribute name.
    pub name: &'static str,
    /// Expected kind.
    pub kind: AttrKind,
    /// Human readable explanation.
    pub explanation: &'static str,
    /// Default value, for documentation.
    pub default: Option<FiatValue>,
    /// Accepted string values (empty = any).
    pub allowed: &'static [&'static str],
}

/// The attributes a widget kind understands.
#[derive(Debug, Clone)]
pub struct PossibleFiatAttributes {
    widget: &'static str,
    attrs: Vec<PossibleFiatAttr>,
}

impl PossibleFiatAttributes {
    /// Creates an empty table for `widget`.
    #[must_use]
    pub fn new(widget: &'static str) -> Self {
        Self {
            widget,
            attrs: Vec::new(),
        }
    }

    /// Declares an attribute.
    #[must_use]
    pub fn add(mut self, name: &'static str, kind: AttrKind, explanation: &'static str) -> Self {
        self.attrs.push(PossibleFiatAttr {
            name,
            kind,
            explanation,
            default: None,
            allowed: &[],
        });
        self
    }

    /// Declares an attribute with a default.
    #[must_use]
    pub fn add_with_default(
        mut self,
        name: &'static str,
        kind: AttrKind,
        explanation: &'static str,
        default: impl Into<FiatValue>,
    ) -> Self {
        self.attrs.push(PossibleFiatAttr {
            name,
            kind,
            explanation,
            default: Some(default.into()),
            allowed: &[],
        });
        self
    }

    /// Declares a string attribute restricted to `allowed` values.
    #[must_use]
    pub fn add_choice(
        mut self,
        name: &'static str,
        allowed: &'static [&'static str],
        explanation: &'static str,
        default: &'static str,
    ) -> Self {
        self.attrs.push(PossibleFiatAttr {
            name,
            kind: AttrKind::Str,
            explanation,
            default: Some(FiatValue::from(default)),
            allowed,
        });
        self
    }

    /// Name of the widget this table belongs to.
    #[must_use]
    pub fn widget(&self) -> &'static str {
        self.widget
    }

    /// Declared attributes.
    #[must_use]
    pub fn attrs(&self) -> &[PossibleFiatAttr] {
        &self.attrs
    }

    /// Returns the declaration for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PossibleFiatAttr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Checks every own attribute of `attrs` against this table.
    ///
    /// Generic attributes and forwarded names are skipped.
    pub fn validate(&self, attrs: &FiatAttributes) -> Result<(), RegistryError> {
        for (name, value) in attrs.iter() {
            if GENERIC_ATTRIBUTES.contains(&name) || is_forwarded_name(name) {
                continue;
            }
            let Some(declared) = self.get(name) else {
                return Err(RegistryError::UnknownAttribute {
                    widget: self.widget.to_string(),
                    name: name.to_string(),
                    available: self.attrs.iter().map(|a| a.name).collect::<Vec<_>>().join(", "),
                });
            };
            if !declared.kind.accepts(value) {
                return Err(RegistryError::AttributeKind {
                    widget: self.widget.to_string(),
                    name: name.to_string(),
                    expected: declared.kind.describe().to_string(),
                    got: value.kind_name().to_string(),
                });
            }
            if !declared.allowed.is_empty()
                && let Some(got) = value.as_value().and_then(FiatValue::as_str)
                && !declared.allowed.contains(&got)
            {
                return Err(RegistryError::AttributeValue {
                    widget: self.widget.to_string(),
                    name: name.to_string(),
                    allowed: declared.allowed.join(", "),
                    got: got.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Renders the table as markdown.
    #[must_use]
    pub fn documentation(&self) -> String {
        let mut doc = format!(
            "Available fiat attributes for {}:\n\n| Name | Type | Default | Explanation |\n|---|---|---|---|\n",
            self.widget
        );
        for attr in &self.attrs {
            let default = attr
                .default
                .as_ref()
                .map_or_else(String::new, ToString::to_string);
            let kind = if attr.allowed.is_empty() {
                attr.kind.describe().to_string()
            } else {
                attr.allowed.join(" \\| ")
            };
            doc.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                attr.name, kind, default, attr.explanation
            ));
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_table() -> PossibleFiatAttributes {
        PossibleFiatAttributes::new("int")
            .add_with_default("range", AttrKind::Range, "Range of the slider", (0, 10))
            .add_choice("edit_type", &["slider", "input"], "Edit widget", "input")
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Forwarding
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn forwarding_strips_prefixes() {
        let attrs = FiatAttributes::new()
            .with("x__range", (0, 10))
            .with("x__edit_type", "slider")
            .with("y__range", (1, 2))
            .with("0_range", (3, 4));

        let x = attrs.for_param("x");
        assert_eq!(x.len(), 2);
        assert_eq!(x.range(), Some((0.0, 10.0)));
        assert_eq!(x.get_str("edit_type"), Some("slider"));

        let slot = attrs.for_tuple_slot(0);
        assert_eq!(slot.range(), Some((3.0, 4.0)));
    }

    #[test]
    fn forwarded_names_are_detected() {
        assert!(is_forwarded_name("x__range"));
        assert!(is_forwarded_name("12_range"));
        assert!(!is_forwarded_name("edit_type"));
        assert!(!is_forwarded_name("range"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn unknown_attribute_is_rejected() {
        let attrs = FiatAttributes::new().with("rnage", (0, 1));
        let err = int_table().validate(&attrs).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAttribute { ref name, .. } if name == "rnage"));
    }

    #[test]
    fn wrong_kind_and_choice_are_rejected() {
        let attrs = FiatAttributes::new().with("range", "wide");
        assert!(matches!(
            int_table().validate(&attrs),
            Err(RegistryError::AttributeKind { .. })
        ));

        let attrs = FiatAttributes::new().with("edit_type", "knob");
        assert!(matches!(
            int_table().validate(&attrs),
            Err(RegistryError::AttributeValue { .. })
        ));
    }

    #[test]
    fn generic_and_forwarded_attributes_pass() {
        let attrs = FiatAttributes::new()
            .with("label", "Width")
            .with("field__whatever", 1)
            .with_validator("validator", |v| Ok(v.clone()));
        assert!(int_table().validate(&attrs).is_ok());
    }

    #[test]
    fn documentation_lists_attributes() {
        let doc = int_table().documentation();
        assert!(doc.contains("| range | a (lo, hi) pair | (0, 10) | Range of the slider |"));
        assert!(doc.contains("slider \\| input"));
    }
}
