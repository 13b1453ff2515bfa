//! The type registry: maps a [`TypeSpec`] to a configured [`AnyDataWithGui`].
//!
//! Registered factories are matched first, newest first, so a later
//! registration overrides an earlier one for the same type. When no factory
//! matches, the registry decomposes the type structurally (optionals, lists,
//! tuples, enums, records, aliases) and recurses on the parts. Anything left
//! over becomes an [`UnregisteredWidget`].
//!
//! A process-wide registry, pre-loaded with the primitive widgets, is
//! reachable through [`gui_registry`] and the free `register_*` functions.

use core::fmt;
use std::sync::{Arc, LazyLock};

use hashbrown::HashSet;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::attributes::{AttrValue, FiatAttributes};
use crate::data::AnyDataWithGui;
use crate::error::RegistryError;
use crate::fiat_type::FiatType;
use crate::param::{ParamKind, ParamWithGui};
use crate::schema::{Bounds, TypeSpec};
use crate::value::{DataValue, FiatValue};
use crate::widget::DataWidget;
use crate::widgets::{
    BoolWidget, EnumWidget, FloatWidget, IntWidget, ListWidget, OptionalWidget, RecordWidget, StrWidget,
    TupleWidget, UnregisteredWidget,
};

/// Builds a fresh widget for a type.
pub type WidgetFactory = Arc<dyn Fn(&TypeSpec) -> Box<dyn DataWidget> + Send + Sync>;

/// A named predicate over types.
pub type TypePredicate = Arc<dyn Fn(&TypeSpec) -> bool + Send + Sync>;

/// Generic attributes kept by an optional widget; the others reach the inner widget.
const OPTIONAL_OUTER_ATTRIBUTES: [&str; 3] = ["label", "tooltip", "label_color"];

// ─────────────────────────────────────────────────────────────────────────────
// Matchers
// ─────────────────────────────────────────────────────────────────────────────

/// Decides whether a registry entry applies to a type.
#[derive(Clone)]
pub enum TypeMatcher {
    /// The fully-qualified typename equals this one.
    Exact(String),
    /// The fully-qualified typename starts with this prefix.
    Prefix(String),
    /// A union whose members all start with this prefix (`None` members
    /// aside).
    UnionPrefix(String),
    /// An arbitrary predicate.
    Predicate {
        /// Shown in [`GuiRegistry::registered_factories_info`].
        name: String,
        /// The test.
        predicate: TypePredicate,
    },
}

impl TypeMatcher {
    /// Returns `true` if the entry applies to `spec` (whose typename is `typename`).
    #[must_use]
    pub fn matches(&self, spec: &TypeSpec, typename: &str) -> bool {
        match self {
            Self::Exact(name) => typename == name,
            Self::Prefix(prefix) => typename.starts_with(prefix.as_str()),
            Self::UnionPrefix(prefix) => match spec {
                TypeSpec::Union(members) => {
                    let mut others = members.iter().filter(|m| !matches!(m, TypeSpec::NoneType)).peekable();
                    others.peek().is_some() && others.all(|member| member.typename().starts_with(prefix.as_str()))
                }
                _ => false,
            },
            Self::Predicate { predicate, .. } => predicate(spec),
        }
    }

    /// Human readable form of the matcher.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Exact(name) => name.clone(),
            Self::Prefix(prefix) => format!("{prefix}*"),
            Self::UnionPrefix(prefix) => format!("Union[{prefix}*]"),
            Self::Predicate { name, .. } => format!("<{name}>"),
        }
    }
}

impl fmt::Debug for TypeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum EntryKind {
    /// Build the widget with a factory.
    Widget(WidgetFactory),
    /// Decompose the type structurally, with extra default attributes.
    Structural,
}

#[derive(Clone)]
struct RegistryEntry {
    matcher: TypeMatcher,
    kind: EntryKind,
    default_attributes: FiatAttributes,
    explanation: String,
}

/// Public summary of one registry entry.
#[derive(Debug, Clone)]
pub struct FactoryInfo {
    /// What the entry matches.
    pub matcher: String,
    /// What the entry produces.
    pub explanation: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// GuiRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Maps types to widgets.
pub struct GuiRegistry {
    entries: Vec<RegistryEntry>,
    warned: Mutex<HashSet<String>>,
}

impl Default for GuiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GuiRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuiRegistry")
            .field("entries", &self.entries.iter().map(|e| &e.matcher).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl GuiRegistry {
    /// Creates a registry knowing the primitive widgets.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_typename("int", "int: IntWidget", |_| Box::new(IntWidget::new()));
        registry.register_typename("float", "float: FloatWidget", |_| Box::new(FloatWidget::new()));
        registry.register_typename("bool", "bool: BoolWidget", |_| Box::new(BoolWidget::new()));
        registry.register_typename("str", "str: StrWidget", |_| Box::new(StrWidget::new()));
        registry
    }

    /// Creates a registry with no entries (only structural decomposition).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            warned: Mutex::new(HashSet::new()),
        }
    }

    fn push(&mut self, entry: RegistryEntry) {
        tracing::debug!(matcher = %entry.matcher.describe(), "registering widget factory");
        self.entries.push(entry);
    }

    fn push_widget(&mut self, matcher: TypeMatcher, explanation: impl Into<String>, factory: WidgetFactory) {
        self.push(RegistryEntry {
            matcher,
            kind: EntryKind::Widget(factory),
            default_attributes: FiatAttributes::new(),
            explanation: explanation.into(),
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a factory for an exact typename.
    pub fn register_typename<F>(&mut self, typename: impl Into<String>, explanation: impl Into<String>, factory: F)
    where
        F: Fn(&TypeSpec) -> Box<dyn DataWidget> + Send + Sync + 'static,
    {
        self.push_widget(TypeMatcher::Exact(typename.into()), explanation, Arc::new(factory));
    }

    /// Registers the widget built by `factory` for the Rust type `T`.
    pub fn register_type<T, W, F>(&mut self, factory: F)
    where
        T: FiatType,
        W: DataWidget,
        F: Fn() -> W + Send + Sync + 'static,
    {
        let typename = T::type_spec().typename();
        let explanation = format!("{typename}: {}", short_type_name::<W>());
        self.register_typename(typename, explanation, move |_| Box::new(factory()));
    }

    /// Registers the widget built by `factory` for the new type `T`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotANewType`] if `T` is not a new type.
    /// - [`RegistryError::MissingDocstring`] if the alias is undocumented.
    pub fn register_new_type<T, W, F>(&mut self, factory: F) -> Result<(), RegistryError>
    where
        T: FiatType,
        W: DataWidget,
        F: Fn() -> W + Send + Sync + 'static,
    {
        let TypeSpec::NewType(spec) = T::type_spec() else {
            return Err(RegistryError::NotANewType {
                typename: T::type_spec().typename(),
            });
        };
        let has_doc = spec.doc.as_deref().is_some_and(|doc| !doc.trim().is_empty());
        if !has_doc {
            return Err(RegistryError::MissingDocstring {
                typename: spec.typename,
            });
        }
        self.register_type::<T, W, F>(factory);
        Ok(())
    }

    /// Registers a factory for every typename starting with `prefix`.
    pub fn register_prefix<F>(&mut self, prefix: impl Into<String>, explanation: impl Into<String>, factory: F)
    where
        F: Fn(&TypeSpec) -> Box<dyn DataWidget> + Send + Sync + 'static,
    {
        self.push_widget(TypeMatcher::Prefix(prefix.into()), explanation, Arc::new(factory));
    }

    /// Registers a factory for unions whose members all start with `prefix`.
    pub fn register_union_prefix<F>(&mut self, prefix: impl Into<String>, explanation: impl Into<String>, factory: F)
    where
        F: Fn(&TypeSpec) -> Box<dyn DataWidget> + Send + Sync + 'static,
    {
        self.push_widget(TypeMatcher::UnionPrefix(prefix.into()), explanation, Arc::new(factory));
    }

    /// Registers a factory for every type accepted by `predicate`.
    pub fn register_predicate<P, F>(
        &mut self,
        name: impl Into<String>,
        explanation: impl Into<String>,
        predicate: P,
        factory: F,
    ) where
        P: Fn(&TypeSpec) -> bool + Send + Sync + 'static,
        F: Fn(&TypeSpec) -> Box<dyn DataWidget> + Send + Sync + 'static,
    {
        let matcher = TypeMatcher::Predicate {
            name: name.into(),
            predicate: Arc::new(predicate),
        };
        self.push_widget(matcher, explanation, Arc::new(factory));
    }

    /// Registers an integer type bounded to `[lo, hi]`.
    ///
    /// The widget gets `range = (lo, hi)` and a validator enforcing it.
    pub fn register_bound_int<T: FiatType>(&mut self, (lo, hi): (i64, i64)) {
        let typename = T::type_spec().typename();
        let bounds = Bounds::between(lo as f64, hi as f64);
        let mut defaults = FiatAttributes::new().with("range", (lo, hi));
        defaults.insert_attr("validator", AttrValue::Validator(bounds.validator()));
        self.push(RegistryEntry {
            matcher: TypeMatcher::Exact(typename.clone()),
            kind: EntryKind::Widget(Arc::new(|_: &TypeSpec| -> Box<dyn DataWidget> { Box::new(IntWidget::new()) })),
            default_attributes: defaults,
            explanation: format!("{typename}: int in [{lo}, {hi}]"),
        });
    }

    /// Registers a float type bounded to `[lo, hi]`.
    ///
    /// The widget gets `range = (lo, hi)` and a validator enforcing it.
    pub fn register_bound_float<T: FiatType>(&mut self, (lo, hi): (f64, f64)) {
        let typename = T::type_spec().typename();
        let bounds = Bounds::between(lo, hi);
        let mut defaults = FiatAttributes::new().with("range", (lo, hi));
        defaults.insert_attr("validator", AttrValue::Validator(bounds.validator()));
        self.push(RegistryEntry {
            matcher: TypeMatcher::Exact(typename.clone()),
            kind: EntryKind::Widget(Arc::new(|_: &TypeSpec| -> Box<dyn DataWidget> { Box::new(FloatWidget::new()) })),
            default_attributes: defaults,
            explanation: format!("{typename}: float in [{lo}, {hi}]"),
        });
    }

    /// Registers a record type with default attributes (`<field>__<name>` forwarding).
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotARecord`] if `T` is not a record.
    /// - Any attribute error raised while building the widget once.
    pub fn register_record<T: FiatType>(&mut self, attrs: FiatAttributes) -> Result<(), RegistryError> {
        let spec = T::type_spec();
        let TypeSpec::Record(record) = &spec else {
            return Err(RegistryError::NotARecord {
                typename: spec.typename(),
            });
        };
        self.factor(&spec, &attrs)?;
        self.push(RegistryEntry {
            matcher: TypeMatcher::Exact(record.typename.clone()),
            kind: EntryKind::Structural,
            default_attributes: attrs,
            explanation: format!("{}: record with {} fields", record.typename, record.fields.len()),
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Every entry, in registration order.
    #[must_use]
    pub fn registered_factories_info(&self) -> Vec<FactoryInfo> {
        self.entries
            .iter()
            .map(|entry| FactoryInfo {
                matcher: entry.matcher.describe(),
                explanation: entry.explanation.clone(),
            })
            .collect()
    }

    /// Entries whose matcher or explanation contains `text` (case-insensitive).
    #[must_use]
    pub fn query(&self, text: &str) -> Vec<FactoryInfo> {
        let needle = text.to_lowercase();
        self.registered_factories_info()
            .into_iter()
            .filter(|info| {
                info.matcher.to_lowercase().contains(&needle) || info.explanation.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Markdown table of every entry.
    #[must_use]
    pub fn documentation(&self) -> String {
        let mut doc = String::from("| Type | Explanation |\n|---|---|\n");
        for info in self.registered_factories_info() {
            doc.push_str(&format!("| {} | {} |\n", info.matcher, info.explanation));
        }
        doc
    }

    /// Returns `true` if `spec` resolves to something other than an unregistered placeholder.
    #[must_use]
    pub fn can_factor(&self, spec: &TypeSpec) -> bool {
        if self.find(spec, &spec.typename()).is_some() {
            return true;
        }
        match spec {
            TypeSpec::Annotated(inner, _) | TypeSpec::Optional(inner) | TypeSpec::List(inner) => {
                self.can_factor(inner)
            }
            TypeSpec::NewType(alias) => self.can_factor(&alias.inner),
            TypeSpec::Tuple(items) => items.iter().all(|item| self.can_factor(item)),
            TypeSpec::Union(members) => without_none(members).is_some_and(|inner| self.can_factor(&inner)),
            TypeSpec::Enum(_) => true,
            TypeSpec::Record(record) => record.fields.iter().all(|f| self.can_factor(&f.spec)),
            TypeSpec::NoneType
            | TypeSpec::Int
            | TypeSpec::Float
            | TypeSpec::Bool
            | TypeSpec::Str
            | TypeSpec::Custom(_) => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Factoring
    // ─────────────────────────────────────────────────────────────────────────

    fn has_exact(&self, typename: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(&entry.matcher, TypeMatcher::Exact(name) if name == typename))
    }

    fn find(&self, spec: &TypeSpec, typename: &str) -> Option<&RegistryEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.matcher.matches(spec, typename))
    }

    /// Builds a widget for `spec`, configured with `attrs`.
    ///
    /// Unknown types never fail: they yield an [`UnregisteredWidget`] and a
    /// single warning per typename.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if an attribute is not understood by the
    /// widget it reaches.
    pub fn factor(&self, spec: &TypeSpec, attrs: &FiatAttributes) -> Result<AnyDataWithGui, RegistryError> {
        if let TypeSpec::Annotated(inner, bounds) = spec {
            return self.factor_annotated(spec, inner, *bounds, attrs);
        }

        let typename = spec.typename();
        if let TypeSpec::Union(members) = spec
            && let Some(inner) = without_none(members)
            && !self.has_exact(&typename)
        {
            return self.factor_optional(spec, &inner, attrs);
        }
        if let Some(entry) = self.find(spec, &typename) {
            return match &entry.kind {
                EntryKind::Widget(factory) => {
                    let mut data = AnyDataWithGui::from_boxed(spec.clone(), factory(spec));
                    data.merge_fiat_attributes(&entry.default_attributes)?;
                    data.merge_fiat_attributes(attrs)?;
                    if data.tooltip().is_none()
                        && let TypeSpec::NewType(alias) = spec
                        && let Some(doc) = &alias.doc
                    {
                        data.set_tooltip(doc.clone());
                    }
                    Ok(data)
                }
                EntryKind::Structural => {
                    let mut merged = entry.default_attributes.clone();
                    merged.merge(attrs);
                    self.decompose(spec, &typename, &merged)
                }
            };
        }
        self.decompose(spec, &typename, attrs)
    }

    fn factor_annotated(
        &self,
        spec: &TypeSpec,
        inner: &TypeSpec,
        bounds: Bounds,
        attrs: &FiatAttributes,
    ) -> Result<AnyDataWithGui, RegistryError> {
        let mut attrs = attrs.clone();
        if !attrs.contains("range")
            && is_numeric(inner)
            && let Some((lo, hi)) = bounds.inclusive_range(inner.is_integral())
        {
            if inner.is_integral() {
                attrs.insert("range", (lo.round() as i64, hi.round() as i64));
            } else {
                attrs.insert("range", (lo, hi));
            }
        }
        let mut data = self.factor(inner, &attrs)?;
        if !bounds.is_empty() {
            data.add_validator(bounds.validator());
        }
        data.retype(spec.clone());
        Ok(data)
    }

    fn decompose(&self, spec: &TypeSpec, typename: &str, attrs: &FiatAttributes) -> Result<AnyDataWithGui, RegistryError> {
        match spec {
            TypeSpec::Optional(inner) => self.factor_optional(spec, inner, attrs),
            TypeSpec::Union(members) => match without_none(members) {
                Some(inner) => self.factor_optional(spec, &inner, attrs),
                None => Ok(self.unregistered(spec, typename)),
            },
            TypeSpec::List(inner) => {
                let element = self.factor(inner, &FiatAttributes::new())?;
                let mut data = AnyDataWithGui::new(spec.clone(), ListWidget::new(element));
                data.merge_fiat_attributes(attrs)?;
                Ok(data)
            }
            TypeSpec::Tuple(items) => {
                let slots = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.factor(item, &attrs.for_tuple_slot(i)))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut data = AnyDataWithGui::new(spec.clone(), TupleWidget::new(slots));
                data.merge_fiat_attributes(&attrs.own())?;
                Ok(data)
            }
            TypeSpec::Enum(enum_spec) => {
                let mut data = AnyDataWithGui::new(spec.clone(), EnumWidget::new(enum_spec.clone()));
                data.merge_fiat_attributes(attrs)?;
                Ok(data)
            }
            TypeSpec::Record(record) => {
                let mut all = record.fiat_attributes.clone();
                all.merge(attrs);

                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    let mut field_attrs = field.fiat_attributes.clone();
                    field_attrs.merge(&all.for_param(&field.name));
                    let mut data = self.factor(&field.spec, &field_attrs)?;
                    if data.tooltip().is_none()
                        && let Some(doc) = &field.doc
                    {
                        data.set_tooltip(doc.clone());
                    }
                    let default = match &field.default {
                        Some(default) => DataValue::Value(default.produce()),
                        None if field.spec.can_be_none() => DataValue::Value(FiatValue::None),
                        None => DataValue::Unspecified,
                    };
                    fields.push(ParamWithGui::new(field.name.clone(), data, ParamKind::KeywordOnly, default));
                }

                let mut data = AnyDataWithGui::new(spec.clone(), RecordWidget::new(record.clone(), fields));
                data.merge_fiat_attributes(&all.own())?;
                if data.tooltip().is_none()
                    && let Some(doc) = &record.doc
                {
                    data.set_tooltip(doc.clone());
                }
                Ok(data)
            }
            TypeSpec::NewType(alias) => {
                let mut data = self.factor(&alias.inner, attrs)?;
                if data.tooltip().is_none()
                    && let Some(doc) = &alias.doc
                {
                    data.set_tooltip(doc.clone());
                }
                data.retype(spec.clone());
                Ok(data)
            }
            TypeSpec::Annotated(inner, bounds) => self.factor_annotated(spec, inner, *bounds, attrs),
            TypeSpec::NoneType => Ok(AnyDataWithGui::new(spec.clone(), UnregisteredWidget::new(typename))),
            TypeSpec::Int | TypeSpec::Float | TypeSpec::Bool | TypeSpec::Str | TypeSpec::Custom(_) => {
                Ok(self.unregistered(spec, typename))
            }
        }
    }

    fn factor_optional(
        &self,
        spec: &TypeSpec,
        inner: &TypeSpec,
        attrs: &FiatAttributes,
    ) -> Result<AnyDataWithGui, RegistryError> {
        let mut outer_attrs = FiatAttributes::new();
        let mut inner_attrs = FiatAttributes::new();
        for (name, value) in attrs.iter() {
            if OPTIONAL_OUTER_ATTRIBUTES.contains(&name) {
                outer_attrs.insert_attr(name, value.clone());
            } else {
                inner_attrs.insert_attr(name, value.clone());
            }
        }
        let inner = self.factor(inner, &inner_attrs)?;
        let mut data = AnyDataWithGui::new(spec.clone(), OptionalWidget::new(inner));
        data.merge_fiat_attributes(&outer_attrs)?;
        Ok(data)
    }

    fn unregistered(&self, spec: &TypeSpec, typename: &str) -> AnyDataWithGui {
        if self.warned.lock().insert(typename.to_string()) {
            tracing::warn!(typename, "no widget registered for type, using a placeholder");
        }
        AnyDataWithGui::new(spec.clone(), UnregisteredWidget::new(typename))
    }

    /// Number of distinct unregistered typenames seen so far.
    #[must_use]
    pub fn nb_unregistered_warnings(&self) -> usize {
        self.warned.lock().len()
    }

    /// Builds a widget for `T`.
    ///
    /// # Errors
    ///
    /// See [`factor`](Self::factor).
    pub fn factor_type<T: FiatType>(&self, attrs: &FiatAttributes) -> Result<AnyDataWithGui, RegistryError> {
        self.factor(&T::type_spec(), attrs)
    }

    /// Builds a widget for `T` holding `value` (validators run).
    ///
    /// # Errors
    ///
    /// See [`factor`](Self::factor).
    pub fn to_data_with_gui<T: FiatType>(&self, value: T, attrs: &FiatAttributes) -> Result<AnyDataWithGui, RegistryError> {
        let mut data = self.factor_type::<T>(attrs)?;
        data.set_typed(value);
        Ok(data)
    }

    /// Builds the default value of `T` through its widget.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DefaultNotConstructible`] if the widget has no
    /// default or the default does not convert back to `T`.
    pub fn construct_default<T: FiatType>(&self) -> Result<T, RegistryError> {
        let typename = T::type_spec().typename();
        let mut data = self.factor_type::<T>(&FiatAttributes::new())?;
        let value = data
            .construct_default_value()
            .ok_or_else(|| RegistryError::DefaultNotConstructible {
                typename: typename.clone(),
                reason: "the widget has no default value".to_string(),
            })?;
        T::from_fiat(value).map_err(|err| RegistryError::DefaultNotConstructible {
            typename,
            reason: err.to_string(),
        })
    }
}

/// What a union containing `None` holds besides `None`: the single other
/// member, or the union of the others.
fn without_none(members: &[TypeSpec]) -> Option<TypeSpec> {
    if !members.iter().any(|m| matches!(m, TypeSpec::NoneType)) {
        return None;
    }
    let mut others: Vec<TypeSpec> = members
        .iter()
        .filter(|m| !matches!(m, TypeSpec::NoneType))
        .cloned()
        .collect();
    match others.len() {
        0 => None,
        1 => others.pop(),
        _ => Some(TypeSpec::Union(others)),
    }
}

fn is_numeric(spec: &TypeSpec) -> bool {
    match spec {
        TypeSpec::Int | TypeSpec::Float => true,
        TypeSpec::Annotated(inner, _) => is_numeric(inner),
        TypeSpec::NewType(alias) => is_numeric(&alias.inner),
        _ => false,
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

// ─────────────────────────────────────────────────────────────────────────────
// Global registry
// ─────────────────────────────────────────────────────────────────────────────

static GUI_REGISTRY: LazyLock<RwLock<GuiRegistry>> = LazyLock::new(|| RwLock::new(GuiRegistry::new()));

/// Shared access to the process-wide registry.
///
/// The lock is recursive for readers, so factories may call [`factor`].
pub fn gui_registry() -> RwLockReadGuard<'static, GuiRegistry> {
    GUI_REGISTRY.read_recursive()
}

/// Exclusive access to the process-wide registry, for setup code.
pub fn gui_registry_mut() -> RwLockWriteGuard<'static, GuiRegistry> {
    GUI_REGISTRY.write()
}

/// Registers the widget built by `factory` for `T` in the global registry.
pub fn register_type<T, W, F>(factory: F)
where
    T: FiatType,
    W: DataWidget,
    F: Fn() -> W + Send + Sync + 'static,
{
    gui_registry_mut().register_type::<T, W, F>(factory);
}

/// Registers a new type in the global registry.
///
/// # Errors
///
/// See [`GuiRegistry::register_new_type`].
pub fn register_new_type<T, W, F>(factory: F) -> Result<(), RegistryError>
where
    T: FiatType,
    W: DataWidget,
    F: Fn() -> W + Send + Sync + 'static,
{
    gui_registry_mut().register_new_type::<T, W, F>(factory)
}

/// Registers a prefix factory in the global registry.
pub fn register_prefix<F>(prefix: impl Into<String>, explanation: impl Into<String>, factory: F)
where
    F: Fn(&TypeSpec) -> Box<dyn DataWidget> + Send + Sync + 'static,
{
    gui_registry_mut().register_prefix(prefix, explanation, factory);
}

/// Registers a union-prefix factory in the global registry.
pub fn register_union_prefix<F>(prefix: impl Into<String>, explanation: impl Into<String>, factory: F)
where
    F: Fn(&TypeSpec) -> Box<dyn DataWidget> + Send + Sync + 'static,
{
    gui_registry_mut().register_union_prefix(prefix, explanation, factory);
}

/// Registers a bounded integer type in the global registry.
pub fn register_bound_int<T: FiatType>(range: (i64, i64)) {
    gui_registry_mut().register_bound_int::<T>(range);
}

/// Registers a bounded float type in the global registry.
pub fn register_bound_float<T: FiatType>(range: (f64, f64)) {
    gui_registry_mut().register_bound_float::<T>(range);
}

/// Registers a record with default attributes in the global registry.
///
/// # Errors
///
/// See [`GuiRegistry::register_record`].
pub fn register_record<T: FiatType>(attrs: FiatAttributes) -> Result<(), RegistryError> {
    gui_registry_mut().register_record::<T>(attrs)
}

/// Builds a widget with the global registry.
///
/// # Errors
///
/// See [`GuiRegistry::factor`].
pub fn factor(spec: &TypeSpec, attrs: &FiatAttributes) -> Result<AnyDataWithGui, RegistryError> {
    gui_registry().factor(spec, attrs)
}

/// Builds a widget for `T` with the global registry.
///
/// # Errors
///
/// See [`GuiRegistry::factor`].
pub fn factor_type<T: FiatType>(attrs: &FiatAttributes) -> Result<AnyDataWithGui, RegistryError> {
    gui_registry().factor_type::<T>(attrs)
}

/// Builds a widget for `T` holding `value`, with the global registry.
///
/// # Errors
///
/// See [`GuiRegistry::factor`].
pub fn to_data_with_gui<T: FiatType>(value: T, attrs: &FiatAttributes) -> Result<AnyDataWithGui, RegistryError> {
    gui_registry().to_data_with_gui(value, attrs)
}
