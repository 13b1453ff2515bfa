//! [`AnyDataWithGui`]: one value plus the widget that renders, edits,
//! validates and serializes it.

use core::fmt;
use std::sync::Arc;

use serde_json::{Value as JsonValue, json};

use crate::attributes::{AttrValue, FiatAttributes};
use crate::error::{RegistryError, SerializationError, ValueError};
use crate::fiat_type::FiatType;
use crate::schema::TypeSpec;
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};
use crate::widget::{CollapseOrExpand, DataWidget, PresentOrEdit};

/// A validator: returns a possibly adjusted value, or an error message.
pub type Validator = Arc<dyn Fn(&FiatValue) -> Result<FiatValue, String> + Send + Sync>;

/// A callback fired after a valid value was assigned.
pub type OnChange = Arc<dyn Fn(&FiatValue) + Send + Sync>;

/// A provider of default values.
pub type DefaultValueProvider = Arc<dyn Fn() -> FiatValue + Send + Sync>;

/// Builds a [`Validator`] from a typed closure.
///
/// Values that cannot be converted to `T` are rejected with the conversion error.
///
/// # Example
///
/// ```
/// use fiatlight_core::{typed_validator, FiatValue};
///
/// let even = typed_validator(|x: i64| if x % 2 == 0 { Ok(x) } else { Err("must be even".into()) });
/// assert!(even(&FiatValue::Int(4)).is_ok());
/// assert_eq!(even(&FiatValue::Int(3)), Err("must be even".to_string()));
/// ```
pub fn typed_validator<T, F>(f: F) -> Validator
where
    T: FiatType,
    F: Fn(T) -> Result<T, String> + Send + Sync + 'static,
{
    Arc::new(move |value: &FiatValue| -> Result<FiatValue, String> {
        let typed = T::from_fiat(value.clone()).map_err(|e| e.to_string())?;
        f(typed).map(FiatType::into_fiat)
    })
}

/// A value together with its widget.
///
/// Setting a concrete value runs the widget's intrinsic validation and
/// then every registered validator, in registration order. If one fails
/// the value becomes [`DataValue::Invalid`] (keeping the original input)
/// and `on_change` is not fired. `Unspecified`, `Error` and `Invalid` are
/// stored as given.
pub struct AnyDataWithGui {
    spec: TypeSpec,
    typename: String,
    value: DataValue,
    widget: Box<dyn DataWidget>,
    fiat_attributes: FiatAttributes,
    validators: Vec<Validator>,
    on_change: Vec<OnChange>,
    default_value_provider: Option<DefaultValueProvider>,
    label: Option<String>,
    tooltip: Option<String>,
    label_color: Option<FiatValue>,
    expanded: bool,
    can_set_unspecified_or_default: bool,
    can_be_none: bool,
}

impl AnyDataWithGui {
    /// Wraps `widget` for values of `spec`.
    pub fn new(spec: TypeSpec, widget: impl DataWidget) -> Self {
        Self::from_boxed(spec, Box::new(widget))
    }

    /// Wraps an already boxed widget.
    #[must_use]
    pub fn from_boxed(spec: TypeSpec, widget: Box<dyn DataWidget>) -> Self {
        Self {
            typename: spec.typename(),
            can_be_none: spec.can_be_none(),
            spec,
            value: DataValue::Unspecified,
            widget,
            fiat_attributes: FiatAttributes::new(),
            validators: Vec::new(),
            on_change: Vec::new(),
            default_value_provider: None,
            label: None,
            tooltip: None,
            label_color: None,
            expanded: true,
            can_set_unspecified_or_default: true,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Type information
    // ─────────────────────────────────────────────────────────────────────────

    /// The declared type.
    #[must_use]
    pub fn type_spec(&self) -> &TypeSpec {
        &self.spec
    }

    /// Fully-qualified name of the declared type.
    #[must_use]
    pub fn typename(&self) -> &str {
        &self.typename
    }

    /// Last path segment of the typename.
    #[must_use]
    pub fn datatype_basename(&self) -> String {
        self.spec.basename()
    }

    /// Whether `None` is an acceptable value.
    #[must_use]
    pub fn can_be_none(&self) -> bool {
        self.can_be_none
    }

    /// Replaces the declared type, keeping the widget.
    ///
    /// Used when an alias or an annotated type is rendered by the widget of
    /// the type it wraps.
    pub(crate) fn retype(&mut self, spec: TypeSpec) {
        self.typename = spec.typename();
        self.can_be_none = spec.can_be_none();
        self.spec = spec;
    }

    /// Overrides whether `None` is an acceptable value.
    pub fn set_can_be_none(&mut self, can_be_none: bool) {
        self.can_be_none = can_be_none;
    }

    /// The widget, type-erased.
    #[must_use]
    pub fn widget(&self) -> &dyn DataWidget {
        self.widget.as_ref()
    }

    /// Downcasts the widget.
    #[must_use]
    pub fn widget_as<W: DataWidget>(&self) -> Option<&W> {
        self.widget.downcast_ref::<W>()
    }

    /// Downcasts the widget mutably.
    pub fn widget_as_mut<W: DataWidget>(&mut self) -> Option<&mut W> {
        self.widget.downcast_mut::<W>()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Value
    // ─────────────────────────────────────────────────────────────────────────

    /// The current value.
    #[must_use]
    pub fn value(&self) -> &DataValue {
        &self.value
    }

    /// The current value if it is valid.
    pub fn actual_value(&self) -> Result<&FiatValue, ValueError> {
        match &self.value {
            DataValue::Value(v) => Ok(v),
            other => Err(ValueError::NotConcrete {
                state: other.state_name(),
            }),
        }
    }

    /// Converts the current value to a typed value.
    pub fn actual_value_as<T: FiatType>(&self) -> Result<T, ValueError> {
        T::from_fiat(self.actual_value()?.clone())
    }

    /// Assigns a value, running validators for concrete values.
    pub fn set_value(&mut self, value: impl Into<DataValue>) {
        match value.into() {
            DataValue::Value(v) => self.set_concrete_value(v),
            other => self.value = other,
        }
    }

    /// Assigns a typed value.
    pub fn set_typed<T: FiatType>(&mut self, value: T) {
        self.set_concrete_value(value.into_fiat());
    }

    fn set_concrete_value(&mut self, value: FiatValue) {
        match self.validate_value(value.clone()) {
            Ok(current) => {
                self.value = DataValue::Value(current.clone());
                self.widget.on_change(&current);
                for callback in &self.on_change {
                    callback(&current);
                }
            }
            Err(message) => self.value = DataValue::Invalid { value, message },
        }
    }

    /// Runs the widget's intrinsic validation and then every validator,
    /// without storing the result.
    ///
    /// Returns the adjusted value, or every failure message joined with `"; "`.
    pub fn validate_value(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        let mut messages = Vec::new();
        let mut current = match self.widget.validate(value.clone()) {
            Ok(adjusted) => adjusted,
            Err(message) => {
                messages.push(message);
                value
            }
        };
        for validator in &self.validators {
            match validator(&current) {
                Ok(adjusted) => current = adjusted,
                Err(message) => messages.push(message),
            }
        }
        if messages.is_empty() {
            Ok(current)
        } else {
            Err(messages.join("; "))
        }
    }

    /// Stores a value as is: no validation, no `on_change`.
    ///
    /// Composite widgets use this to mirror their value into children
    /// before drawing them.
    pub fn store_value(&mut self, value: DataValue) {
        self.value = value;
    }

    /// Adds a validator at the end of the chain.
    pub fn add_validator(&mut self, validator: Validator) {
        self.validators.push(validator);
    }

    /// Number of user validators.
    #[must_use]
    pub fn nb_validators(&self) -> usize {
        self.validators.len()
    }

    /// Adds a callback fired after every valid assignment.
    pub fn add_on_change(&mut self, callback: impl Fn(&FiatValue) + Send + Sync + 'static) {
        self.on_change.push(Arc::new(callback));
    }

    /// Overrides the widget's default value provider.
    pub fn set_default_value_provider(&mut self, provider: impl Fn() -> FiatValue + Send + Sync + 'static) {
        self.default_value_provider = Some(Arc::new(provider));
    }

    /// Whether a default value can be produced.
    pub fn can_construct_default_value(&mut self) -> bool {
        self.construct_default_value().is_some()
    }

    /// Produces a default value, from the override or from the widget.
    pub fn construct_default_value(&mut self) -> Option<FiatValue> {
        match &self.default_value_provider {
            Some(provider) => Some(provider()),
            None => self.widget.default_value(),
        }
    }

    /// One-line summary of any value state.
    #[must_use]
    pub fn present_str_of(&self, value: &DataValue) -> String {
        match value {
            DataValue::Unspecified => "Unspecified".to_string(),
            DataValue::Error => "Error".to_string(),
            DataValue::Invalid { value, message } => {
                format!("Invalid: {} ({message})", self.widget.present_str(value))
            }
            DataValue::Value(v) => self.widget.present_str(v),
        }
    }

    /// One-line summary of the current value.
    #[must_use]
    pub fn present_str(&self) -> String {
        self.present_str_of(&self.value)
    }

    /// Clipboard text for the current value.
    #[must_use]
    pub fn clipboard_copy_str(&self) -> Option<String> {
        self.clipboard_copy_str_of(&self.value)
    }

    /// Clipboard text for any value state.
    #[must_use]
    pub fn clipboard_copy_str_of(&self, value: &DataValue) -> Option<String> {
        match value {
            DataValue::Value(v) => self.widget.clipboard_copy_str(v),
            other => Some(self.present_str_of(other)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attributes and presentation state
    // ─────────────────────────────────────────────────────────────────────────

    /// Attributes merged into this widget so far.
    #[must_use]
    pub fn fiat_attributes(&self) -> &FiatAttributes {
        &self.fiat_attributes
    }

    /// Merges attributes and reconfigures the widget.
    ///
    /// Own attributes are checked against the widget's
    /// [`PossibleFiatAttributes`](crate::PossibleFiatAttributes); generic
    /// attributes (`label`, `tooltip`, `validator`, `label_color`) are
    /// handled here.
    pub fn merge_fiat_attributes(&mut self, attrs: &FiatAttributes) -> Result<(), RegistryError> {
        if let Some(possible) = self.widget.possible_fiat_attributes() {
            possible.validate(attrs)?;
        }
        self.fiat_attributes.merge(attrs);

        if let Some(label) = attrs.get_str("label") {
            self.label = Some(label.to_string());
        }
        if let Some(tooltip) = attrs.get_str("tooltip") {
            self.tooltip = Some(tooltip.to_string());
        }
        if let Some(color) = attrs.value("label_color") {
            self.label_color = Some(color.clone());
        }
        if let Some(AttrValue::Validator(validator)) = attrs.get("validator") {
            self.validators.push(Arc::clone(validator));
        }

        self.widget.on_fiat_attributes_changed(&self.fiat_attributes)
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the display label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Tooltip.
    #[must_use]
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Sets the tooltip.
    pub fn set_tooltip(&mut self, tooltip: impl Into<String>) {
        self.tooltip = Some(tooltip.into());
    }

    /// Label color hint.
    #[must_use]
    pub fn label_color(&self) -> Option<&FiatValue> {
        self.label_color.as_ref()
    }

    /// Sets the label color hint.
    pub fn set_label_color(&mut self, color: impl Into<FiatValue>) {
        self.label_color = Some(color.into());
    }

    /// Whether the detailed view is open.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Opens or closes the detailed view.
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Whether the user may clear the value or reset it to its default.
    #[must_use]
    pub fn can_set_unspecified_or_default(&self) -> bool {
        self.can_set_unspecified_or_default
    }

    /// Sets the clear / reset policy.
    pub fn set_can_set_unspecified_or_default(&mut self, can: bool) {
        self.can_set_unspecified_or_default = can;
    }

    /// Whether the presentation can be collapsed.
    #[must_use]
    pub fn present_collapsible(&self) -> bool {
        self.widget.present_collapsible()
    }

    /// Whether the editor can be collapsed.
    #[must_use]
    pub fn edit_collapsible(&self) -> bool {
        self.widget.edit_collapsible()
    }

    /// Whether the presentation fits in a node (otherwise it needs a popup).
    #[must_use]
    pub fn present_node_compatible(&self) -> bool {
        self.widget.present_node_compatible()
    }

    /// Whether the editor fits in a node (otherwise it needs a popup).
    #[must_use]
    pub fn edit_node_compatible(&self) -> bool {
        self.widget.can_edit() && self.widget.edit_node_compatible()
    }

    /// Whether the widget can edit values at all.
    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.widget.can_edit()
    }

    /// Whether some sub-item can collapse.
    #[must_use]
    pub fn sub_items_can_collapse(&self, mode: PresentOrEdit) -> bool {
        self.widget.sub_items_can_collapse(mode)
    }

    /// What "collapse all / expand all" would do next.
    #[must_use]
    pub fn sub_items_will_collapse_or_expand(&self, mode: PresentOrEdit) -> CollapseOrExpand {
        self.widget.sub_items_will_collapse_or_expand(mode)
    }

    /// Collapses or expands every sub-item, recursively.
    pub fn sub_items_collapse_or_expand(&mut self, action: CollapseOrExpand) {
        self.widget.sub_items_collapse_or_expand(action);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frame callbacks
    // ─────────────────────────────────────────────────────────────────────────

    /// Draws the presentation of the current value.
    pub fn gui_present(&mut self, ui: &mut dyn Ui) {
        let id = self.gui_id();
        ui.push_id(&id);
        match &self.value {
            DataValue::Value(v) => {
                let v = v.clone();
                self.widget.present(ui, &v);
            }
            other => ui.text(&self.present_str_of(other)),
        }
        ui.pop_id();
    }

    /// Draws the editor; returns `true` if the value changed.
    pub fn gui_edit(&mut self, ui: &mut dyn Ui) -> bool {
        let id = self.gui_id();
        ui.push_id(&id);
        let changed = self.gui_edit_inner(ui);
        ui.pop_id();
        changed
    }

    fn gui_edit_inner(&mut self, ui: &mut dyn Ui) -> bool {
        let edited = match self.value.clone() {
            DataValue::Unspecified | DataValue::Error => {
                ui.text(self.value.state_name());
                if self.can_set_unspecified_or_default
                    && self.widget.can_edit()
                    && ui.button("Set default")
                {
                    match self.construct_default_value() {
                        Some(default) => Some(DataValue::Value(default)),
                        None => {
                            tracing::warn!(typename = %self.typename, "no default value provider");
                            None
                        }
                    }
                } else {
                    None
                }
            }
            DataValue::Invalid { value, message } => {
                let edited = self.widget.edit(ui, &value);
                ui.text(&message);
                edited
            }
            DataValue::Value(value) => {
                let edited = self.widget.edit(ui, &value);
                if edited.is_none() && self.can_set_unspecified_or_default && ui.button("Reset") {
                    Some(DataValue::Unspecified)
                } else {
                    edited
                }
            }
        };

        match edited {
            Some(new_value) => {
                self.set_value(new_value);
                true
            }
            None => false,
        }
    }

    fn gui_id(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.typename.clone())
    }

    /// Per-frame update; returns `true` if the value needs to be refreshed.
    pub fn on_heartbeat(&mut self) -> bool {
        self.widget.on_heartbeat()
    }

    /// Releases resources held by the widget.
    pub fn on_exit(&mut self) {
        self.widget.on_exit();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────────────────────

    /// Serializes a value as `{"type": <tag>, ...}`.
    ///
    /// Invalid values are saved as `Unspecified`; a widget that cannot
    /// serialize its value also yields `Unspecified` (with a warning).
    #[must_use]
    pub fn save_to_dict(&self, value: &DataValue) -> JsonValue {
        match value {
            DataValue::Unspecified | DataValue::Invalid { .. } => json!({"type": "Unspecified"}),
            DataValue::Error => json!({"type": "Error"}),
            DataValue::Value(v) => match self.widget.save_value(v) {
                Ok(saved) => saved,
                Err(err) => {
                    tracing::warn!(typename = %self.typename, error = %err, "cannot save value");
                    json!({"type": "Unspecified"})
                }
            },
        }
    }

    /// Deserializes a value saved by [`save_to_dict`](Self::save_to_dict).
    pub fn load_from_dict(&mut self, json: &JsonValue) -> Result<DataValue, SerializationError> {
        let tag = json
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| SerializationError::MissingKey("type".to_string()))?;
        match tag {
            "Unspecified" => Ok(DataValue::Unspecified),
            "Error" => Ok(DataValue::Error),
            _ => Ok(DataValue::Value(self.widget.load_value(json)?)),
        }
    }

    /// Serializes the current value.
    #[must_use]
    pub fn call_save_to_dict(&self) -> JsonValue {
        self.save_to_dict(&self.value)
    }

    /// Loads and assigns a value (validators run, so it may become invalid).
    pub fn call_load_from_dict(&mut self, json: &JsonValue) -> Result<(), SerializationError> {
        let value = self.load_from_dict(json)?;
        self.set_value(value);
        Ok(())
    }

    /// Layout state: `{"expanded": bool, "widget": ...}`.
    #[must_use]
    pub fn save_gui_options_to_json(&self) -> JsonValue {
        let mut options = json!({"expanded": self.expanded});
        let widget_options = self.widget.save_gui_options();
        if !widget_options.is_null() {
            options["widget"] = widget_options;
        }
        options
    }

    /// Restores layout state saved by [`save_gui_options_to_json`](Self::save_gui_options_to_json).
    pub fn load_gui_options_from_json(&mut self, json: &JsonValue) {
        if let Some(expanded) = json.get("expanded").and_then(JsonValue::as_bool) {
            self.expanded = expanded;
        }
        if let Some(widget_options) = json.get("widget") {
            self.widget.load_gui_options(widget_options);
        }
    }
}

impl fmt::Debug for AnyDataWithGui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyDataWithGui")
            .field("typename", &self.typename)
            .field("value", &self.value)
            .field("label", &self.label)
            .field("fiat_attributes", &self.fiat_attributes)
            .finish_non_exhaustive()
    }
}
