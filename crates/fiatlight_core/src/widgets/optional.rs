//! `Optional[T]`: either `None` or a value edited by the inner widget.

use serde_json::{Value as JsonValue, json};

use crate::data::AnyDataWithGui;
use crate::error::SerializationError;
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};
use crate::widget::{CollapseOrExpand, DataWidget, PresentOrEdit};

/// Serialization tag of optional values.
pub const OPTIONAL_TAG: &str = "Optional";

/// Widget for `Optional[T]`.
///
/// When the value is `None` the editor offers "Set", which materializes the
/// inner default; otherwise it shows the inner editor and "Unset".
#[derive(Debug)]
pub struct OptionalWidget {
    inner: AnyDataWithGui,
}

impl OptionalWidget {
    /// Wraps the widget of the inner type.
    #[must_use]
    pub fn new(mut inner: AnyDataWithGui) -> Self {
        inner.set_can_set_unspecified_or_default(false);
        Self { inner }
    }

    /// The inner widget.
    #[must_use]
    pub fn inner(&self) -> &AnyDataWithGui {
        &self.inner
    }

    /// The inner widget, mutably.
    pub fn inner_mut(&mut self) -> &mut AnyDataWithGui {
        &mut self.inner
    }
}

impl DataWidget for OptionalWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        match value {
            FiatValue::None => "None".to_string(),
            v => self.inner.present_str_of(&DataValue::Value(v.clone())),
        }
    }

    fn present(&mut self, ui: &mut dyn Ui, value: &FiatValue) {
        match value {
            FiatValue::None => ui.text("None"),
            v => {
                self.inner.store_value(DataValue::Value(v.clone()));
                self.inner.gui_present(ui);
            }
        }
    }

    fn has_custom_present(&self) -> bool {
        true
    }

    fn can_edit(&self) -> bool {
        self.inner.can_edit()
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        if value.is_none() {
            ui.text("None");
            if !ui.button("Set") {
                return None;
            }
            return match self.inner.construct_default_value() {
                Some(default) => Some(DataValue::Value(default)),
                None => {
                    tracing::warn!(typename = %self.inner.typename(), "cannot set optional: inner type has no default");
                    None
                }
            };
        }

        self.inner.store_value(DataValue::Value(value.clone()));
        let edited = if self.inner.gui_edit(ui) {
            match self.inner.value() {
                DataValue::Value(v) => Some(DataValue::Value(v.clone())),
                invalid @ DataValue::Invalid { .. } => Some(invalid.clone()),
                DataValue::Unspecified | DataValue::Error => None,
            }
        } else {
            None
        };
        if edited.is_none() && ui.button("Unset") {
            return Some(DataValue::Value(FiatValue::None));
        }
        edited
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        Some(FiatValue::None)
    }

    fn validate(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        match value {
            FiatValue::None => Ok(FiatValue::None),
            v => self.inner.validate_value(v),
        }
    }

    fn on_heartbeat(&mut self) -> bool {
        self.inner.on_heartbeat()
    }

    fn on_exit(&mut self) {
        self.inner.on_exit();
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        let payload = match value {
            FiatValue::None => JsonValue::Null,
            v => self.inner.save_to_dict(&DataValue::Value(v.clone())),
        };
        Ok(json!({"type": OPTIONAL_TAG, "value": payload}))
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        let tag = json.get("type").and_then(JsonValue::as_str).unwrap_or_default();
        if tag != OPTIONAL_TAG {
            return Err(SerializationError::UnexpectedTag {
                expected: OPTIONAL_TAG.to_string(),
                found: tag.to_string(),
            });
        }
        match json.get("value") {
            None | Some(JsonValue::Null) => Ok(FiatValue::None),
            Some(payload) => match self.inner.load_from_dict(payload)? {
                DataValue::Value(v) => Ok(v),
                other => Err(SerializationError::malformed(
                    "optional",
                    format!("inner value is {}", other.state_name()),
                )),
            },
        }
    }

    fn save_gui_options(&self) -> JsonValue {
        self.inner.save_gui_options_to_json()
    }

    fn load_gui_options(&mut self, json: &JsonValue) {
        self.inner.load_gui_options_from_json(json);
    }

    fn clipboard_copy_str(&self, value: &FiatValue) -> Option<String> {
        match value {
            FiatValue::None => Some("None".to_string()),
            v => self.inner.clipboard_copy_str_of(&DataValue::Value(v.clone())),
        }
    }

    fn present_collapsible(&self) -> bool {
        self.inner.present_collapsible()
    }

    fn edit_collapsible(&self) -> bool {
        self.inner.edit_collapsible()
    }

    fn present_node_compatible(&self) -> bool {
        self.inner.present_node_compatible()
    }

    fn edit_node_compatible(&self) -> bool {
        self.inner.edit_node_compatible()
    }

    fn sub_items_can_collapse(&self, mode: PresentOrEdit) -> bool {
        self.inner.sub_items_can_collapse(mode)
    }

    fn sub_items_will_collapse_or_expand(&self, mode: PresentOrEdit) -> CollapseOrExpand {
        self.inner.sub_items_will_collapse_or_expand(mode)
    }

    fn sub_items_collapse_or_expand(&mut self, action: CollapseOrExpand) {
        self.inner.sub_items_collapse_or_expand(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::typed_validator;
    use crate::schema::TypeSpec;
    use crate::ui::HeadlessUi;
    use crate::widgets::primitives::IntWidget;

    fn optional_int() -> AnyDataWithGui {
        let inner = AnyDataWithGui::new(TypeSpec::Int, IntWidget::new());
        AnyDataWithGui::new(TypeSpec::optional(TypeSpec::Int), OptionalWidget::new(inner))
    }

    #[test]
    fn default_is_none() {
        let mut data = optional_int();
        assert!(data.can_be_none());
        assert_eq!(data.construct_default_value(), Some(FiatValue::None));
    }

    #[test]
    fn set_and_unset() {
        let mut data = optional_int();
        data.set_label("x");
        data.set_value(FiatValue::None);

        let mut ui = HeadlessUi::new();
        ui.press("Set");
        assert!(data.gui_edit(&mut ui));
        assert_eq!(data.value(), &DataValue::Value(FiatValue::Int(0)));

        ui.press("Unset");
        assert!(data.gui_edit(&mut ui));
        assert_eq!(data.value(), &DataValue::Value(FiatValue::None));
    }

    #[test]
    fn inner_validators_apply_to_some_values() {
        let inner = {
            let mut inner = AnyDataWithGui::new(TypeSpec::Int, IntWidget::new());
            inner.add_validator(typed_validator(|x: i64| {
                if x >= 0 { Ok(x) } else { Err("negative".into()) }
            }));
            inner
        };
        let mut data = AnyDataWithGui::new(TypeSpec::optional(TypeSpec::Int), OptionalWidget::new(inner));
        data.set_value(FiatValue::Int(-1));
        assert_eq!(data.value().invalid_message(), Some("negative"));
        data.set_value(FiatValue::None);
        assert!(data.value().is_valid());
    }

    #[test]
    fn serialization_round_trip() {
        let mut data = optional_int();
        for value in [FiatValue::None, FiatValue::Int(12)] {
            let saved = data.save_to_dict(&DataValue::Value(value.clone()));
            assert_eq!(data.load_from_dict(&saved).unwrap(), DataValue::Value(value));
        }
        let saved = data.save_to_dict(&DataValue::Value(FiatValue::Int(12)));
        assert_eq!(
            saved,
            json!({"type": "Optional", "value": {"type": "Primitive", "value": 12}})
        );
    }
}
