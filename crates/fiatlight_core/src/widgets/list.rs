//! `List[T]`: a present-only widget over a list of values.
//!
//! A node shows the first few elements; a details popup pages through the
//! rest.

use std::sync::LazyLock;

use serde_json::{Value as JsonValue, json};

use crate::attributes::{AttrKind, FiatAttributes, PossibleFiatAttributes};
use crate::config::fiat_config;
use crate::data::AnyDataWithGui;
use crate::error::{RegistryError, SerializationError};
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};
use crate::widget::DataWidget;

/// Serialization tag of list values.
pub const LIST_TAG: &str = "List";

const DETAILS_POPUP: &str = "list_details";

static LIST_ATTRIBUTES: LazyLock<PossibleFiatAttributes> = LazyLock::new(|| {
    PossibleFiatAttributes::new("list")
        .add("maximum_elements_in_node", AttrKind::Int, "Number of elements shown inside a node")
        .add("popup_page_size", AttrKind::Int, "Number of elements added by \"Show more\"")
});

/// Widget for `List[T]`.
#[derive(Debug)]
pub struct ListWidget {
    element: AnyDataWithGui,
    maximum_elements_in_node: usize,
    popup_page_size: usize,
    popup_shown_count: usize,
}

impl ListWidget {
    /// Creates a list widget; `element` renders and serializes each item.
    #[must_use]
    pub fn new(element: AnyDataWithGui) -> Self {
        let style = fiat_config().style;
        Self {
            element,
            maximum_elements_in_node: style.list_maximum_elements_in_node,
            popup_page_size: style.list_popup_page_size,
            popup_shown_count: style.list_popup_page_size,
        }
    }

    /// The element widget.
    #[must_use]
    pub fn element(&self) -> &AnyDataWithGui {
        &self.element
    }

    /// Number of elements shown inside a node.
    #[must_use]
    pub fn maximum_elements_in_node(&self) -> usize {
        self.maximum_elements_in_node
    }

    /// Number of elements currently shown in the details popup.
    #[must_use]
    pub fn popup_shown_count(&self) -> usize {
        self.popup_shown_count
    }

    fn element_str(&self, item: &FiatValue) -> String {
        self.element.present_str_of(&DataValue::Value(item.clone()))
    }

    fn present_lines(&self, ui: &mut dyn Ui, items: &[FiatValue], shown: usize) {
        for (i, item) in items.iter().take(shown).enumerate() {
            ui.text(&format!("{i}: {}", self.element_str(item)));
        }
        if items.len() > shown {
            ui.text(&format!("...{} more elements", items.len() - shown));
        }
    }
}

impl DataWidget for ListWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        match value {
            FiatValue::List(items) => format!("List of {} elements", items.len()),
            other => other.to_string(),
        }
    }

    fn present(&mut self, ui: &mut dyn Ui, value: &FiatValue) {
        let FiatValue::List(items) = value else {
            ui.text(&value.to_string());
            return;
        };
        ui.text(&self.present_str(value));
        self.present_lines(ui, items, self.maximum_elements_in_node);

        if items.len() > self.maximum_elements_in_node && ui.button("Details") {
            ui.open_popup(DETAILS_POPUP);
        }
        if ui.begin_popup(DETAILS_POPUP) {
            self.present_lines(ui, items, self.popup_shown_count);
            if items.len() > self.popup_shown_count && ui.button("Show more") {
                self.popup_shown_count += self.popup_page_size;
            }
            if ui.button("Close") {
                ui.close_current_popup();
            }
            ui.end_popup();
        }
    }

    fn has_custom_present(&self) -> bool {
        true
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        Some(FiatValue::List(Vec::new()))
    }

    fn validate(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        let items = match value {
            FiatValue::List(items) => items,
            other => return Err(format!("expected a list, got {}", other.kind_name())),
        };
        let mut messages = Vec::new();
        let mut validated = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match self.element.validate_value(item.clone()) {
                Ok(v) => validated.push(v),
                Err(message) => {
                    messages.push(format!("{i}: {message}"));
                    validated.push(item);
                }
            }
        }
        if messages.is_empty() {
            Ok(FiatValue::List(validated))
        } else {
            Err(messages.join("; "))
        }
    }

    fn on_exit(&mut self) {
        self.element.on_exit();
    }

    fn possible_fiat_attributes(&self) -> Option<&PossibleFiatAttributes> {
        Some(&LIST_ATTRIBUTES)
    }

    fn on_fiat_attributes_changed(&mut self, attrs: &FiatAttributes) -> Result<(), RegistryError> {
        if let Some(n) = attrs.get_int("maximum_elements_in_node") {
            self.maximum_elements_in_node = usize::try_from(n).unwrap_or(0);
        }
        if let Some(n) = attrs.get_int("popup_page_size") {
            self.popup_page_size = usize::try_from(n).unwrap_or(1).max(1);
            self.popup_shown_count = self.popup_page_size;
        }
        Ok(())
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        let FiatValue::List(items) = value else {
            return Err(SerializationError::malformed("list", format!("got {}", value.kind_name())));
        };
        let saved: Vec<JsonValue> = items
            .iter()
            .map(|item| self.element.save_to_dict(&DataValue::Value(item.clone())))
            .collect();
        Ok(json!({"type": LIST_TAG, "value": saved}))
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        let tag = json.get("type").and_then(JsonValue::as_str).unwrap_or_default();
        if tag != LIST_TAG {
            return Err(SerializationError::UnexpectedTag {
                expected: LIST_TAG.to_string(),
                found: tag.to_string(),
            });
        }
        let saved = json
            .get("value")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| SerializationError::malformed("list", "value is not an array"))?;
        let mut items = Vec::with_capacity(saved.len());
        for (i, item) in saved.iter().enumerate() {
            match self.element.load_from_dict(item)? {
                DataValue::Value(v) => items.push(v),
                other => {
                    return Err(SerializationError::malformed(
                        "list",
                        format!("element {i} is {}", other.state_name()),
                    ));
                }
            }
        }
        Ok(FiatValue::List(items))
    }

    fn save_gui_options(&self) -> JsonValue {
        json!({"popup_shown_count": self.popup_shown_count})
    }

    fn load_gui_options(&mut self, json: &JsonValue) {
        if let Some(n) = json.get("popup_shown_count").and_then(JsonValue::as_u64) {
            self.popup_shown_count = usize::try_from(n).unwrap_or(self.popup_page_size);
        }
    }

    fn clipboard_copy_str(&self, value: &FiatValue) -> Option<String> {
        let FiatValue::List(items) = value else {
            return None;
        };
        let parts = items
            .iter()
            .map(|item| self.element.clipboard_copy_str_of(&DataValue::Value(item.clone())))
            .collect::<Option<Vec<_>>>()?;
        Some(format!("[{}]", parts.join(", ")))
    }

    fn present_collapsible(&self) -> bool {
        true
    }

    fn edit_node_compatible(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeSpec;
    use crate::ui::HeadlessUi;
    use crate::widgets::primitives::IntWidget;

    fn int_list() -> AnyDataWithGui {
        let element = AnyDataWithGui::new(TypeSpec::Int, IntWidget::new());
        AnyDataWithGui::new(TypeSpec::list(TypeSpec::Int), ListWidget::new(element))
    }

    fn ints(n: i64) -> FiatValue {
        FiatValue::List((0..n).map(FiatValue::Int).collect())
    }

    #[test]
    fn presentation_is_truncated_in_node() {
        let mut data = int_list();
        data.set_value(ints(13));
        assert_eq!(data.present_str(), "List of 13 elements");

        let mut ui = HeadlessUi::new();
        data.gui_present(&mut ui);
        assert!(ui.drew("9: 9"));
        assert!(!ui.drew("10: 10"));
        assert!(ui.drew("...3 more elements"));
    }

    #[test]
    fn details_popup_pages_through_elements() {
        let mut data = int_list();
        data.merge_fiat_attributes(&FiatAttributes::new().with("popup_page_size", 5))
            .unwrap();
        data.set_value(ints(12));

        let mut ui = HeadlessUi::new();
        ui.press("Details");
        data.gui_present(&mut ui);
        ui.clear_transcript();

        ui.press("Show more");
        data.gui_present(&mut ui);
        assert!(ui.drew("4: 4"));
        assert_eq!(data.widget_as::<ListWidget>().unwrap().popup_shown_count(), 10);
    }

    #[test]
    fn lists_cannot_be_edited() {
        let mut data = int_list();
        data.set_value(ints(2));
        assert!(!data.can_edit());
        assert!(!data.edit_node_compatible());
    }

    #[test]
    fn serialization_round_trip() {
        let mut data = int_list();
        let value = DataValue::Value(ints(3));
        let saved = data.save_to_dict(&value);
        assert_eq!(saved["type"], "List");
        assert_eq!(data.load_from_dict(&saved).unwrap(), value);
        assert_eq!(data.clipboard_copy_str_of(&value), Some("[0, 1, 2]".to_string()));
    }
}
