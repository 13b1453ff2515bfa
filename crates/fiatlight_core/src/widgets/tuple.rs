//! `Tuple[T1, ..., Tn]`: one nested widget per slot.

use serde_json::{Value as JsonValue, json};

use crate::data::AnyDataWithGui;
use crate::error::SerializationError;
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};
use crate::widget::{CollapseOrExpand, DataWidget, PresentOrEdit};

/// Serialization tag of tuple values.
pub const TUPLE_TAG: &str = "Tuple";

/// Widget for fixed-arity tuples.
#[derive(Debug)]
pub struct TupleWidget {
    slots: Vec<AnyDataWithGui>,
}

impl TupleWidget {
    /// Creates a tuple widget from one widget per slot.
    ///
    /// Slots are labelled `"i (typename)"` and cannot be cleared individually.
    #[must_use]
    pub fn new(mut slots: Vec<AnyDataWithGui>) -> Self {
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.label().is_none() {
                let label = format!("{i} ({})", slot.typename());
                slot.set_label(label);
            }
            slot.set_can_set_unspecified_or_default(false);
        }
        Self { slots }
    }

    /// The slot widgets.
    #[must_use]
    pub fn slots(&self) -> &[AnyDataWithGui] {
        &self.slots
    }

    fn items<'a>(&self, value: &'a FiatValue) -> Option<&'a [FiatValue]> {
        match value {
            FiatValue::Tuple(items) if items.len() == self.slots.len() => Some(items),
            _ => None,
        }
    }

    fn mirror(&mut self, items: &[FiatValue]) {
        for (slot, item) in self.slots.iter_mut().zip(items) {
            slot.store_value(DataValue::Value(item.clone()));
        }
    }
}

impl DataWidget for TupleWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        let Some(items) = self.items(value) else {
            return value.to_string();
        };
        let parts: Vec<String> = self
            .slots
            .iter()
            .zip(items)
            .map(|(slot, item)| slot.present_str_of(&DataValue::Value(item.clone())))
            .collect();
        format!("({})", parts.join(", "))
    }

    fn present(&mut self, ui: &mut dyn Ui, value: &FiatValue) {
        let Some(items) = self.items(value) else {
            ui.text(&value.to_string());
            return;
        };
        self.mirror(items);
        for slot in &mut self.slots {
            slot.gui_present(ui);
        }
    }

    fn has_custom_present(&self) -> bool {
        true
    }

    fn can_edit(&self) -> bool {
        self.slots.iter().all(AnyDataWithGui::can_edit)
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        let items = self.items(value)?.to_vec();
        self.mirror(&items);

        let mut changed = false;
        for slot in &mut self.slots {
            changed |= slot.gui_edit(ui);
        }
        if !changed {
            return None;
        }

        let mut values = Vec::with_capacity(self.slots.len());
        let mut messages = Vec::new();
        for (i, slot) in self.slots.iter().enumerate() {
            match slot.value() {
                DataValue::Value(v) => values.push(v.clone()),
                DataValue::Invalid { value, message } => {
                    values.push(value.clone());
                    messages.push(format!("{i}: {message}"));
                }
                DataValue::Unspecified | DataValue::Error => return None,
            }
        }
        let tuple = FiatValue::Tuple(values);
        if messages.is_empty() {
            Some(DataValue::Value(tuple))
        } else {
            Some(DataValue::invalid(tuple, messages.join("; ")))
        }
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        let defaults = self
            .slots
            .iter_mut()
            .map(AnyDataWithGui::construct_default_value)
            .collect::<Option<Vec<_>>>()?;
        Some(FiatValue::Tuple(defaults))
    }

    fn validate(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        let items = match value {
            FiatValue::Tuple(items) => items,
            other => return Err(format!("expected a tuple, got {}", other.kind_name())),
        };
        if items.len() != self.slots.len() {
            return Err(format!(
                "expected a tuple of {} elements, got {}",
                self.slots.len(),
                items.len()
            ));
        }
        let mut messages = Vec::new();
        let mut validated = Vec::with_capacity(items.len());
        for (i, (slot, item)) in self.slots.iter_mut().zip(items).enumerate() {
            match slot.validate_value(item.clone()) {
                Ok(v) => validated.push(v),
                Err(message) => {
                    messages.push(format!("{i}: {message}"));
                    validated.push(item);
                }
            }
        }
        if messages.is_empty() {
            Ok(FiatValue::Tuple(validated))
        } else {
            Err(messages.join("; "))
        }
    }

    fn on_heartbeat(&mut self) -> bool {
        self.slots
            .iter_mut()
            .fold(false, |changed, slot| slot.on_heartbeat() || changed)
    }

    fn on_exit(&mut self) {
        for slot in &mut self.slots {
            slot.on_exit();
        }
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        let items = self
            .items(value)
            .ok_or_else(|| SerializationError::malformed("tuple", format!("got {}", value.kind_name())))?;
        let saved: Vec<JsonValue> = self
            .slots
            .iter()
            .zip(items)
            .map(|(slot, item)| slot.save_to_dict(&DataValue::Value(item.clone())))
            .collect();
        Ok(json!({"type": TUPLE_TAG, "value": saved}))
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        let tag = json.get("type").and_then(JsonValue::as_str).unwrap_or_default();
        if tag != TUPLE_TAG {
            return Err(SerializationError::UnexpectedTag {
                expected: TUPLE_TAG.to_string(),
                found: tag.to_string(),
            });
        }
        let saved = json
            .get("value")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| SerializationError::malformed("tuple", "value is not an array"))?;
        if saved.len() != self.slots.len() {
            return Err(SerializationError::malformed(
                "tuple",
                format!("expected {} elements, got {}", self.slots.len(), saved.len()),
            ));
        }
        let mut items = Vec::with_capacity(saved.len());
        for (i, (slot, item)) in self.slots.iter_mut().zip(saved).enumerate() {
            match slot.load_from_dict(item)? {
                DataValue::Value(v) => items.push(v),
                other => {
                    return Err(SerializationError::malformed(
                        "tuple",
                        format!("element {i} is {}", other.state_name()),
                    ));
                }
            }
        }
        Ok(FiatValue::Tuple(items))
    }

    fn save_gui_options(&self) -> JsonValue {
        let slots: Vec<JsonValue> = self
            .slots
            .iter()
            .map(AnyDataWithGui::save_gui_options_to_json)
            .collect();
        json!({"slots": slots})
    }

    fn load_gui_options(&mut self, json: &JsonValue) {
        let Some(saved) = json.get("slots").and_then(JsonValue::as_array) else {
            return;
        };
        for (slot, options) in self.slots.iter_mut().zip(saved) {
            slot.load_gui_options_from_json(options);
        }
    }

    fn clipboard_copy_str(&self, value: &FiatValue) -> Option<String> {
        let items = self.items(value)?;
        let parts = self
            .slots
            .iter()
            .zip(items)
            .map(|(slot, item)| slot.clipboard_copy_str_of(&DataValue::Value(item.clone())))
            .collect::<Option<Vec<_>>>()?;
        Some(format!("({})", parts.join(", ")))
    }

    fn present_collapsible(&self) -> bool {
        self.slots.iter().any(AnyDataWithGui::present_collapsible)
    }

    fn edit_collapsible(&self) -> bool {
        self.slots.iter().any(AnyDataWithGui::edit_collapsible)
    }

    fn edit_node_compatible(&self) -> bool {
        self.slots.iter().all(AnyDataWithGui::edit_node_compatible)
    }

    fn sub_items_can_collapse(&self, mode: PresentOrEdit) -> bool {
        self.slots.iter().any(|slot| collapsible(slot, mode))
    }

    fn sub_items_will_collapse_or_expand(&self, mode: PresentOrEdit) -> CollapseOrExpand {
        will_collapse_or_expand(self.slots.iter(), mode)
    }

    fn sub_items_collapse_or_expand(&mut self, action: CollapseOrExpand) {
        for slot in &mut self.slots {
            collapse_or_expand(slot, action);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collapse helpers shared with records
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn collapsible(data: &AnyDataWithGui, mode: PresentOrEdit) -> bool {
    match mode {
        PresentOrEdit::Present => data.present_collapsible(),
        PresentOrEdit::Edit => data.edit_collapsible(),
    }
}

/// `Collapse` when some collapsible child is expanded, else `Expand`.
pub(crate) fn will_collapse_or_expand<'a>(
    mut children: impl Iterator<Item = &'a AnyDataWithGui>,
    mode: PresentOrEdit,
) -> CollapseOrExpand {
    if children.any(|child| collapsible(child, mode) && child.is_expanded()) {
        CollapseOrExpand::Collapse
    } else {
        CollapseOrExpand::Expand
    }
}

pub(crate) fn collapse_or_expand(data: &mut AnyDataWithGui, action: CollapseOrExpand) {
    data.set_expanded(action == CollapseOrExpand::Expand);
    data.sub_items_collapse_or_expand(action);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeSpec;
    use crate::ui::HeadlessUi;
    use crate::widgets::primitives::{IntWidget, StrWidget};
    use crate::widgets::unregistered::UnregisteredWidget;

    fn pair() -> AnyDataWithGui {
        let slots = vec![
            AnyDataWithGui::new(TypeSpec::Int, IntWidget::new()),
            AnyDataWithGui::new(TypeSpec::Str, StrWidget::new()),
        ];
        AnyDataWithGui::new(
            TypeSpec::Tuple(vec![TypeSpec::Int, TypeSpec::Str]),
            TupleWidget::new(slots),
        )
    }

    #[test]
    fn slots_are_labelled_with_index_and_type() {
        let data = pair();
        let widget = data.widget_as::<TupleWidget>().unwrap();
        assert_eq!(widget.slots()[0].label(), Some("0 (int)"));
        assert_eq!(widget.slots()[1].label(), Some("1 (str)"));
        assert!(!widget.slots()[0].can_set_unspecified_or_default());
    }

    #[test]
    fn default_requires_every_slot() {
        let mut data = pair();
        assert_eq!(
            data.construct_default_value(),
            Some(FiatValue::Tuple(vec![FiatValue::Int(0), FiatValue::Str(String::new())]))
        );

        let slots = vec![
            AnyDataWithGui::new(TypeSpec::Int, IntWidget::new()),
            AnyDataWithGui::new(TypeSpec::Custom("app::X".into()), UnregisteredWidget::new("app::X")),
        ];
        let mut data = AnyDataWithGui::new(
            TypeSpec::Tuple(vec![TypeSpec::Int, TypeSpec::Custom("app::X".into())]),
            TupleWidget::new(slots),
        );
        assert!(!data.can_construct_default_value());
        assert!(!data.can_edit());
    }

    #[test]
    fn editing_a_slot_rebuilds_the_tuple() {
        let mut data = pair();
        data.set_value(FiatValue::Tuple(vec![FiatValue::Int(1), FiatValue::Str("a".into())]));

        let mut ui = HeadlessUi::new();
        ui.set_int("0 (int)", 5);
        assert!(data.gui_edit(&mut ui));
        assert_eq!(
            data.value(),
            &DataValue::Value(FiatValue::Tuple(vec![FiatValue::Int(5), FiatValue::Str("a".into())]))
        );
    }

    #[test]
    fn present_and_clipboard() {
        let data = pair();
        let value = FiatValue::Tuple(vec![FiatValue::Int(1), FiatValue::Str("a".into())]);
        assert_eq!(data.present_str_of(&DataValue::Value(value.clone())), "(1, a)");
        assert_eq!(
            data.clipboard_copy_str_of(&DataValue::Value(value)),
            Some("(1, a)".to_string())
        );
    }

    #[test]
    fn gui_options_are_saved_per_slot() {
        let mut data = pair();
        data.widget_as_mut::<TupleWidget>().unwrap().slots[1].set_expanded(false);
        let saved = data.save_gui_options_to_json();

        let mut other = pair();
        other.load_gui_options_from_json(&saved);
        assert!(!other.widget_as::<TupleWidget>().unwrap().slots()[1].is_expanded());
    }
}
