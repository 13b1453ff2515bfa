//! Records (structs with named fields): one parameter widget per field.
//!
//! The same implementation serves plain data records and validated models;
//! they differ only by their serialization tag and by the model validator.

use serde_json::{Map as JsonMap, Value as JsonValue, json};

use crate::error::{SerializationError, ValueError};
use crate::param::ParamWithGui;
use crate::schema::{RecordKind, RecordSpec};
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};
use crate::widget::{CollapseOrExpand, DataWidget, PresentOrEdit};
use crate::widgets::tuple::{collapse_or_expand, collapsible, will_collapse_or_expand};

/// Serialization tag of plain data records.
pub const DATACLASS_TAG: &str = "Dataclass";

/// Serialization tag of validated models.
pub const MODEL_TAG: &str = "Pydantic";

/// Widget for records.
#[derive(Debug)]
pub struct RecordWidget {
    spec: RecordSpec,
    fields: Vec<ParamWithGui>,
}

impl RecordWidget {
    /// Creates a record widget from one parameter per field, in declaration order.
    #[must_use]
    pub fn new(spec: RecordSpec, fields: Vec<ParamWithGui>) -> Self {
        Self { spec, fields }
    }

    /// The record description.
    #[must_use]
    pub fn spec(&self) -> &RecordSpec {
        &self.spec
    }

    /// The field parameters.
    #[must_use]
    pub fn fields(&self) -> &[ParamWithGui] {
        &self.fields
    }

    /// The parameter of field `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ParamWithGui> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The parameter of field `name`, mutably.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut ParamWithGui> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    fn tag(&self) -> &'static str {
        match self.spec.kind {
            RecordKind::Dataclass => DATACLASS_TAG,
            RecordKind::Model => MODEL_TAG,
        }
    }

    fn basename(&self) -> &str {
        self.spec
            .typename
            .rsplit("::")
            .next()
            .unwrap_or(&self.spec.typename)
    }

    /// Pushes the record's field values down to the children.
    ///
    /// A child whose invalid input equals the mirrored value stays invalid.
    fn mirror(&mut self, value: &FiatValue) {
        for field in &mut self.fields {
            let Some(v) = value.field(&field.name) else {
                field.data_with_gui.store_value(DataValue::Unspecified);
                continue;
            };
            if matches!(field.data_with_gui.value(), DataValue::Invalid { value: rejected, .. } if rejected == v) {
                continue;
            }
            field.data_with_gui.store_value(DataValue::Value(v.clone()));
        }
    }

    fn build(&self, fields: impl IntoIterator<Item = (String, FiatValue)>) -> FiatValue {
        FiatValue::record(self.spec.typename.clone(), fields)
    }

    /// Synthesizes the record from the children after an edit.
    ///
    /// Returns `None` when some field has no value at all.
    fn synthesize(&self) -> Option<DataValue> {
        let mut values = Vec::with_capacity(self.fields.len());
        let mut messages = Vec::new();
        for field in &self.fields {
            match field.get_value_or_default() {
                DataValue::Value(v) => values.push((field.name.clone(), v)),
                DataValue::Invalid { value, message } => {
                    values.push((field.name.clone(), value));
                    messages.push(format!("{}: {message}", field.name));
                }
                DataValue::Unspecified | DataValue::Error => return None,
            }
        }
        let record = self.build(values);
        if messages.is_empty() {
            Some(DataValue::Value(record))
        } else {
            Some(DataValue::invalid(record, messages.join("; ")))
        }
    }

    fn field_strs(
        &self,
        value: &FiatValue,
        present: impl Fn(&ParamWithGui, &FiatValue) -> Option<String>,
    ) -> Option<Vec<String>> {
        self.fields
            .iter()
            .map(|field| {
                let v = value.field(&field.name)?;
                present(field, v).map(|s| format!("{}: {s}", field.name))
            })
            .collect()
    }
}

impl DataWidget for RecordWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        let parts = self.field_strs(value, |field, v| {
            Some(field.data_with_gui.present_str_of(&DataValue::Value(v.clone())))
        });
        match parts {
            Some(parts) => format!("{} {{ {} }}", self.basename(), parts.join(", ")),
            None => value.to_string(),
        }
    }

    fn present(&mut self, ui: &mut dyn Ui, value: &FiatValue) {
        self.mirror(value);
        for field in &mut self.fields {
            field.data_with_gui.gui_present(ui);
        }
    }

    fn has_custom_present(&self) -> bool {
        true
    }

    fn can_edit(&self) -> bool {
        self.fields.iter().all(|f| f.data_with_gui.can_edit())
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        self.mirror(value);
        let mut changed = false;
        for field in &mut self.fields {
            changed |= field.data_with_gui.gui_edit(ui);
        }
        if changed { self.synthesize() } else { None }
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        let mut values = Vec::with_capacity(self.fields.len());
        for (field_spec, field) in self.spec.fields.iter().zip(&mut self.fields) {
            let v = match &field_spec.default {
                Some(default) => default.produce(),
                None => field.data_with_gui.construct_default_value()?,
            };
            values.push((field.name.clone(), v));
        }
        Some(self.build(values))
    }

    /// Validates every field through its own widget, then runs the model
    /// validator on the assembled record.
    ///
    /// Offending children are marked `Invalid` so the editor shows them.
    fn validate(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        let fields = match value {
            FiatValue::Record { typename, fields } if typename == self.spec.typename => fields,
            other => return Err(format!("expected a {} record, got {other}", self.basename())),
        };

        let mut messages = Vec::new();
        let mut validated = Vec::with_capacity(self.fields.len());
        for field in &mut self.fields {
            let Some(v) = fields.get(&field.name) else {
                messages.push(format!("{}: Field required", field.name));
                continue;
            };
            match field.data_with_gui.validate_value(v.clone()) {
                Ok(adjusted) => validated.push((field.name.clone(), adjusted)),
                Err(message) => {
                    field
                        .data_with_gui
                        .store_value(DataValue::invalid(v.clone(), message.clone()));
                    messages.push(format!("{}: {message}", field.name));
                    validated.push((field.name.clone(), v.clone()));
                }
            }
        }
        if !messages.is_empty() {
            return Err(messages.join("; "));
        }

        let record = self.build(validated);
        match &self.spec.model_validator {
            Some(validator) => validator(&record),
            None => Ok(record),
        }
    }

    fn on_heartbeat(&mut self) -> bool {
        self.fields
            .iter_mut()
            .fold(false, |changed, f| f.data_with_gui.on_heartbeat() || changed)
    }

    fn on_exit(&mut self) {
        for field in &mut self.fields {
            field.data_with_gui.on_exit();
        }
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        let mut payload = JsonMap::new();
        for field in &self.fields {
            let v = value.field(&field.name).ok_or_else(|| {
                SerializationError::malformed("record", format!("missing field `{}`", field.name))
            })?;
            payload.insert(
                field.name.clone(),
                field.data_with_gui.save_to_dict(&DataValue::Value(v.clone())),
            );
        }
        Ok(json!({"type": self.tag(), "value": payload}))
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        let tag = json.get("type").and_then(JsonValue::as_str).unwrap_or_default();
        if tag != self.tag() {
            return Err(SerializationError::UnexpectedTag {
                expected: self.tag().to_string(),
                found: tag.to_string(),
            });
        }
        let payload = json
            .get("value")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| SerializationError::malformed("record", "value is not an object"))?;

        let mut values = Vec::with_capacity(self.fields.len());
        for (field_spec, field) in self.spec.fields.iter().zip(&mut self.fields) {
            let loaded = match payload.get(&field.name) {
                Some(saved) => field.data_with_gui.load_from_dict(saved)?,
                None => DataValue::Unspecified,
            };
            let v = match loaded {
                DataValue::Value(v) => v,
                _ => match &field_spec.default {
                    Some(default) => default.produce(),
                    None => {
                        return Err(SerializationError::Value(ValueError::MissingField {
                            typename: self.spec.typename.clone(),
                            field: field.name.clone(),
                        }));
                    }
                },
            };
            values.push((field.name.clone(), v));
        }
        Ok(self.build(values))
    }

    fn save_gui_options(&self) -> JsonValue {
        let fields: JsonMap<String, JsonValue> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.save_gui_options_to_json()))
            .collect();
        json!({"fields": fields})
    }

    fn load_gui_options(&mut self, json: &JsonValue) {
        let Some(saved) = json.get("fields").and_then(JsonValue::as_object) else {
            return;
        };
        for field in &mut self.fields {
            if let Some(options) = saved.get(&field.name) {
                field.load_gui_options_from_json(options);
            }
        }
    }

    fn clipboard_copy_str(&self, value: &FiatValue) -> Option<String> {
        let parts = self.field_strs(value, |field, v| {
            field
                .data_with_gui
                .clipboard_copy_str_of(&DataValue::Value(v.clone()))
        })?;
        Some(format!("{{{}}}", parts.join(", ")))
    }

    fn present_collapsible(&self) -> bool {
        true
    }

    fn edit_collapsible(&self) -> bool {
        true
    }

    fn edit_node_compatible(&self) -> bool {
        self.fields
            .iter()
            .all(|f| f.data_with_gui.edit_node_compatible())
    }

    fn sub_items_can_collapse(&self, mode: PresentOrEdit) -> bool {
        self.fields
            .iter()
            .any(|f| collapsible(&f.data_with_gui, mode))
    }

    fn sub_items_will_collapse_or_expand(&self, mode: PresentOrEdit) -> CollapseOrExpand {
        will_collapse_or_expand(self.fields.iter().map(|f| &f.data_with_gui), mode)
    }

    fn sub_items_collapse_or_expand(&mut self, action: CollapseOrExpand) {
        for field in &mut self.fields {
            collapse_or_expand(&mut field.data_with_gui, action);
        }
    }
}
