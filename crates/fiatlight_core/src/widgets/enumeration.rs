//! Enums with unit variants: one radio button per variant.

use serde_json::{Value as JsonValue, json};

use crate::error::{SerializationError, ValueError};
use crate::schema::EnumSpec;
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};
use crate::widget::DataWidget;

/// Serialization tag of enum values.
pub const ENUM_TAG: &str = "Enum";

/// Labels shorter than this (in total) fit on one line.
const SINGLE_LINE_MAX_CHARS: usize = 50;

/// Widget for enums.
///
/// Saved as `{"type": "Enum", "class": <class>, "value_name": <variant>}`.
#[derive(Debug, Clone)]
pub struct EnumWidget {
    spec: EnumSpec,
}

impl EnumWidget {
    /// Creates a widget for the variants of `spec`.
    #[must_use]
    pub fn new(spec: EnumSpec) -> Self {
        Self { spec }
    }

    /// The enum description.
    #[must_use]
    pub fn spec(&self) -> &EnumSpec {
        &self.spec
    }

    fn variant_name<'a>(&self, value: &'a FiatValue) -> Option<&'a str> {
        match value {
            FiatValue::Enum { class, variant } if class == self.spec.class_name() => Some(variant),
            _ => None,
        }
    }

    fn single_line(&self) -> bool {
        let total: usize = self
            .spec
            .variants
            .iter()
            .map(|v| v.display_label().chars().count())
            .sum();
        total < SINGLE_LINE_MAX_CHARS
    }
}

impl DataWidget for EnumWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        let Some(name) = self.variant_name(value) else {
            return value.to_string();
        };
        self.spec
            .variants
            .iter()
            .find(|v| v.name == name)
            .map_or_else(|| name.to_string(), |v| v.display_label().to_string())
    }

    fn can_edit(&self) -> bool {
        !self.spec.variants.is_empty()
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        let current = self.variant_name(value);
        let single_line = self.single_line();
        let two_columns = !single_line && self.spec.variants.len() >= 3;

        let mut selected = None;
        for (i, variant) in self.spec.variants.iter().enumerate() {
            let same_line = if single_line { i > 0 } else { two_columns && i % 2 == 1 };
            if same_line {
                ui.same_line();
            }
            let active = current == Some(variant.name.as_str());
            if ui.radio_button(variant.display_label(), active) && !active {
                selected = Some(variant.name.clone());
            }
            if let Some(tooltip) = &variant.tooltip {
                ui.set_tooltip(tooltip);
            }
        }
        selected.map(|name| DataValue::Value(FiatValue::variant(self.spec.class_name(), name)))
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        self.spec
            .variants
            .first()
            .map(|v| FiatValue::variant(self.spec.class_name(), v.name.clone()))
    }

    fn validate(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        let Some(name) = self.variant_name(&value) else {
            return Err(format!("expected a {} value, got {value}", self.spec.class_name()));
        };
        if self.spec.variants.iter().any(|v| v.name == name) {
            Ok(value)
        } else {
            Err(ValueError::UnknownVariant {
                class: self.spec.class_name().to_string(),
                variant: name.to_string(),
            }
            .to_string())
        }
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        let name = self
            .variant_name(value)
            .ok_or_else(|| SerializationError::malformed("enum", format!("got {value}")))?;
        Ok(json!({"type": ENUM_TAG, "class": self.spec.class_name(), "value_name": name}))
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        let tag = json.get("type").and_then(JsonValue::as_str).unwrap_or_default();
        if tag != ENUM_TAG {
            return Err(SerializationError::UnexpectedTag {
                expected: ENUM_TAG.to_string(),
                found: tag.to_string(),
            });
        }
        let class = json
            .get("class")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| SerializationError::MissingKey("class".to_string()))?;
        if class != self.spec.class_name() {
            return Err(SerializationError::EnumClassMismatch {
                expected: self.spec.class_name().to_string(),
                found: class.to_string(),
            });
        }
        let name = json
            .get("value_name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| SerializationError::MissingKey("value_name".to_string()))?;
        if !self.spec.variants.iter().any(|v| v.name == name) {
            return Err(ValueError::UnknownVariant {
                class: class.to_string(),
                variant: name.to_string(),
            }
            .into());
        }
        Ok(FiatValue::variant(class, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AnyDataWithGui;
    use crate::schema::{EnumVariantSpec, TypeSpec};
    use crate::ui::HeadlessUi;

    fn color_spec() -> EnumSpec {
        EnumSpec {
            typename: "app::Color".into(),
            variants: vec![
                EnumVariantSpec::new("Red"),
                EnumVariantSpec {
                    label: Some("Green (default)".into()),
                    tooltip: Some("The color of grass".into()),
                    ..EnumVariantSpec::new("Green")
                },
                EnumVariantSpec::new("Blue"),
            ],
        }
    }

    fn color() -> AnyDataWithGui {
        let spec = color_spec();
        AnyDataWithGui::new(TypeSpec::Enum(spec.clone()), EnumWidget::new(spec))
    }

    #[test]
    fn radio_selection_changes_the_variant() {
        let mut data = color();
        data.set_value(FiatValue::variant("Color", "Red"));

        let mut ui = HeadlessUi::new();
        ui.select("Green (default)");
        assert!(data.gui_edit(&mut ui));
        assert_eq!(data.value(), &DataValue::Value(FiatValue::variant("Color", "Green")));
        assert_eq!(data.present_str(), "Green (default)");
    }

    #[test]
    fn round_trip_checks_the_class() {
        let mut data = color();
        let value = DataValue::Value(FiatValue::variant("Color", "Blue"));
        let saved = data.save_to_dict(&value);
        assert_eq!(saved, json!({"type": "Enum", "class": "Color", "value_name": "Blue"}));
        assert_eq!(data.load_from_dict(&saved).unwrap(), value);

        let foreign = json!({"type": "Enum", "class": "Shape", "value_name": "Blue"});
        assert!(matches!(
            data.load_from_dict(&foreign),
            Err(SerializationError::EnumClassMismatch { .. })
        ));
    }

    #[test]
    fn unknown_variants_are_invalid() {
        let mut data = color();
        data.set_value(FiatValue::variant("Color", "Purple"));
        assert!(data.value().is_invalid());
        assert_eq!(data.construct_default_value(), Some(FiatValue::variant("Color", "Red")));
    }
}
