//! Named parameters: a widget plus a calling convention and a default.

use serde_json::Value as JsonValue;

use crate::data::AnyDataWithGui;
use crate::value::DataValue;

/// How a parameter may be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamKind {
    /// Positional only (before `/` in a signature).
    PositionalOnly,
    /// Positional or keyword.
    #[default]
    PositionalOrKeyword,
    /// Keyword only (after `*` in a signature).
    KeywordOnly,
}

/// A function parameter, or a record field.
#[derive(Debug)]
pub struct ParamWithGui {
    /// Parameter name.
    pub name: String,
    /// Widget holding the user-provided value.
    pub data_with_gui: AnyDataWithGui,
    /// Calling convention.
    pub param_kind: ParamKind,
    /// Value used when the widget holds none.
    pub default_value: DataValue,
}

impl ParamWithGui {
    /// Creates a parameter. The widget is labelled with `name` unless it already has a label.
    pub fn new(
        name: impl Into<String>,
        mut data_with_gui: AnyDataWithGui,
        param_kind: ParamKind,
        default_value: DataValue,
    ) -> Self {
        let name = name.into();
        if data_with_gui.label().is_none() {
            data_with_gui.set_label(name.clone());
        }
        Self {
            name,
            data_with_gui,
            param_kind,
            default_value,
        }
    }

    /// The value passed to the function.
    ///
    /// | widget value | result |
    /// |---|---|
    /// | `Error` | `Error` |
    /// | `Unspecified` | the default if it is concrete, else `Unspecified` |
    /// | `Invalid` | `Invalid` |
    /// | a value | the value |
    #[must_use]
    pub fn get_value_or_default(&self) -> DataValue {
        match self.data_with_gui.value() {
            DataValue::Unspecified => match &self.default_value {
                DataValue::Value(v) => DataValue::Value(v.clone()),
                _ => DataValue::Unspecified,
            },
            other => other.clone(),
        }
    }

    /// Whether a concrete default exists.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default_value.is_valid()
    }

    /// Layout state of the widget.
    #[must_use]
    pub fn save_gui_options_to_json(&self) -> JsonValue {
        self.data_with_gui.save_gui_options_to_json()
    }

    /// Restores layout state.
    pub fn load_gui_options_from_json(&mut self, json: &JsonValue) {
        self.data_with_gui.load_gui_options_from_json(json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeSpec;
    use crate::value::FiatValue;
    use crate::widgets::primitives::IntWidget;

    fn param(default_value: DataValue) -> ParamWithGui {
        let data = AnyDataWithGui::new(TypeSpec::Int, IntWidget::new());
        ParamWithGui::new("b", data, ParamKind::PositionalOrKeyword, default_value)
    }

    #[test]
    fn default_fills_unspecified_only() {
        let mut p = param(DataValue::Value(FiatValue::Int(2)));
        assert_eq!(p.data_with_gui.label(), Some("b"));
        assert_eq!(p.get_value_or_default(), DataValue::Value(FiatValue::Int(2)));

        p.data_with_gui.set_value(FiatValue::Int(7));
        assert_eq!(p.get_value_or_default(), DataValue::Value(FiatValue::Int(7)));

        p.data_with_gui.set_value(DataValue::Error);
        assert_eq!(p.get_value_or_default(), DataValue::Error);
    }

    #[test]
    fn no_default_stays_unspecified() {
        let p = param(DataValue::Unspecified);
        assert!(!p.has_default());
        assert_eq!(p.get_value_or_default(), DataValue::Unspecified);
    }
}
