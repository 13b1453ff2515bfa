//! Widgets for `int`, `float`, `bool` and `str`.
//!
//! Each widget keeps a params struct that [`Ui`] implementations read to
//! pick the right editor, and publishes the attributes that fill it.

use std::sync::LazyLock;

use serde_json::{Value as JsonValue, json};

use crate::attributes::{AttrKind, FiatAttributes, PossibleFiatAttributes};
use crate::config::fiat_config;
use crate::error::{RegistryError, SerializationError};
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};
use crate::widget::DataWidget;

/// Serialization tag of every primitive value.
pub const PRIMITIVE_TAG: &str = "Primitive";

fn primitive_payload(json: &JsonValue) -> Result<&JsonValue, SerializationError> {
    match json.get("type").and_then(JsonValue::as_str) {
        Some(PRIMITIVE_TAG) => json
            .get("value")
            .ok_or_else(|| SerializationError::MissingKey("value".to_string())),
        Some(other) => Err(SerializationError::UnexpectedTag {
            expected: PRIMITIVE_TAG.to_string(),
            found: other.to_string(),
        }),
        None => Err(SerializationError::MissingKey("type".to_string())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────────────

/// Editor used for numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberEditType {
    /// A slider over `range`.
    Slider,
    /// A text input with +/- buttons.
    #[default]
    Input,
    /// A drag value.
    Drag,
    /// A rotary knob over `range`.
    Knob,
}

impl NumberEditType {
    /// Accepted attribute values.
    pub const NAMES: &[&str] = &["slider", "input", "drag", "knob"];

    /// Parses an attribute value.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "slider" => Some(Self::Slider),
            "input" => Some(Self::Input),
            "drag" => Some(Self::Drag),
            "knob" => Some(Self::Knob),
            _ => None,
        }
    }
}

/// Editor configuration of [`IntWidget`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntWidgetParams {
    /// Editor kind.
    pub edit_type: NumberEditType,
    /// Range of the slider and knob.
    pub range: (i64, i64),
    /// Display format, printf style.
    pub format: String,
    /// Width of the editor, in em.
    pub width_em: f64,
    /// Logarithmic slider.
    pub slider_logarithmic: bool,
    /// Forbid typing into the slider.
    pub slider_no_input: bool,
    /// Knob diameter, in em.
    pub knob_size_em: f64,
    /// Number of knob steps.
    pub knob_steps: i64,
}

impl Default for IntWidgetParams {
    fn default() -> Self {
        Self {
            edit_type: NumberEditType::Input,
            range: (0, 10),
            format: "%d".to_string(),
            width_em: 9.0,
            slider_logarithmic: false,
            slider_no_input: false,
            knob_size_em: 2.5,
            knob_steps: 10,
        }
    }
}

static INT_ATTRIBUTES: LazyLock<PossibleFiatAttributes> = LazyLock::new(|| {
    PossibleFiatAttributes::new("int")
        .add_with_default("range", AttrKind::Range, "Range of the slider or knob", (0, 10))
        .add_choice("edit_type", NumberEditType::NAMES, "Type of editor", "input")
        .add_with_default("format", AttrKind::Str, "Format string for the value", "%d")
        .add_with_default("width_em", AttrKind::Float, "Width of the editor, in em", 9.0)
        .add_with_default("slider_logarithmic", AttrKind::Bool, "Logarithmic slider", false)
        .add_with_default("slider_no_input", AttrKind::Bool, "Forbid typing into the slider", false)
        .add_with_default("knob_size_em", AttrKind::Float, "Knob diameter, in em", 2.5)
        .add_with_default("knob_steps", AttrKind::Int, "Number of knob steps", 10)
});

/// Widget for integers.
#[derive(Debug, Default)]
pub struct IntWidget {
    params: IntWidgetParams,
}

impl IntWidget {
    /// Creates a widget with default params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current editor configuration.
    #[must_use]
    pub fn params(&self) -> &IntWidgetParams {
        &self.params
    }
}

impl DataWidget for IntWidget {
    fn can_edit(&self) -> bool {
        true
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        let mut v = value.as_int()?;
        ui.edit_int("##int", &mut v, &self.params)
            .then(|| DataValue::Value(FiatValue::Int(v)))
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        let (lo, hi) = self.params.range;
        Some(FiatValue::Int(0.clamp(lo, hi.max(lo))))
    }

    fn possible_fiat_attributes(&self) -> Option<&PossibleFiatAttributes> {
        Some(&INT_ATTRIBUTES)
    }

    fn on_fiat_attributes_changed(&mut self, attrs: &FiatAttributes) -> Result<(), RegistryError> {
        let params = &mut self.params;
        if let Some((lo, hi)) = attrs.range() {
            params.range = (lo.round() as i64, hi.round() as i64);
        }
        if let Some(edit_type) = attrs.get_str("edit_type").and_then(NumberEditType::parse) {
            params.edit_type = edit_type;
        }
        if let Some(format) = attrs.get_str("format") {
            params.format = format.to_string();
        }
        if let Some(width_em) = attrs.get_float("width_em") {
            params.width_em = width_em;
        }
        if let Some(v) = attrs.get_bool("slider_logarithmic") {
            params.slider_logarithmic = v;
        }
        if let Some(v) = attrs.get_bool("slider_no_input") {
            params.slider_no_input = v;
        }
        if let Some(v) = attrs.get_float("knob_size_em") {
            params.knob_size_em = v;
        }
        if let Some(v) = attrs.get_int("knob_steps") {
            params.knob_steps = v;
        }
        Ok(())
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        match value {
            FiatValue::Int(v) => Ok(json!({"type": PRIMITIVE_TAG, "value": v})),
            other => Err(SerializationError::malformed("int", format!("got {}", other.kind_name()))),
        }
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        primitive_payload(json)?
            .as_i64()
            .map(FiatValue::Int)
            .ok_or_else(|| SerializationError::malformed("int", "value is not an integer"))
    }
}

/// Editor configuration of [`FloatWidget`].
#[derive(Debug, Clone, PartialEq)]
pub struct FloatWidgetParams {
    /// Editor kind.
    pub edit_type: NumberEditType,
    /// Range of the slider and knob.
    pub range: (f64, f64),
    /// Display format, printf style; derived from the digits when `None`.
    pub format: Option<String>,
    /// Significant digits shown.
    pub nb_significant_digits: usize,
    /// Use scientific notation.
    pub scientific_notation: bool,
    /// Width of the editor, in em.
    pub width_em: f64,
    /// Logarithmic slider.
    pub slider_logarithmic: bool,
    /// Forbid typing into the slider.
    pub slider_no_input: bool,
    /// Knob diameter, in em.
    pub knob_size_em: f64,
    /// Number of knob steps.
    pub knob_steps: i64,
}

impl Default for FloatWidgetParams {
    fn default() -> Self {
        Self {
            edit_type: NumberEditType::Input,
            range: (0.0, 10.0),
            format: None,
            nb_significant_digits: 4,
            scientific_notation: false,
            width_em: 9.0,
            slider_logarithmic: false,
            slider_no_input: false,
            knob_size_em: 2.5,
            knob_steps: 10,
        }
    }
}

impl FloatWidgetParams {
    /// Formats `value` with the configured precision.
    ///
    /// Trailing zeros are dropped: `1.5` stays `1.5`, not `1.500`.
    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        let digits = self.nb_significant_digits.max(1);
        if !value.is_finite() {
            return value.to_string();
        }
        if self.scientific_notation {
            return format!("{:.*e}", digits - 1, value);
        }
        let magnitude = if value == 0.0 {
            0
        } else {
            value.abs().log10().floor() as i64
        };
        let decimals = usize::try_from(digits as i64 - 1 - magnitude).unwrap_or(0);
        let text = format!("{value:.decimals$}");
        if text.contains('.') {
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            text
        }
    }
}

static FLOAT_ATTRIBUTES: LazyLock<PossibleFiatAttributes> = LazyLock::new(|| {
    PossibleFiatAttributes::new("float")
        .add_with_default("range", AttrKind::Range, "Range of the slider or knob", (0.0, 10.0))
        .add_choice("edit_type", NumberEditType::NAMES, "Type of editor", "input")
        .add("format", AttrKind::Str, "Format string for the value")
        .add_with_default("nb_significant_digits", AttrKind::Int, "Significant digits shown", 4)
        .add_with_default("scientific_notation", AttrKind::Bool, "Use scientific notation", false)
        .add_with_default("width_em", AttrKind::Float, "Width of the editor, in em", 9.0)
        .add_with_default("slider_logarithmic", AttrKind::Bool, "Logarithmic slider", false)
        .add_with_default("slider_no_input", AttrKind::Bool, "Forbid typing into the slider", false)
        .add_with_default("knob_size_em", AttrKind::Float, "Knob diameter, in em", 2.5)
        .add_with_default("knob_steps", AttrKind::Int, "Number of knob steps", 10)
});

/// Widget for floating point numbers.
#[derive(Debug, Default)]
pub struct FloatWidget {
    params: FloatWidgetParams,
}

impl FloatWidget {
    /// Creates a widget with default params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current editor configuration.
    #[must_use]
    pub fn params(&self) -> &FloatWidgetParams {
        &self.params
    }
}

impl DataWidget for FloatWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        value
            .as_float()
            .map_or_else(|| value.to_string(), |v| self.params.format_value(v))
    }

    fn can_edit(&self) -> bool {
        true
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        let mut v = value.as_float()?;
        ui.edit_float("##float", &mut v, &self.params)
            .then(|| DataValue::Value(FiatValue::Float(v)))
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        let (lo, hi) = self.params.range;
        Some(FiatValue::Float(0.0_f64.clamp(lo, hi.max(lo))))
    }

    fn validate(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        // Integers typed into a float field are widened.
        match value {
            FiatValue::Int(v) => Ok(FiatValue::Float(v as f64)),
            other => Ok(other),
        }
    }

    fn possible_fiat_attributes(&self) -> Option<&PossibleFiatAttributes> {
        Some(&FLOAT_ATTRIBUTES)
    }

    fn on_fiat_attributes_changed(&mut self, attrs: &FiatAttributes) -> Result<(), RegistryError> {
        let params = &mut self.params;
        if let Some(range) = attrs.range() {
            params.range = range;
        }
        if let Some(edit_type) = attrs.get_str("edit_type").and_then(NumberEditType::parse) {
            params.edit_type = edit_type;
        }
        if let Some(format) = attrs.get_str("format") {
            params.format = Some(format.to_string());
        }
        if let Some(digits) = attrs.get_int("nb_significant_digits") {
            params.nb_significant_digits = usize::try_from(digits).unwrap_or(1);
        }
        if let Some(v) = attrs.get_bool("scientific_notation") {
            params.scientific_notation = v;
        }
        if let Some(width_em) = attrs.get_float("width_em") {
            params.width_em = width_em;
        }
        if let Some(v) = attrs.get_bool("slider_logarithmic") {
            params.slider_logarithmic = v;
        }
        if let Some(v) = attrs.get_bool("slider_no_input") {
            params.slider_no_input = v;
        }
        if let Some(v) = attrs.get_float("knob_size_em") {
            params.knob_size_em = v;
        }
        if let Some(v) = attrs.get_int("knob_steps") {
            params.knob_steps = v;
        }
        Ok(())
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        match value.as_float() {
            Some(v) => Ok(json!({"type": PRIMITIVE_TAG, "value": float_to_json(v)})),
            None => Err(SerializationError::malformed("float", format!("got {}", value.kind_name()))),
        }
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        float_from_json(primitive_payload(json)?)
            .map(FiatValue::Float)
            .ok_or_else(|| SerializationError::malformed("float", "value is not a number"))
    }

    fn clipboard_copy_str(&self, value: &FiatValue) -> Option<String> {
        Some(value.to_string())
    }
}

/// JSON has no infinities nor NaN: those are written as `"inf"`, `"-inf"`
/// and `"nan"`.
fn float_to_json(v: f64) -> JsonValue {
    if v.is_nan() {
        json!("nan")
    } else if v.is_infinite() {
        json!(if v > 0.0 { "inf" } else { "-inf" })
    } else {
        json!(v)
    }
}

fn float_from_json(json: &JsonValue) -> Option<f64> {
    match json {
        JsonValue::String(s) => match s.as_str() {
            "nan" => Some(f64::NAN),
            "inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        other => other.as_f64(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bool
// ─────────────────────────────────────────────────────────────────────────────

/// Editor used for booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolEditType {
    /// A checkbox.
    #[default]
    Checkbox,
    /// A toggle switch.
    Toggle,
}

/// Editor configuration of [`BoolWidget`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoolWidgetParams {
    /// Editor kind.
    pub edit_type: BoolEditType,
}

static BOOL_ATTRIBUTES: LazyLock<PossibleFiatAttributes> = LazyLock::new(|| {
    PossibleFiatAttributes::new("bool").add_choice(
        "edit_type",
        &["checkbox", "toggle"],
        "Type of editor",
        "checkbox",
    )
});

/// Widget for booleans.
#[derive(Debug, Default)]
pub struct BoolWidget {
    params: BoolWidgetParams,
}

impl BoolWidget {
    /// Creates a widget with default params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current editor configuration.
    #[must_use]
    pub fn params(&self) -> &BoolWidgetParams {
        &self.params
    }
}

impl DataWidget for BoolWidget {
    fn can_edit(&self) -> bool {
        true
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        let mut v = value.as_bool()?;
        ui.checkbox("##bool", &mut v, &self.params)
            .then(|| DataValue::Value(FiatValue::Bool(v)))
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        Some(FiatValue::Bool(false))
    }

    fn possible_fiat_attributes(&self) -> Option<&PossibleFiatAttributes> {
        Some(&BOOL_ATTRIBUTES)
    }

    fn on_fiat_attributes_changed(&mut self, attrs: &FiatAttributes) -> Result<(), RegistryError> {
        match attrs.get_str("edit_type") {
            Some("toggle") => self.params.edit_type = BoolEditType::Toggle,
            Some("checkbox") => self.params.edit_type = BoolEditType::Checkbox,
            _ => {}
        }
        Ok(())
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        match value {
            FiatValue::Bool(v) => Ok(json!({"type": PRIMITIVE_TAG, "value": v})),
            other => Err(SerializationError::malformed("bool", format!("got {}", other.kind_name()))),
        }
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        primitive_payload(json)?
            .as_bool()
            .map(FiatValue::Bool)
            .ok_or_else(|| SerializationError::malformed("bool", "value is not a boolean"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Str
// ─────────────────────────────────────────────────────────────────────────────

/// Editor configuration of [`StrWidget`].
#[derive(Debug, Clone, PartialEq)]
pub struct StrWidgetParams {
    /// Width of the editor, in em.
    pub width_em: f64,
    /// Placeholder shown when empty.
    pub hint: String,
    /// Offer a multiline editor.
    pub allow_multiline_edit: bool,
    /// Multiline editor can be resized.
    pub resizable: bool,
    /// Wrap long lines in the multiline editor.
    pub wrap_multiline: bool,
    /// One-line summaries are truncated after this many characters.
    pub max_displayed_chars: usize,
}

impl Default for StrWidgetParams {
    fn default() -> Self {
        Self {
            width_em: 15.0,
            hint: String::new(),
            allow_multiline_edit: false,
            resizable: true,
            wrap_multiline: false,
            max_displayed_chars: fiat_config().style.str_max_displayed_chars,
        }
    }
}

static STR_ATTRIBUTES: LazyLock<PossibleFiatAttributes> = LazyLock::new(|| {
    PossibleFiatAttributes::new("str")
        .add_with_default("width_em", AttrKind::Float, "Width of the editor, in em", 15.0)
        .add_with_default("hint", AttrKind::Str, "Placeholder shown when empty", "")
        .add_with_default("allow_multiline_edit", AttrKind::Bool, "Offer a multiline editor", false)
        .add_with_default("resizable", AttrKind::Bool, "Multiline editor can be resized", true)
        .add_with_default("wrap_multiline", AttrKind::Bool, "Wrap long lines", false)
        .add("max_displayed_chars", AttrKind::Int, "Truncate summaries after this many characters")
});

/// Widget for strings.
#[derive(Debug, Default)]
pub struct StrWidget {
    params: StrWidgetParams,
}

impl StrWidget {
    /// Creates a widget with default params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current editor configuration.
    #[must_use]
    pub fn params(&self) -> &StrWidgetParams {
        &self.params
    }
}

impl DataWidget for StrWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        let Some(text) = value.as_str() else {
            return value.to_string();
        };
        let max = self.params.max_displayed_chars;
        if text.chars().count() <= max {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max).collect();
            format!("{truncated}...")
        }
    }

    fn can_edit(&self) -> bool {
        true
    }

    fn edit(&mut self, ui: &mut dyn Ui, value: &FiatValue) -> Option<DataValue> {
        let mut v = value.as_str()?.to_string();
        ui.input_text("##str", &mut v, &self.params)
            .then(|| DataValue::Value(FiatValue::Str(v)))
    }

    fn default_value(&mut self) -> Option<FiatValue> {
        Some(FiatValue::Str(String::new()))
    }

    fn possible_fiat_attributes(&self) -> Option<&PossibleFiatAttributes> {
        Some(&STR_ATTRIBUTES)
    }

    fn on_fiat_attributes_changed(&mut self, attrs: &FiatAttributes) -> Result<(), RegistryError> {
        let params = &mut self.params;
        if let Some(width_em) = attrs.get_float("width_em") {
            params.width_em = width_em;
        }
        if let Some(hint) = attrs.get_str("hint") {
            params.hint = hint.to_string();
        }
        if let Some(v) = attrs.get_bool("allow_multiline_edit") {
            params.allow_multiline_edit = v;
        }
        if let Some(v) = attrs.get_bool("resizable") {
            params.resizable = v;
        }
        if let Some(v) = attrs.get_bool("wrap_multiline") {
            params.wrap_multiline = v;
        }
        if let Some(v) = attrs.get_int("max_displayed_chars") {
            params.max_displayed_chars = usize::try_from(v).unwrap_or(0);
        }
        Ok(())
    }

    fn save_value(&self, value: &FiatValue) -> Result<JsonValue, SerializationError> {
        match value {
            FiatValue::Str(v) => Ok(json!({"type": PRIMITIVE_TAG, "value": v})),
            other => Err(SerializationError::malformed("str", format!("got {}", other.kind_name()))),
        }
    }

    fn load_value(&mut self, json: &JsonValue) -> Result<FiatValue, SerializationError> {
        primitive_payload(json)?
            .as_str()
            .map(|v| FiatValue::Str(v.to_string()))
            .ok_or_else(|| SerializationError::malformed("str", "value is not a string"))
    }

    fn clipboard_copy_str(&self, value: &FiatValue) -> Option<String> {
        value.as_str().map(str::to_string)
    }
}
