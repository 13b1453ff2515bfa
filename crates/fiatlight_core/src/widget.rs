//! The behavior table every widget kind implements.

use downcast_rs::{Downcast, impl_downcast};
use serde_json::Value as JsonValue;

use crate::attributes::{FiatAttributes, PossibleFiatAttributes};
use crate::error::{RegistryError, SerializationError};
use crate::ui::Ui;
use crate::value::{DataValue, FiatValue};

/// Whether a query concerns the presentation or the editor of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOrEdit {
    /// Read-only presentation.
    Present,
    /// Interactive editor.
    Edit,
}

/// Action applied to all sub-items of a composite widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseOrExpand {
    /// Collapse every sub-item.
    Collapse,
    /// Expand every sub-item.
    Expand,
}

/// Behavior of one widget kind.
///
/// Every method receives an already concrete value: the state machine
/// around `Unspecified`, `Error` and `Invalid` lives in
/// [`AnyDataWithGui`](crate::AnyDataWithGui). All methods except
/// [`present_str`](DataWidget::present_str) have defaults.
pub trait DataWidget: Downcast + Send {
    /// One-line summary of a value.
    fn present_str(&self, value: &FiatValue) -> String {
        value.to_string()
    }

    /// Multi-line presentation. Defaults to the one-line summary.
    fn present(&mut self, ui: &mut dyn Ui, value: &FiatValue) {
        ui.text(&self.present_str(value));
    }

    /// Whether [`present`](DataWidget::present) is customized.
    fn has_custom_present(&self) -> bool {
        false
    }

    /// Whether this widget can edit values.
    fn can_edit(&self) -> bool {
        false
    }

    /// Draws the editor; returns the new value when the user changed it.
    ///
    /// Composite widgets may return [`DataValue::Invalid`] when one of
    /// their children holds an invalid value.
    fn edit(&mut self, _ui: &mut dyn Ui, _value: &FiatValue) -> Option<DataValue> {
        None
    }

    /// Produces a default value (`Unspecified → create`).
    fn default_value(&mut self) -> Option<FiatValue> {
        None
    }

    /// Intrinsic validation, run before user validators.
    fn validate(&mut self, value: FiatValue) -> Result<FiatValue, String> {
        Ok(value)
    }

    /// Called after a valid value was assigned.
    fn on_change(&mut self, _value: &FiatValue) {}

    /// Called every frame; returns `true` if the value needs to be refreshed.
    fn on_heartbeat(&mut self) -> bool {
        false
    }

    /// Releases resources held by the widget.
    fn on_exit(&mut self) {}

    /// Attributes this widget understands; `None` skips attribute validation.
    fn possible_fiat_attributes(&self) -> Option<&PossibleFiatAttributes> {
        None
    }

    /// Reconfigures the widget from the full attribute set.
    fn on_fiat_attributes_changed(&mut self, _attrs: &FiatAttributes) -> Result<(), RegistryError> {
        Ok(())
    }

    /// Serializes a concrete value as `{"type": <tag>, ...}`.
    fn save_value(&self, _value: &FiatValue) -> Result<JsonValue, SerializationError> {
        Err(SerializationError::NotSerializable {
            typename: core::any::type_name::<Self>().to_string(),
        })
    }

    /// Deserializes a value saved by [`save_value`](DataWidget::save_value).
    fn load_value(&mut self, _json: &JsonValue) -> Result<FiatValue, SerializationError> {
        Err(SerializationError::NotSerializable {
            typename: core::any::type_name::<Self>().to_string(),
        })
    }

    /// Layout state independent of the value.
    fn save_gui_options(&self) -> JsonValue {
        JsonValue::Null
    }

    /// Restores layout state saved by [`save_gui_options`](DataWidget::save_gui_options).
    fn load_gui_options(&mut self, _json: &JsonValue) {}

    /// Text copied to the clipboard, or `None` if copying is not offered.
    fn clipboard_copy_str(&self, value: &FiatValue) -> Option<String> {
        Some(self.present_str(value))
    }

    /// Whether the presentation can be collapsed.
    fn present_collapsible(&self) -> bool {
        false
    }

    /// Whether the editor can be collapsed.
    fn edit_collapsible(&self) -> bool {
        false
    }

    /// Whether the presentation fits in a node.
    fn present_node_compatible(&self) -> bool {
        true
    }

    /// Whether the editor fits in a node.
    fn edit_node_compatible(&self) -> bool {
        true
    }

    /// Whether some sub-item can collapse.
    fn sub_items_can_collapse(&self, _mode: PresentOrEdit) -> bool {
        false
    }

    /// What "collapse all / expand all" would do next.
    fn sub_items_will_collapse_or_expand(&self, _mode: PresentOrEdit) -> CollapseOrExpand {
        CollapseOrExpand::Expand
    }

    /// Collapses or expands every sub-item, recursively.
    fn sub_items_collapse_or_expand(&mut self, _action: CollapseOrExpand) {}
}

impl_downcast!(DataWidget);
