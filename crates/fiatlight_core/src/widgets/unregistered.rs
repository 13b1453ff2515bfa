//! Placeholder for types the registry cannot handle.

use crate::ui::Ui;
use crate::value::FiatValue;
use crate::widget::DataWidget;

/// Shows the typename and refuses to edit.
#[derive(Debug, Clone)]
pub struct UnregisteredWidget {
    typename: String,
}

impl UnregisteredWidget {
    /// Creates a placeholder for `typename`.
    pub fn new(typename: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
        }
    }

    /// The type nobody registered.
    #[must_use]
    pub fn typename(&self) -> &str {
        &self.typename
    }
}

impl DataWidget for UnregisteredWidget {
    fn present_str(&self, value: &FiatValue) -> String {
        format!("{value} (unregistered type {})", self.typename)
    }

    fn present(&mut self, ui: &mut dyn Ui, value: &FiatValue) {
        ui.text(&format!("Unregistered type: {}", self.typename));
        ui.text(&value.to_string());
    }

    fn has_custom_present(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AnyDataWithGui;
    use crate::schema::TypeSpec;
    use crate::ui::HeadlessUi;

    #[test]
    fn refuses_to_edit_and_has_no_default() {
        let spec = TypeSpec::Custom("app::Opaque".into());
        let mut data = AnyDataWithGui::new(spec, UnregisteredWidget::new("app::Opaque"));
        assert!(!data.can_edit());
        assert!(!data.can_construct_default_value());

        let mut ui = HeadlessUi::new();
        ui.press("Set default");
        assert!(!data.gui_edit(&mut ui));
        assert!(data.value().is_unspecified());
    }

    #[test]
    fn presents_the_typename() {
        let mut data = AnyDataWithGui::new(TypeSpec::Custom("app::Opaque".into()), UnregisteredWidget::new("app::Opaque"));
        data.set_value(FiatValue::Int(3));
        let mut ui = HeadlessUi::new();
        data.gui_present(&mut ui);
        assert!(ui.drew("Unregistered type: app::Opaque"));
    }
}
