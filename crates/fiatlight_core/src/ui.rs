//! The rendering host interface.
//!
//! Widgets draw themselves through [`Ui`], an immediate-mode surface the
//! application provides once per frame. Fiatlight does not depend on any
//! windowing toolkit; [`HeadlessUi`] is a scripted host used for tests and
//! headless runs.

use std::collections::VecDeque;

use crate::widgets::primitives::{BoolWidgetParams, FloatWidgetParams, IntWidgetParams, StrWidgetParams};

/// Immediate-mode drawing and input calls consumed by widgets.
///
/// Every input call returns `true` when the user changed the value this frame.
pub trait Ui {
    /// Draws a line of text.
    fn text(&mut self, text: &str);

    /// Draws a button; returns `true` when clicked.
    fn button(&mut self, label: &str) -> bool;

    /// Draws a checkbox bound to `value`.
    fn checkbox(&mut self, label: &str, value: &mut bool, params: &BoolWidgetParams) -> bool;

    /// Draws a radio button; returns `true` when clicked.
    fn radio_button(&mut self, label: &str, active: bool) -> bool;

    /// Draws an integer editor (slider, input, drag or knob per `params`).
    fn edit_int(&mut self, label: &str, value: &mut i64, params: &IntWidgetParams) -> bool;

    /// Draws a float editor (slider, input, drag or knob per `params`).
    fn edit_float(&mut self, label: &str, value: &mut f64, params: &FloatWidgetParams) -> bool;

    /// Draws a text editor.
    fn input_text(&mut self, label: &str, value: &mut String, params: &StrWidgetParams) -> bool;

    /// Places the next item on the current line.
    fn same_line(&mut self) {}

    /// Attaches a tooltip to the last item.
    fn set_tooltip(&mut self, _text: &str) {}

    /// Pushes a component of the stable widget id.
    fn push_id(&mut self, id: &str);

    /// Pops the last id component.
    fn pop_id(&mut self);

    /// Requests that the popup `id` opens.
    fn open_popup(&mut self, id: &str);

    /// Begins the popup `id`; returns `true` if it is open.
    /// [`end_popup`](Ui::end_popup) must be called only when this returned `true`.
    fn begin_popup(&mut self, id: &str) -> bool;

    /// Ends the current popup.
    fn end_popup(&mut self);

    /// Closes the current popup.
    fn close_current_popup(&mut self);
}

// ─────────────────────────────────────────────────────────────────────────────
// HeadlessUi
// ─────────────────────────────────────────────────────────────────────────────

/// A scripted interaction for [`HeadlessUi`].
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Click the button with this label.
    Press(String),
    /// Type this integer in the matching integer editor.
    SetInt(String, i64),
    /// Type this float in the matching float editor.
    SetFloat(String, f64),
    /// Type this text in the matching text editor.
    SetText(String, String),
    /// Set the matching checkbox.
    SetBool(String, bool),
    /// Click the matching radio button.
    Select(String),
}

/// A host without a window: records what is drawn and replays scripted input.
///
/// An action targets a widget by key; the key matches the item label, the
/// innermost id, or the full `/`-joined id path. Each action fires once.
///
/// # Example
///
/// ```
/// use fiatlight_core::ui::{HeadlessUi, Ui};
///
/// let mut ui = HeadlessUi::new();
/// ui.press("Set default");
/// assert!(ui.button("Set default"));
/// assert!(!ui.button("Set default"));
/// ```
#[derive(Debug, Default)]
pub struct HeadlessUi {
    actions: VecDeque<UiAction>,
    id_stack: Vec<String>,
    open_popups: Vec<String>,
    transcript: Vec<String>,
}

impl HeadlessUi {
    /// Creates a host with no scripted actions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a button click.
    pub fn press(&mut self, key: impl Into<String>) {
        self.actions.push_back(UiAction::Press(key.into()));
    }

    /// Schedules an integer edit.
    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.actions.push_back(UiAction::SetInt(key.into(), value));
    }

    /// Schedules a float edit.
    pub fn set_float(&mut self, key: impl Into<String>, value: f64) {
        self.actions.push_back(UiAction::SetFloat(key.into(), value));
    }

    /// Schedules a text edit.
    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.actions
            .push_back(UiAction::SetText(key.into(), value.into()));
    }

    /// Schedules a checkbox edit.
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.actions.push_back(UiAction::SetBool(key.into(), value));
    }

    /// Schedules a radio button click.
    pub fn select(&mut self, key: impl Into<String>) {
        self.actions.push_back(UiAction::Select(key.into()));
    }

    /// Number of scripted actions not yet consumed.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    /// Everything drawn so far, one entry per item.
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Returns `true` if some drawn text contains `needle`.
    #[must_use]
    pub fn drew(&self, needle: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(needle))
    }

    /// Clears the transcript (not the scripted actions).
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    fn id_path(&self, label: &str) -> String {
        let mut path = self.id_stack.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(label);
        path
    }

    fn matches(&self, key: &str, label: &str) -> bool {
        key == label
            || self.id_stack.last().is_some_and(|id| id == key)
            || self.id_path(label) == key
    }

    /// Removes and returns the first action for which `pick` yields a value.
    fn take<T>(&mut self, label: &str, pick: impl Fn(&UiAction) -> Option<(&str, T)>) -> Option<T> {
        let position = self.actions.iter().position(|action| {
            pick(action).is_some_and(|(key, _)| self.matches(key, label))
        })?;
        let action = self.actions.remove(position)?;
        pick(&action).map(|(_, value)| value)
    }
}

impl Ui for HeadlessUi {
    fn text(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }

    fn button(&mut self, label: &str) -> bool {
        self.transcript.push(format!("[{label}]"));
        self.take(label, |action| match action {
            UiAction::Press(key) => Some((key.as_str(), ())),
            _ => None,
        })
        .is_some()
    }

    fn checkbox(&mut self, label: &str, value: &mut bool, _params: &BoolWidgetParams) -> bool {
        self.transcript.push(format!("{label}: {value}"));
        match self.take(label, |action| match action {
            UiAction::SetBool(key, v) => Some((key.as_str(), *v)),
            _ => None,
        }) {
            Some(new_value) => {
                *value = new_value;
                true
            }
            None => false,
        }
    }

    fn radio_button(&mut self, label: &str, active: bool) -> bool {
        let mark = if active { "(x)" } else { "( )" };
        self.transcript.push(format!("{mark} {label}"));
        self.take(label, |action| match action {
            UiAction::Select(key) => Some((key.as_str(), ())),
            _ => None,
        })
        .is_some()
    }

    fn edit_int(&mut self, label: &str, value: &mut i64, _params: &IntWidgetParams) -> bool {
        self.transcript.push(format!("{label}: {value}"));
        match self.take(label, |action| match action {
            UiAction::SetInt(key, v) => Some((key.as_str(), *v)),
            _ => None,
        }) {
            Some(new_value) => {
                *value = new_value;
                true
            }
            None => false,
        }
    }

    fn edit_float(&mut self, label: &str, value: &mut f64, _params: &FloatWidgetParams) -> bool {
        self.transcript.push(format!("{label}: {value}"));
        match self.take(label, |action| match action {
            UiAction::SetFloat(key, v) => Some((key.as_str(), *v)),
            _ => None,
        }) {
            Some(new_value) => {
                *value = new_value;
                true
            }
            None => false,
        }
    }

    fn input_text(&mut self, label: &str, value: &mut String, _params: &StrWidgetParams) -> bool {
        self.transcript.push(format!("{label}: {value}"));
        match self.take(label, |action| match action {
            UiAction::SetText(key, v) => Some((key.as_str(), v.clone())),
            _ => None,
        }) {
            Some(new_value) => {
                *value = new_value;
                true
            }
            None => false,
        }
    }

    fn push_id(&mut self, id: &str) {
        self.id_stack.push(id.to_string());
    }

    fn pop_id(&mut self) {
        self.id_stack.pop();
    }

    fn open_popup(&mut self, id: &str) {
        let path = self.id_path(id);
        if !self.open_popups.contains(&path) {
            self.open_popups.push(path);
        }
    }

    fn begin_popup(&mut self, id: &str) -> bool {
        let path = self.id_path(id);
        let open = self.open_popups.contains(&path);
        if open {
            self.id_stack.push(id.to_string());
        }
        open
    }

    fn end_popup(&mut self) {
        self.id_stack.pop();
    }

    fn close_current_popup(&mut self) {
        // The innermost id is the popup itself while inside begin/end.
        if let Some(id) = self.id_stack.pop() {
            let path = self.id_path(&id);
            self.open_popups.retain(|p| *p != path);
            self.id_stack.push(id);
        }
    }
}
