//! Graph nodes and the links between them.

use core::fmt;
use std::sync::Arc;

use fiatlight_core::ui::Ui;
use fiatlight_core::{ParamWithGui, fiat_config};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FunctionError;
use crate::function::FunctionWithGui;
use crate::worker::AsyncInvocation;

/// Unique identifier for a node in a graph.
///
/// Uses nanoid so that graphs can be merged without renumbering.
/// Internally an `Arc<str>`, so cloning only bumps a reference count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Creates a new node ID with a unique nanoid.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Creates a node ID from a specific string value.
    #[must_use]
    pub fn from_string(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// A link from output `src_output_idx` of `src` to the input `dst_input_name` of `dst`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionNodeLink {
    /// Source node.
    pub src: NodeId,
    /// Output slot of the source.
    pub src_output_idx: usize,
    /// Destination node.
    pub dst: NodeId,
    /// Parameter of the destination.
    pub dst_input_name: String,
}

impl FunctionNodeLink {
    /// Creates a link.
    pub fn new(src: NodeId, src_output_idx: usize, dst: NodeId, dst_input_name: impl Into<String>) -> Self {
        Self {
            src,
            src_output_idx,
            dst,
            dst_input_name: dst_input_name.into(),
        }
    }

    /// Whether the link touches `node`.
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.src == node || &self.dst == node
    }
}

/// Layout state of a node, persisted with the GUI options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeGuiState {
    /// Position in the node editor, if placed.
    pub position: Option<(f32, f32)>,
    /// Whether the node body is collapsed.
    pub collapsed: bool,
    /// Whether the documentation panel is shown.
    pub show_doc: bool,
    /// Whether the traceback of the last failure is expanded.
    pub show_traceback: bool,
}

/// What the user did while a node was drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeDrawOutcome {
    /// An unlinked input was edited.
    pub inputs_changed: bool,
    /// The invoke button was pressed.
    pub invoke_requested: bool,
    /// "Raise for debugger" was pressed.
    pub debug_requested: bool,
}

/// A function placed in a graph, with the links that touch it.
///
/// Link lists are maintained by the owning graph.
pub struct FunctionNode {
    id: NodeId,
    function_with_gui: FunctionWithGui,
    pub(crate) input_links: Vec<FunctionNodeLink>,
    pub(crate) output_links: Vec<FunctionNodeLink>,
    async_job: Option<AsyncInvocation>,
    inputs_changed_during_async: bool,
    gui_state: NodeGuiState,
}

impl FunctionNode {
    /// Wraps a function into an unlinked node.
    #[must_use]
    pub fn new(function_with_gui: FunctionWithGui) -> Self {
        Self {
            id: NodeId::new(),
            function_with_gui,
            input_links: Vec::new(),
            output_links: Vec::new(),
            async_job: None,
            inputs_changed_during_async: false,
            gui_state: NodeGuiState::default(),
        }
    }

    /// The node id.
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// The wrapped function.
    #[must_use]
    pub fn function_with_gui(&self) -> &FunctionWithGui {
        &self.function_with_gui
    }

    /// The wrapped function, mutably.
    pub fn function_with_gui_mut(&mut self) -> &mut FunctionWithGui {
        &mut self.function_with_gui
    }

    /// Consumes the node, returning its function.
    #[must_use]
    pub fn into_function_with_gui(self) -> FunctionWithGui {
        self.function_with_gui
    }

    /// Links feeding this node's inputs.
    #[must_use]
    pub fn input_links(&self) -> &[FunctionNodeLink] {
        &self.input_links
    }

    /// Links leaving this node's outputs.
    #[must_use]
    pub fn output_links(&self) -> &[FunctionNodeLink] {
        &self.output_links
    }

    /// Whether the input `name` is fed by a link.
    #[must_use]
    pub fn has_input_link(&self, name: &str) -> bool {
        self.input_link(name).is_some()
    }

    /// The link feeding the input `name`.
    #[must_use]
    pub fn input_link(&self, name: &str) -> Option<&FunctionNodeLink> {
        self.input_links.iter().find(|l| l.dst_input_name == name)
    }

    /// Inputs not fed by a link, in call order.
    #[must_use]
    pub fn unlinked_input_names(&self) -> Vec<&str> {
        self.function_with_gui
            .input_names()
            .into_iter()
            .filter(|name| !self.has_input_link(name))
            .collect()
    }

    /// Output slots with at least one outgoing link, ascending.
    #[must_use]
    pub fn linked_output_idxs(&self) -> Vec<usize> {
        let mut idxs: Vec<usize> = self.output_links.iter().map(|l| l.src_output_idx).collect();
        idxs.sort_unstable();
        idxs.dedup();
        idxs
    }

    /// Parameters the user may edit (those not fed by a link).
    pub fn user_editable_params(&self) -> impl Iterator<Item = &ParamWithGui> {
        self.function_with_gui
            .inputs()
            .iter()
            .filter(|p| !self.has_input_link(&p.name))
    }

    /// Layout state.
    #[must_use]
    pub fn gui_state(&self) -> &NodeGuiState {
        &self.gui_state
    }

    /// Layout state, mutably.
    pub fn gui_state_mut(&mut self) -> &mut NodeGuiState {
        &mut self.gui_state
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invocation
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether a worker thread is computing this node's outputs.
    #[must_use]
    pub fn is_running_async(&self) -> bool {
        self.async_job.is_some()
    }

    /// Invokes the function if dirty.
    ///
    /// With `allow_async`, a function flagged `invoke_async` is started on a
    /// worker thread instead; its outputs are assigned by
    /// [`poll_async`](Self::poll_async). While a call is running, a dirty
    /// node is re-invoked once the call finishes.
    ///
    /// # Errors
    ///
    /// Returns a [`FunctionError`] when a synchronous call fails and
    /// failures are not caught.
    pub fn invoke(&mut self, allow_async: bool) -> Result<(), FunctionError> {
        let function = &mut self.function_with_gui;
        if self.async_job.is_some() {
            if function.is_dirty() {
                self.inputs_changed_during_async = true;
            }
            return Ok(());
        }
        if allow_async && function.invoke_async() && function.is_dirty() {
            match function.collect_arguments() {
                Some(args) => {
                    debug!(function = %function.name(), "starting async invocation");
                    self.async_job = Some(AsyncInvocation::spawn(function.name(), function.callable(), args));
                }
                None => function.apply_missing_inputs(),
            }
            return Ok(());
        }
        function.invoke()
    }

    /// Forgets the running async call, if any; its outcome is dropped when
    /// it arrives. Returns whether a call was running.
    pub fn discard_async(&mut self) -> bool {
        self.inputs_changed_during_async = false;
        self.async_job.take().is_some()
    }

    /// Applies the outcome of a finished async call.
    ///
    /// Returns `None` while no call has finished. If inputs changed during
    /// the call, the function is dirty again afterwards.
    pub fn poll_async(&mut self) -> Option<Result<(), FunctionError>> {
        let outcome = self.async_job.as_ref()?.try_take()?;
        self.async_job = None;
        let result = self.function_with_gui.apply_outcome(outcome);
        debug!(function = %self.function_with_gui.name(), "async invocation finished");
        if core::mem::take(&mut self.inputs_changed_during_async) {
            self.function_with_gui.set_dirty();
        }
        Some(result)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    /// Draws the node: header, failure, inputs, invoke button and outputs.
    ///
    /// Linked inputs are presented, unlinked ones are editable (unless the
    /// node is running and the run configuration disables input during
    /// execution). An edit marks the function dirty; acting on it is left
    /// to the graph.
    pub fn draw(&mut self, ui: &mut dyn Ui) -> NodeDrawOutcome {
        let mut outcome = NodeDrawOutcome::default();
        let running = self.is_running_async();
        let inputs_disabled = running && fiat_config().run_config.disable_input_during_execution;
        let linked: Vec<String> = self.input_links.iter().map(|l| l.dst_input_name.clone()).collect();

        ui.push_id(self.id.as_str());
        let function = &mut self.function_with_gui;
        ui.text(function.label());
        if self.gui_state.show_doc
            && let Some(doc) = function.doc()
        {
            ui.text(doc);
        }

        if let Some(failure) = function.last_exception() {
            ui.text(&format!("Exception: {}", failure.message));
            if self.gui_state.show_traceback
                && let Some(traceback) = &failure.traceback
            {
                ui.text(traceback);
            }
            if ui.button("Raise for debugger") {
                outcome.debug_requested = true;
            }
        }

        if !self.gui_state.collapsed {
            for param in function.inputs_mut() {
                if inputs_disabled || linked.contains(&param.name) {
                    param.data_with_gui.gui_present(ui);
                } else if param.data_with_gui.gui_edit(ui) {
                    outcome.inputs_changed = true;
                }
            }
        }
        if outcome.inputs_changed {
            function.set_dirty();
        }

        if running {
            ui.text("Running...");
        } else if function.invoke_manually() && ui.button("Invoke") {
            outcome.invoke_requested = true;
        }

        if !self.gui_state.collapsed {
            for output in function.outputs_mut() {
                output.gui_present(ui);
            }
        }
        ui.pop_id();
        outcome
    }

    /// Releases the resources held by every widget.
    pub fn on_exit(&mut self) {
        self.function_with_gui.on_exit();
    }
}

impl fmt::Debug for FunctionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionNode")
            .field("id", &self.id)
            .field("function", &self.function_with_gui.name())
            .field("input_links", &self.input_links)
            .field("output_links", &self.output_links)
            .field("running_async", &self.is_running_async())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use fiatlight_core::FiatValue;
    use fiatlight_core::ui::HeadlessUi;

    use super::*;

    fn add_node() -> FunctionNode {
        let f = FunctionWithGui::builder("add", |a: i64, b: i64| a + b)
            .signature_str("add(a: int, b: int = 2) -> int")
            .build()
            .unwrap();
        FunctionNode::new(f)
    }

    #[test]
    fn node_ids_are_unique() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert_ne!(a, b);
        assert_eq!(NodeId::from_string("x").to_string(), "node_x");
    }

    #[test]
    fn unlinked_inputs_follow_links() {
        let mut node = add_node();
        let src = NodeId::new();
        node.input_links
            .push(FunctionNodeLink::new(src, 0, node.id().clone(), "a"));
        assert!(node.has_input_link("a"));
        assert_eq!(node.unlinked_input_names(), vec!["b"]);
        let editable: Vec<&str> = node.user_editable_params().map(|p| p.name.as_str()).collect();
        assert_eq!(editable, vec!["b"]);
    }

    #[test]
    fn drawing_edits_unlinked_inputs() {
        let mut node = add_node();
        node.function_with_gui_mut()
            .set_param_value("a", FiatValue::Int(1))
            .unwrap();
        node.invoke(false).unwrap();
        assert!(!node.function_with_gui().is_dirty());

        let mut ui = HeadlessUi::new();
        ui.set_int("a", 9);
        let outcome = node.draw(&mut ui);
        assert!(outcome.inputs_changed);
        assert!(node.function_with_gui().is_dirty());
        assert_eq!(
            node.function_with_gui().input("a").unwrap().data_with_gui.value().as_value(),
            Some(&FiatValue::Int(9))
        );
    }

    #[test]
    fn async_invocation_is_polled() {
        let f = FunctionWithGui::builder("slow_double", |x: i64| x * 2)
            .param_names(&["x"])
            .attributes(fiatlight_core::FiatAttributes::new().with("invoke_async", true))
            .build()
            .unwrap();
        let mut node = FunctionNode::new(f);
        node.function_with_gui_mut()
            .set_param_value("x", FiatValue::Int(21))
            .unwrap();
        node.invoke(true).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let result = loop {
            if let Some(result) = node.poll_async() {
                break result;
            }
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(std::time::Duration::from_millis(1));
        };
        result.unwrap();
        assert!(!node.is_running_async());
        assert!(!node.discard_async());
        assert_eq!(
            node.function_with_gui().output(0).unwrap().value().as_value(),
            Some(&FiatValue::Int(42))
        );
    }
}
