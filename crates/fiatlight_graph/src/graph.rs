//! [`FunctionsGraph`]: an acyclic graph of function nodes.
//!
//! Links carry values from an output of one node to an input of another.
//! Editing an input (or receiving a new value through a link) marks a node
//! dirty and, unless it is manual, invokes it; its outputs then flow to
//! every downstream node before the call returns.

use std::collections::BTreeSet;

use fiatlight_core::ui::Ui;
use fiatlight_core::{DataValue, catch_function_exceptions, set_catch_function_exceptions};
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::error::{FunctionError, GraphError};
use crate::function::FunctionWithGui;
use crate::node::{FunctionNode, FunctionNodeLink, NodeId};

/// A directed acyclic graph of [`FunctionNode`]s.
///
/// Each input is fed by at most one link. Nodes are addressed by
/// [`NodeId`] or by their unique name: the function name, suffixed with
/// `_1`, `_2`, ... in insertion order when several nodes share it.
///
/// # Example
///
/// ```
/// use fiatlight_core::FiatValue;
/// use fiatlight_graph::{FunctionWithGui, FunctionsGraph};
///
/// let add = FunctionWithGui::builder("add", |a: i64, b: i64| a + b)
///     .signature_str("add(a: int, b: int = 2) -> int")
///     .build()
///     .unwrap();
/// let mul2 = FunctionWithGui::builder("mul2", |a: i64| a * 2)
///     .param_names(&["a"])
///     .build()
///     .unwrap();
///
/// let mut graph = FunctionsGraph::from_function_composition(vec![add, mul2]);
/// graph.set_param_value("add", "a", FiatValue::Int(3)).unwrap();
/// graph.invoke_all().unwrap();
///
/// let mul2 = graph.function_with_gui_by_unique_name("mul2").unwrap();
/// assert_eq!(mul2.output(0).unwrap().value().as_value(), Some(&FiatValue::Int(10)));
/// ```
#[derive(Debug, Default)]
pub struct FunctionsGraph {
    nodes: Vec<FunctionNode>,
    links: Vec<FunctionNodeLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl FunctionsGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chain `f1.out[0] -> f2.in[0] -> ...`.
    ///
    /// A step is left unlinked when the first function has no output or
    /// the second has no input. Nothing is invoked.
    #[must_use]
    pub fn from_function_composition(functions: Vec<FunctionWithGui>) -> Self {
        let mut graph = Self::new();
        graph.add_function_composition(functions);
        graph
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Nodes, in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[FunctionNode] {
        &self.nodes
    }

    /// Links, in insertion order.
    #[must_use]
    pub fn links(&self) -> &[FunctionNodeLink] {
        &self.links
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node with this id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&FunctionNode> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    /// The node with this id, mutably.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut FunctionNode> {
        self.index_of(id).map(|idx| &mut self.nodes[idx])
    }

    fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    fn require(&self, id: &NodeId) -> Result<usize, GraphError> {
        self.index_of(id).ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Unique names
    // ─────────────────────────────────────────────────────────────────────────

    /// Unique names of every node, in insertion order.
    #[must_use]
    pub fn unique_names(&self) -> Vec<String> {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for node in &self.nodes {
            *totals.entry(node.function_with_gui().name()).or_default() += 1;
        }
        let mut seen: HashMap<&str, usize> = HashMap::new();
        self.nodes
            .iter()
            .map(|node| {
                let name = node.function_with_gui().name();
                if totals.get(name).copied().unwrap_or(0) > 1 {
                    let rank = seen.entry(name).or_default();
                    *rank += 1;
                    format!("{name}_{rank}")
                } else {
                    name.to_string()
                }
            })
            .collect()
    }

    /// The unique name of a node.
    #[must_use]
    pub fn function_node_unique_name(&self, id: &NodeId) -> Option<String> {
        let idx = self.index_of(id)?;
        self.unique_names().into_iter().nth(idx)
    }

    fn index_by_unique_name(&self, unique_name: &str) -> Option<usize> {
        self.unique_names().iter().position(|n| n == unique_name)
    }

    fn require_unique_name(&self, unique_name: &str) -> Result<usize, GraphError> {
        self.index_by_unique_name(unique_name)
            .ok_or_else(|| GraphError::UnknownFunction(unique_name.to_string()))
    }

    /// The node with this unique name.
    #[must_use]
    pub fn node_by_unique_name(&self, unique_name: &str) -> Option<&FunctionNode> {
        self.index_by_unique_name(unique_name).map(|idx| &self.nodes[idx])
    }

    /// The node with this unique name, mutably.
    pub fn node_by_unique_name_mut(&mut self, unique_name: &str) -> Option<&mut FunctionNode> {
        let idx = self.index_by_unique_name(unique_name)?;
        Some(&mut self.nodes[idx])
    }

    /// The function of the node with this unique name.
    #[must_use]
    pub fn function_with_gui_by_unique_name(&self, unique_name: &str) -> Option<&FunctionWithGui> {
        self.node_by_unique_name(unique_name)
            .map(FunctionNode::function_with_gui)
    }

    /// The function of the node with this unique name, mutably.
    pub fn function_with_gui_by_unique_name_mut(&mut self, unique_name: &str) -> Option<&mut FunctionWithGui> {
        let idx = self.index_by_unique_name(unique_name)?;
        Some(self.nodes[idx].function_with_gui_mut())
    }

    /// `"linked to <src unique name> (output <i>)"` for a linked input.
    #[must_use]
    pub fn input_link_info(&self, id: &NodeId, input_name: &str) -> Option<String> {
        let link = self.node(id)?.input_link(input_name)?;
        let src_name = self.function_node_unique_name(&link.src)?;
        Some(format!("linked to {src_name} (output {})", link.src_output_idx))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds an unlinked node.
    pub fn add_function(&mut self, function: FunctionWithGui) -> NodeId {
        let node = FunctionNode::new(function);
        let id = node.id().clone();
        debug!(node = %id, function = %node.function_with_gui().name(), "function added");
        self.nodes.push(node);
        id
    }

    /// Appends a chain `f1.out[0] -> f2.in[0] -> ...` to the graph.
    ///
    /// Returns the ids of the new nodes.
    pub fn add_function_composition(&mut self, functions: Vec<FunctionWithGui>) -> Vec<NodeId> {
        let ids: Vec<NodeId> = functions
            .into_iter()
            .map(|f| self.add_function(f))
            .collect();
        for pair in ids.windows(2) {
            let [src, dst] = pair else { continue };
            let (Some(src_idx), Some(dst_idx)) = (self.index_of(src), self.index_of(dst)) else {
                continue;
            };
            if self.nodes[src_idx].function_with_gui().nb_outputs() == 0 {
                continue;
            }
            let Some(dst_input) = self.nodes[dst_idx]
                .function_with_gui()
                .input_names()
                .first()
                .map(|name| (*name).to_string())
            else {
                continue;
            };
            self.insert_link(FunctionNodeLink::new(src.clone(), 0, dst.clone(), dst_input));
        }
        ids
    }

    /// Moves every node and link of `other` into this graph.
    pub fn merge_graph(&mut self, other: FunctionsGraph) {
        self.nodes.extend(other.nodes);
        self.links.extend(other.links);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────

    /// Links an output of `src` to an input of `dst`, by unique names.
    ///
    /// Without `dst_input_name`, the first input of `dst` is used.
    ///
    /// # Errors
    ///
    /// See [`add_link_by_id`](Self::add_link_by_id).
    pub fn add_link(
        &mut self,
        src_unique_name: &str,
        dst_unique_name: &str,
        dst_input_name: Option<&str>,
        src_output_idx: usize,
    ) -> Result<(), GraphError> {
        let src_idx = self.require_unique_name(src_unique_name)?;
        let dst_idx = self.require_unique_name(dst_unique_name)?;
        let src = self.nodes[src_idx].id().clone();
        let dst = self.nodes[dst_idx].id().clone();
        self.add_link_by_id(&src, src_output_idx, &dst, dst_input_name)
    }

    /// Links output `src_output_idx` of `src` to an input of `dst`.
    ///
    /// Once accepted, the current output value is copied into the input
    /// and the destination reacts as if the user had edited it.
    ///
    /// # Errors
    ///
    /// Returns the [`GraphError`] naming the first admission rule the link
    /// breaks, leaving the graph unchanged; or [`GraphError::Invocation`]
    /// if the link was added but invoking the destination failed.
    pub fn add_link_by_id(
        &mut self,
        src: &NodeId,
        src_output_idx: usize,
        dst: &NodeId,
        dst_input_name: Option<&str>,
    ) -> Result<(), GraphError> {
        let link = self.check_link(src, src_output_idx, dst, dst_input_name)?;
        let dst_idx = self.require(dst)?;
        info!(
            src = %self.function_node_unique_name(src).unwrap_or_default(),
            dst = %self.function_node_unique_name(dst).unwrap_or_default(),
            input = %link.dst_input_name,
            output = link.src_output_idx,
            "link added"
        );
        self.insert_link(link.clone());
        self.transfer(&link);
        self.on_inputs_changed_at(dst_idx, true)?;
        Ok(())
    }

    /// Checks whether a link would be accepted, without adding it.
    ///
    /// # Errors
    ///
    /// Returns the [`GraphError`] naming the first admission rule the link breaks.
    pub fn check_link(
        &self,
        src: &NodeId,
        src_output_idx: usize,
        dst: &NodeId,
        dst_input_name: Option<&str>,
    ) -> Result<FunctionNodeLink, GraphError> {
        let src_idx = self.require(src)?;
        let dst_idx = self.require(dst)?;
        let names = self.unique_names();
        let src_fn = self.nodes[src_idx].function_with_gui();
        let dst_node = &self.nodes[dst_idx];
        let dst_fn = dst_node.function_with_gui();

        if src_output_idx >= src_fn.nb_outputs() {
            return Err(GraphError::OutputOutOfRange {
                function: names[src_idx].clone(),
                idx: src_output_idx,
            });
        }
        let dst_input_name = match dst_input_name {
            Some(name) if dst_fn.input(name).is_some() => name.to_string(),
            Some(name) => {
                return Err(GraphError::UnknownInput {
                    function: names[dst_idx].clone(),
                    input: name.to_string(),
                });
            }
            None => match dst_fn.input_names().first() {
                Some(name) => (*name).to_string(),
                None => return Err(GraphError::NoInputs(names[dst_idx].clone())),
            },
        };
        if src == dst {
            return Err(GraphError::SelfLink);
        }

        let link = FunctionNodeLink::new(src.clone(), src_output_idx, dst.clone(), dst_input_name);
        if self.links.contains(&link) {
            return Err(GraphError::DuplicateLink);
        }
        if dst_node.has_input_link(&link.dst_input_name) {
            return Err(GraphError::InputAlreadyLinked {
                function: names[dst_idx].clone(),
                input: link.dst_input_name,
            });
        }
        if self.has_cycle_with(Some(&link)) {
            return Err(GraphError::WouldCreateCycle);
        }
        Ok(link)
    }

    pub(crate) fn insert_link(&mut self, link: FunctionNodeLink) {
        if let Some(idx) = self.index_of(&link.src) {
            self.nodes[idx].output_links.push(link.clone());
        }
        if let Some(idx) = self.index_of(&link.dst) {
            self.nodes[idx].input_links.push(link.clone());
        }
        self.links.push(link);
    }

    /// Removes a link from the graph and from both endpoints.
    ///
    /// The destination input keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownLink`] if the link is not in the graph.
    pub fn remove_link(&mut self, link: &FunctionNodeLink) -> Result<(), GraphError> {
        let pos = self
            .links
            .iter()
            .position(|l| l == link)
            .ok_or(GraphError::UnknownLink)?;
        self.links.remove(pos);
        for node in &mut self.nodes {
            node.input_links.retain(|l| l != link);
            node.output_links.retain(|l| l != link);
        }
        debug!(input = %link.dst_input_name, "link removed");
        Ok(())
    }

    /// Removes a node and every link touching it; returns its function.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if there is no such node.
    pub fn remove_function(&mut self, id: &NodeId) -> Result<FunctionWithGui, GraphError> {
        self.require(id)?;
        let touching: Vec<FunctionNodeLink> = self
            .links
            .iter()
            .filter(|l| l.touches(id))
            .cloned()
            .collect();
        for link in &touching {
            self.remove_link(link)?;
        }
        let idx = self.require(id)?;
        let node = self.nodes.remove(idx);
        debug!(node = %id, "function removed");
        Ok(node.into_function_with_gui())
    }

    /// Removes the node with this unique name; see [`remove_function`](Self::remove_function).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownFunction`] if there is no such node.
    pub fn remove_function_by_unique_name(&mut self, unique_name: &str) -> Result<FunctionWithGui, GraphError> {
        let idx = self.require_unique_name(unique_name)?;
        let id = self.nodes[idx].id().clone();
        self.remove_function(&id)
    }

    /// Whether the links form a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.has_cycle_with(None)
    }

    fn has_cycle_with<'a>(&'a self, extra: Option<&'a FunctionNodeLink>) -> bool {
        let mut successors: HashMap<&'a NodeId, Vec<&'a NodeId>> = HashMap::new();
        for link in self.links.iter().chain(extra) {
            successors.entry(&link.src).or_default().push(&link.dst);
        }
        let mut state: HashMap<&'a NodeId, Visit> = HashMap::new();
        self.nodes
            .iter()
            .any(|node| visit_finds_cycle(node.id(), &successors, &mut state))
    }

    /// Node indices in dependency order; ties keep insertion order.
    fn topological_order(&self) -> Vec<usize> {
        let mut indegree = vec![0_usize; self.nodes.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for link in &self.links {
            if let (Some(src), Some(dst)) = (self.index_of(&link.src), self.index_of(&link.dst)) {
                successors[src].push(dst);
                indegree[dst] += 1;
            }
        }
        let mut ready: BTreeSet<usize> = (0..self.nodes.len()).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(idx) = ready.pop_first() {
            order.push(idx);
            for &next in &successors[idx] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.insert(next);
                }
            }
        }
        order
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────────────────────────────────────

    /// Assigns a parameter by unique name, then reacts as for a user edit.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownFunction`] or [`GraphError::UnknownInput`]
    /// for a bad address, or [`GraphError::Invocation`] if the resulting
    /// invocation failed.
    pub fn set_param_value(
        &mut self,
        unique_name: &str,
        input_name: &str,
        value: impl Into<DataValue>,
    ) -> Result<(), GraphError> {
        let idx = self.require_unique_name(unique_name)?;
        self.nodes[idx]
            .function_with_gui_mut()
            .set_param_value(input_name, value)?;
        self.on_inputs_changed_at(idx, true)?;
        Ok(())
    }

    /// Marks a node dirty and invokes it unless it is manual.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`], or [`GraphError::Invocation`]
    /// when failures are not caught.
    pub fn on_inputs_changed(&mut self, id: &NodeId) -> Result<(), GraphError> {
        let idx = self.require(id)?;
        self.on_inputs_changed_at(idx, true)?;
        Ok(())
    }

    fn on_inputs_changed_at(&mut self, idx: usize, allow_async: bool) -> Result<(), FunctionError> {
        let function = self.nodes[idx].function_with_gui_mut();
        function.set_dirty();
        if function.invoke_manually() {
            return Ok(());
        }
        self.invoke_node(idx, allow_async)
    }

    /// Invokes a node; if it ran, its outputs flow downstream.
    fn invoke_node(&mut self, idx: usize, allow_async: bool) -> Result<(), FunctionError> {
        let was_dirty = self.nodes[idx].function_with_gui().is_dirty();
        self.nodes[idx].invoke(allow_async)?;
        if was_dirty && !self.nodes[idx].is_running_async() {
            self.propagate_outputs(idx, allow_async)?;
        }
        Ok(())
    }

    /// Copies every linked output of a node into the downstream inputs.
    fn propagate_outputs(&mut self, idx: usize, allow_async: bool) -> Result<(), FunctionError> {
        let links = self.nodes[idx].output_links.clone();
        for link in links {
            self.transfer(&link);
            if let Some(dst_idx) = self.index_of(&link.dst) {
                self.on_inputs_changed_at(dst_idx, allow_async)?;
            }
        }
        Ok(())
    }

    fn transfer(&mut self, link: &FunctionNodeLink) {
        let Some(src_idx) = self.index_of(&link.src) else {
            return;
        };
        let value = self.nodes[src_idx]
            .function_with_gui()
            .output(link.src_output_idx)
            .map(|output| output.value().clone())
            .unwrap_or_default();
        let Some(dst_idx) = self.index_of(&link.dst) else {
            return;
        };
        if let Some(param) = self.nodes[dst_idx]
            .function_with_gui_mut()
            .input_mut(&link.dst_input_name)
        {
            param.data_with_gui.set_value(value);
        }
    }

    /// Marks every node dirty and invokes them all in dependency order.
    ///
    /// Manual and async nodes are invoked too (synchronously), so that
    /// every node is up to date when this returns. Async calls still
    /// running are discarded: their outcome would be stale.
    ///
    /// # Errors
    ///
    /// Returns the first [`FunctionError`] when failures are not caught.
    pub fn invoke_all(&mut self) -> Result<(), FunctionError> {
        for node in &mut self.nodes {
            if node.discard_async() {
                debug!(function = %node.function_with_gui().name(), "running async invocation discarded");
            }
            node.function_with_gui_mut().set_dirty();
        }
        for idx in self.topological_order() {
            if self.nodes[idx].function_with_gui().is_dirty() {
                self.invoke_node(idx, false)?;
            }
        }
        Ok(())
    }

    /// Invokes the nodes without input links, which seeds the graph.
    ///
    /// # Errors
    ///
    /// Returns the first [`FunctionError`] when failures are not caught.
    pub fn invoke_top_leaf_functions(&mut self) -> Result<(), FunctionError> {
        for idx in 0..self.nodes.len() {
            if self.nodes[idx].input_links().is_empty() {
                self.invoke_node(idx, false)?;
            }
        }
        Ok(())
    }

    /// Per-frame update; returns whether anything changed.
    ///
    /// Runs widget heartbeats, applies finished async results (propagating
    /// them downstream), re-dirties `invoke_always_dirty` functions and
    /// invokes live ones.
    ///
    /// # Errors
    ///
    /// Returns the first [`FunctionError`] when failures are not caught.
    pub fn heartbeat(&mut self) -> Result<bool, FunctionError> {
        let mut changed = false;
        for idx in self.topological_order() {
            if self.nodes[idx].function_with_gui_mut().on_heartbeat() {
                changed = true;
                self.on_inputs_changed_at(idx, true)?;
            }

            if let Some(result) = self.nodes[idx].poll_async() {
                changed = true;
                result?;
                self.propagate_outputs(idx, true)?;
                if self.nodes[idx].function_with_gui().is_dirty() {
                    self.invoke_node(idx, true)?;
                }
            }

            let function = self.nodes[idx].function_with_gui_mut();
            if function.invoke_always_dirty() {
                function.set_dirty();
            }
            if function.is_live() {
                changed = true;
                self.invoke_node(idx, true)?;
            }
        }
        Ok(changed)
    }

    /// Invokes a node with failure catching disabled, so that a failure
    /// unwinds to the caller (e.g. to stop in a debugger).
    ///
    /// The previous catching mode is restored afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`], or the invocation failure.
    pub fn reinvoke_for_debugger(&mut self, id: &NodeId) -> Result<(), GraphError> {
        let idx = self.require(id)?;
        let previous = catch_function_exceptions();
        set_catch_function_exceptions(false);
        self.nodes[idx].function_with_gui_mut().set_dirty();
        let result = self.invoke_node(idx, false);
        set_catch_function_exceptions(previous);
        result.map_err(GraphError::from)
    }

    /// Draws every node and reacts to the user's actions; returns whether
    /// anything changed.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError::Invocation`] when failures are not caught, or
    /// when "Raise for debugger" was pressed.
    pub fn draw(&mut self, ui: &mut dyn Ui) -> Result<bool, GraphError> {
        let mut changed = false;
        for idx in 0..self.nodes.len() {
            let outcome = self.nodes[idx].draw(ui);
            if outcome.debug_requested {
                let id = self.nodes[idx].id().clone();
                self.reinvoke_for_debugger(&id)?;
            }
            if outcome.inputs_changed {
                changed = true;
                self.on_inputs_changed_at(idx, true)?;
            }
            if outcome.invoke_requested {
                changed = true;
                self.nodes[idx].function_with_gui_mut().set_dirty();
                self.invoke_node(idx, true)?;
            }
        }
        Ok(changed)
    }

    /// Releases the resources of every widget.
    pub fn shutdown(&mut self) {
        for node in &mut self.nodes {
            node.on_exit();
        }
    }
}

fn visit_finds_cycle<'a>(
    node: &'a NodeId,
    successors: &HashMap<&'a NodeId, Vec<&'a NodeId>>,
    state: &mut HashMap<&'a NodeId, Visit>,
) -> bool {
    match state.get(node) {
        Some(Visit::InProgress) => return true,
        Some(Visit::Done) => return false,
        None => {}
    }
    state.insert(node, Visit::InProgress);
    if let Some(next) = successors.get(node)
        && next
            .iter()
            .any(|succ| visit_finds_cycle(succ, successors, state))
    {
        return true;
    }
    state.insert(node, Visit::Done);
    false
}

#[cfg(test)]
mod tests {
    use fiatlight_core::FiatValue;

    use super::*;

    fn unary(name: &str, f: fn(i64) -> i64) -> FunctionWithGui {
        FunctionWithGui::builder(name, f)
            .param_names(&["x"])
            .build()
            .unwrap()
    }

    fn output_of(graph: &FunctionsGraph, name: &str) -> DataValue {
        graph
            .function_with_gui_by_unique_name(name)
            .unwrap()
            .output(0)
            .unwrap()
            .value()
            .clone()
    }

    #[test]
    fn duplicate_names_get_suffixes() {
        let mut graph = FunctionsGraph::new();
        graph.add_function(unary("inc", |x| x + 1));
        graph.add_function(unary("dbl", |x| x * 2));
        graph.add_function(unary("inc", |x| x + 1));
        assert_eq!(graph.unique_names(), vec!["inc_1", "dbl", "inc_2"]);
        assert!(graph.node_by_unique_name("inc_2").is_some());
        assert!(graph.node_by_unique_name("inc").is_none());
    }

    #[test]
    fn composition_chains_first_output_to_first_input() {
        let graph = FunctionsGraph::from_function_composition(vec![
            unary("a", |x| x),
            unary("b", |x| x),
            unary("c", |x| x),
        ]);
        assert_eq!(graph.links().len(), 2);
        assert!(graph.links().iter().all(|l| l.src_output_idx == 0 && l.dst_input_name == "x"));
    }

    #[test]
    fn composition_skips_steps_without_output() {
        let sink = FunctionWithGui::new("sink", |_x: i64| ()).unwrap();
        let graph = FunctionsGraph::from_function_composition(vec![sink, unary("b", |x| x)]);
        assert!(graph.links().is_empty());
    }

    #[test]
    fn admission_rules_are_checked_in_order() {
        let mut graph =
            FunctionsGraph::from_function_composition(vec![unary("a", |x| x), unary("b", |x| x), unary("c", |x| x)]);

        let err = graph.add_link("a", "zz", None, 0).unwrap_err();
        assert!(matches!(err, GraphError::UnknownFunction(_)));
        let err = graph.add_link("a", "c", None, 1).unwrap_err();
        assert!(matches!(err, GraphError::OutputOutOfRange { idx: 1, .. }));
        let err = graph.add_link("a", "c", Some("y"), 0).unwrap_err();
        assert!(matches!(err, GraphError::UnknownInput { .. }));
        let err = graph.add_link("a", "a", None, 0).unwrap_err();
        assert!(matches!(err, GraphError::SelfLink));
        let err = graph.add_link("a", "b", None, 0).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateLink));
        let err = graph.add_link("a", "c", None, 0).unwrap_err();
        assert!(matches!(err, GraphError::InputAlreadyLinked { .. }));
        assert_eq!(graph.links().len(), 2);
    }

    #[test]
    fn cycles_are_rejected_without_change() {
        let mut graph =
            FunctionsGraph::from_function_composition(vec![unary("a", |x| x), unary("b", |x| x), unary("c", |x| x)]);
        let before = graph.links().to_vec();
        let err = graph.add_link("c", "a", Some("x"), 0).unwrap_err();
        assert_eq!(err.to_string(), "Link would create a cycle");
        assert_eq!(graph.links(), before.as_slice());
        assert!(!graph.has_cycle());
    }

    #[test]
    fn accepted_link_transfers_the_current_value() {
        let mut graph = FunctionsGraph::new();
        graph.add_function(unary("inc", |x| x + 1));
        graph.add_function(unary("dbl", |x| x * 2));
        graph.set_param_value("inc", "x", FiatValue::Int(4)).unwrap();
        assert_eq!(output_of(&graph, "inc"), DataValue::Value(FiatValue::Int(5)));

        graph.add_link("inc", "dbl", None, 0).unwrap();
        assert_eq!(output_of(&graph, "dbl"), DataValue::Value(FiatValue::Int(10)));
        let dbl = graph.node_by_unique_name("dbl").unwrap().id().clone();
        assert_eq!(graph.input_link_info(&dbl, "x").as_deref(), Some("linked to inc (output 0)"));
    }

    #[test]
    fn edits_propagate_downstream() {
        let mut graph = FunctionsGraph::from_function_composition(vec![unary("inc", |x| x + 1), unary("dbl", |x| x * 2)]);
        graph.set_param_value("inc", "x", FiatValue::Int(1)).unwrap();
        assert_eq!(output_of(&graph, "dbl"), DataValue::Value(FiatValue::Int(4)));
        graph.set_param_value("inc", "x", FiatValue::Int(2)).unwrap();
        assert_eq!(output_of(&graph, "dbl"), DataValue::Value(FiatValue::Int(6)));
    }

    #[test]
    fn manual_nodes_wait_for_invoke_all() {
        let mut manual = unary("dbl", |x| x * 2);
        manual.set_invoke_manually(true);
        let mut graph = FunctionsGraph::from_function_composition(vec![unary("inc", |x| x + 1), manual]);
        graph.set_param_value("inc", "x", FiatValue::Int(1)).unwrap();
        assert!(graph.function_with_gui_by_unique_name("dbl").unwrap().is_dirty());
        assert!(output_of(&graph, "dbl").is_unspecified());

        graph.invoke_all().unwrap();
        assert_eq!(output_of(&graph, "dbl"), DataValue::Value(FiatValue::Int(4)));
        assert!(graph.nodes().iter().all(|n| !n.function_with_gui().is_dirty()));
    }

    #[test]
    fn removing_a_function_removes_its_links() {
        let mut graph =
            FunctionsGraph::from_function_composition(vec![unary("a", |x| x), unary("b", |x| x), unary("c", |x| x)]);
        let removed = graph.remove_function_by_unique_name("b").unwrap();
        assert_eq!(removed.name(), "b");
        assert!(graph.links().is_empty());
        assert!(graph.nodes().iter().all(|n| n.input_links().is_empty() && n.output_links().is_empty()));
    }

    #[test]
    fn remove_link_updates_both_endpoints() {
        let mut graph = FunctionsGraph::from_function_composition(vec![unary("a", |x| x), unary("b", |x| x)]);
        let link = graph.links()[0].clone();
        graph.remove_link(&link).unwrap();
        assert!(matches!(graph.remove_link(&link), Err(GraphError::UnknownLink)));
        assert!(!graph.node_by_unique_name("b").unwrap().has_input_link("x"));
    }

    #[test]
    fn merged_graphs_keep_their_links() {
        let mut left = FunctionsGraph::from_function_composition(vec![unary("a", |x| x), unary("b", |x| x)]);
        let right = FunctionsGraph::from_function_composition(vec![unary("a", |x| x), unary("c", |x| x)]);
        left.merge_graph(right);
        assert_eq!(left.len(), 4);
        assert_eq!(left.links().len(), 2);
        assert_eq!(left.unique_names(), vec!["a_1", "b", "a_2", "c"]);
    }

    #[test]
    fn live_functions_run_on_heartbeat() {
        use std::sync::atomic::{AtomicI64, Ordering};
        static COUNTER: AtomicI64 = AtomicI64::new(0);

        let mut tick = FunctionWithGui::new("tick", || COUNTER.fetch_add(1, Ordering::SeqCst)).unwrap();
        tick.set_invoke_always_dirty(true);
        assert!(tick.is_live());
        let mut graph = FunctionsGraph::from_function_composition(vec![tick, unary("dbl", |x| x * 2)]);
        graph.invoke_all().unwrap();
        let first = output_of(&graph, "dbl");

        assert!(graph.heartbeat().unwrap());
        assert_ne!(output_of(&graph, "dbl"), first);
    }
}
