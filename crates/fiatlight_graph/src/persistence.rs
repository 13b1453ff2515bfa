//! The three persisted documents of a graph.
//!
//! - **User inputs**: the value of every parameter not fed by a link,
//!   `{"functions_nodes": {"<unique name>": {"<param>": <value dict>}}}`.
//! - **GUI options**: layout state of every node and widget,
//!   `{"<unique name>": {"function_node_with_gui": .., "function_node": ..}}`.
//! - **Graph composition**: the functions and links of a graph built by
//!   the user, rebuilt through a caller-supplied factory.
//!
//! Each document loads independently. A node or parameter that cannot be
//! loaded is skipped with a warning; the rest still loads.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::function::FunctionWithGui;
use crate::graph::FunctionsGraph;
use crate::node::{NodeGuiState, NodeId};

const USER_INPUTS_KEY: &str = "functions_nodes";

/// A link of a [`GraphComposition`], addressed by unique names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescription {
    /// Unique name of the source node.
    pub src_function_name: String,
    /// Unique name of the destination node.
    pub dst_function_name: String,
    /// Parameter of the destination.
    pub dst_input_name: String,
    /// Output slot of the source.
    pub src_output_idx: usize,
}

/// The structure of a graph: its functions (by function name, in insertion
/// order) and its links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphComposition {
    /// Function names, in insertion order.
    pub functions_names: Vec<String>,
    /// Links, in insertion order.
    pub functions_nodes_links: Vec<LinkDescription>,
}

impl FunctionsGraph {
    // ─────────────────────────────────────────────────────────────────────────
    // User inputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Saves the value of every unlinked parameter.
    #[must_use]
    pub fn save_user_inputs_to_json(&self) -> JsonValue {
        let mut nodes = JsonMap::new();
        for (unique_name, node) in self.unique_names().into_iter().zip(self.nodes()) {
            let params: JsonMap<String, JsonValue> = node
                .user_editable_params()
                .map(|p| (p.name.clone(), p.data_with_gui.call_save_to_dict()))
                .collect();
            nodes.insert(unique_name, JsonValue::Object(params));
        }
        let mut doc = JsonMap::new();
        doc.insert(USER_INPUTS_KEY.to_string(), JsonValue::Object(nodes));
        JsonValue::Object(doc)
    }

    /// Restores the values saved by [`save_user_inputs_to_json`](Self::save_user_inputs_to_json).
    ///
    /// Parameters now fed by a link are left alone. Loaded nodes are marked
    /// dirty; nothing is invoked. Returns the number of parameters loaded.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Malformed`] if the document is not an
    /// object of objects. Unknown nodes and unreadable values are skipped
    /// with a warning.
    pub fn load_user_inputs_from_json(&mut self, json: &JsonValue) -> Result<usize, PersistenceError> {
        let Some(nodes) = json.get(USER_INPUTS_KEY) else {
            return Ok(0);
        };
        let nodes = nodes
            .as_object()
            .ok_or_else(|| PersistenceError::malformed("user inputs", "`functions_nodes` is not an object"))?;

        let mut loaded = 0;
        for (unique_name, params) in nodes {
            let Some(params) = params.as_object() else {
                warn!(node = %unique_name, "user inputs of the node are not an object, skipped");
                continue;
            };
            let Some(node) = self.node_by_unique_name_mut(unique_name) else {
                warn!(node = %unique_name, "no such function in the graph, user inputs skipped");
                continue;
            };
            let linked: Vec<String> = node
                .input_links()
                .iter()
                .map(|l| l.dst_input_name.clone())
                .collect();
            let function = node.function_with_gui_mut();
            for (param_name, value) in params {
                if linked.contains(param_name) {
                    debug!(node = %unique_name, param = %param_name, "parameter is linked, saved value ignored");
                    continue;
                }
                let Some(param) = function.input_mut(param_name) else {
                    warn!(node = %unique_name, param = %param_name, "no such parameter, saved value skipped");
                    continue;
                };
                match param.data_with_gui.call_load_from_dict(value) {
                    Ok(()) => loaded += 1,
                    Err(err) => {
                        warn!(node = %unique_name, param = %param_name, error = %err, "cannot load parameter value");
                    }
                }
            }
            function.set_dirty();
        }
        Ok(loaded)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GUI options
    // ─────────────────────────────────────────────────────────────────────────

    /// Saves the layout state of every node and widget.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Json`] if a node layout cannot be serialized.
    pub fn save_gui_options_to_json(&self) -> Result<JsonValue, PersistenceError> {
        let mut doc = JsonMap::new();
        for (unique_name, node) in self.unique_names().into_iter().zip(self.nodes()) {
            let mut entry = JsonMap::new();
            entry.insert(
                "function_node_with_gui".to_string(),
                serde_json::to_value(node.gui_state())?,
            );
            entry.insert(
                "function_node".to_string(),
                node.function_with_gui().save_gui_options_to_json(),
            );
            doc.insert(unique_name, JsonValue::Object(entry));
        }
        Ok(JsonValue::Object(doc))
    }

    /// Restores the layout state saved by [`save_gui_options_to_json`](Self::save_gui_options_to_json).
    ///
    /// Returns the number of nodes restored.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Malformed`] if the document is not an
    /// object. Unknown nodes and unreadable entries are skipped with a warning.
    pub fn load_gui_options_from_json(&mut self, json: &JsonValue) -> Result<usize, PersistenceError> {
        let nodes = json
            .as_object()
            .ok_or_else(|| PersistenceError::malformed("gui options", "the document is not an object"))?;

        let mut loaded = 0;
        for (unique_name, entry) in nodes {
            let Some(node) = self.node_by_unique_name_mut(unique_name) else {
                warn!(node = %unique_name, "no such function in the graph, gui options skipped");
                continue;
            };
            if let Some(state) = entry.get("function_node_with_gui") {
                match serde_json::from_value::<NodeGuiState>(state.clone()) {
                    Ok(state) => *node.gui_state_mut() = state,
                    Err(err) => warn!(node = %unique_name, error = %err, "cannot load node layout"),
                }
            }
            if let Some(options) = entry.get("function_node") {
                node.function_with_gui_mut().load_gui_options_from_json(options);
            }
            loaded += 1;
        }
        Ok(loaded)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Graph composition
    // ─────────────────────────────────────────────────────────────────────────

    /// Describes the functions and links of the graph.
    #[must_use]
    pub fn graph_composition(&self) -> GraphComposition {
        let names = self.unique_names();
        let unique_name_of = |id: &NodeId| -> String {
            self.nodes()
                .iter()
                .position(|n| n.id() == id)
                .and_then(|idx| names.get(idx).cloned())
                .unwrap_or_default()
        };
        GraphComposition {
            functions_names: self
                .nodes()
                .iter()
                .map(|n| n.function_with_gui().name().to_string())
                .collect(),
            functions_nodes_links: self
                .links()
                .iter()
                .map(|link| LinkDescription {
                    src_function_name: unique_name_of(&link.src),
                    dst_function_name: unique_name_of(&link.dst),
                    dst_input_name: link.dst_input_name.clone(),
                    src_output_idx: link.src_output_idx,
                })
                .collect(),
        }
    }

    /// Saves the graph composition document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Json`] if serialization fails.
    pub fn save_graph_composition_to_json(&self) -> Result<JsonValue, PersistenceError> {
        Ok(serde_json::to_value(self.graph_composition())?)
    }

    /// Rebuilds a graph from a composition, asking `factory` for each function.
    ///
    /// Functions the factory does not know, and links that are rejected,
    /// are skipped with a warning. Nothing is invoked.
    #[must_use]
    pub fn from_graph_composition(
        composition: &GraphComposition,
        factory: impl Fn(&str) -> Option<FunctionWithGui>,
    ) -> Self {
        let mut graph = Self::new();
        for name in &composition.functions_names {
            match factory(name) {
                Some(function) => {
                    graph.add_function(function);
                }
                None => warn!(function = %name, "unknown function in graph composition, skipped"),
            }
        }

        for link in &composition.functions_nodes_links {
            let ids = (
                graph.node_by_unique_name(&link.src_function_name).map(|n| n.id().clone()),
                graph.node_by_unique_name(&link.dst_function_name).map(|n| n.id().clone()),
            );
            let (Some(src), Some(dst)) = ids else {
                warn!(
                    src = %link.src_function_name,
                    dst = %link.dst_function_name,
                    "link endpoint missing from graph composition, skipped"
                );
                continue;
            };
            match graph.check_link(&src, link.src_output_idx, &dst, Some(&link.dst_input_name)) {
                Ok(accepted) => graph.insert_link(accepted),
                Err(err) => warn!(
                    src = %link.src_function_name,
                    dst = %link.dst_function_name,
                    reason = %err,
                    "link rejected while loading graph composition"
                ),
            }
        }
        graph
    }

    /// Rebuilds a graph from a saved composition document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Json`] if the document does not have the
    /// composition shape.
    pub fn load_graph_composition_from_json(
        json: &JsonValue,
        factory: impl Fn(&str) -> Option<FunctionWithGui>,
    ) -> Result<Self, PersistenceError> {
        let composition: GraphComposition = serde_json::from_value(json.clone())?;
        Ok(Self::from_graph_composition(&composition, factory))
    }
}
