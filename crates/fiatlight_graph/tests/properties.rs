//! Structural properties of graphs under arbitrary link requests.

use std::collections::HashSet;

use fiatlight_graph::{FunctionWithGui, FunctionsGraph, GraphError};
use proptest::prelude::*;

fn sum(name: String) -> FunctionWithGui {
    FunctionWithGui::builder(name, |a: i64, b: i64| a + b)
        .param_names(&["a", "b"])
        .build()
        .unwrap()
}

fn link_request() -> impl Strategy<Value = (usize, usize, bool)> {
    (0..6usize, 0..6usize, any::<bool>())
}

proptest! {
    #[test]
    fn accepted_links_keep_the_graph_acyclic(requests in prop::collection::vec(link_request(), 0..40)) {
        let mut graph = FunctionsGraph::new();
        let ids: Vec<_> = (0..6).map(|i| graph.add_function(sum(format!("f{i}")))).collect();

        for (src, dst, first_input) in requests {
            let input = if first_input { "a" } else { "b" };
            let before = graph.links().len();
            match graph.add_link_by_id(&ids[src], 0, &ids[dst], Some(input)) {
                Ok(()) => prop_assert_eq!(graph.links().len(), before + 1),
                Err(
                    GraphError::SelfLink
                    | GraphError::DuplicateLink
                    | GraphError::InputAlreadyLinked { .. }
                    | GraphError::WouldCreateCycle,
                ) => prop_assert_eq!(graph.links().len(), before),
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
            prop_assert!(!graph.has_cycle());
        }

        let mut fed = HashSet::new();
        for link in graph.links() {
            prop_assert!(fed.insert((link.dst.clone(), link.dst_input_name.clone())));
            let dst = graph.node(&link.dst).unwrap();
            prop_assert_eq!(dst.input_link(&link.dst_input_name), Some(link));
            let src = graph.node(&link.src).unwrap();
            prop_assert!(src.output_links().contains(link));
        }
    }

    #[test]
    fn removing_a_node_drops_every_link_touching_it(
        requests in prop::collection::vec(link_request(), 0..30),
        victim in 0..6usize,
    ) {
        let mut graph = FunctionsGraph::new();
        let ids: Vec<_> = (0..6).map(|i| graph.add_function(sum(format!("f{i}")))).collect();
        for (src, dst, first_input) in requests {
            let input = if first_input { "a" } else { "b" };
            let _ = graph.add_link_by_id(&ids[src], 0, &ids[dst], Some(input));
        }

        graph.remove_function(&ids[victim]).unwrap();
        prop_assert!(graph.links().iter().all(|l| !l.touches(&ids[victim])));
        for node in graph.nodes() {
            prop_assert!(node.input_links().iter().all(|l| !l.touches(&ids[victim])));
            prop_assert!(node.output_links().iter().all(|l| !l.touches(&ids[victim])));
        }
    }
}
