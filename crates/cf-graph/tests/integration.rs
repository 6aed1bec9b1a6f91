//! Integration tests for cf-graph.

use cf_graph::{ConnectionRejection, GraphError, GraphModel, NodeKind, is_valid_connection};
use proptest::prelude::*;

fn weights_from(graph: &GraphModel, source: &str) -> Vec<f64> {
    graph
        .outgoing(source)
        .map(|e| e.weight().unwrap())
        .collect()
}

#[test]
fn capture_to_storage_single_route() {
    let mut graph = GraphModel::new();
    let capture = graph.add_node(NodeKind::Capture);
    graph.update_node_param(&capture, "base_flow", 180.0).unwrap();
    let storage = graph.add_node(NodeKind::Storage);

    let edge = graph.connect(&capture, &storage).unwrap();
    assert_eq!(graph.edge(&edge).unwrap().weight(), Some(100.0));
    assert_eq!(graph.share(&edge), Some(100.0));
    assert_eq!(graph.out_degree(&capture), 1);
    assert_eq!(graph.in_degree(&storage), 1);
}

#[test]
fn third_route_is_left_for_the_operator() {
    // Header fans out to west, east, then a third branch
    let mut graph = GraphModel::new();
    let header = graph.add_node(NodeKind::Transport);
    let west = graph.add_node(NodeKind::Transport);
    let east = graph.add_node(NodeKind::Transport);
    let plant = graph.add_node(NodeKind::Utilization);

    graph.connect(&header, &west).unwrap();
    graph.connect(&header, &east).unwrap();
    assert_eq!(weights_from(&graph, &header), vec![50.0, 50.0]);

    let third = graph.connect(&header, &plant).unwrap();
    assert_eq!(weights_from(&graph, &header), vec![50.0, 50.0, 100.0]);
    assert_eq!(graph.share(&third), Some(50.0));
}

#[test]
fn editing_pair_and_triple() {
    let mut graph = GraphModel::new();
    let source = graph.add_node(NodeKind::Capture);
    let a = graph.add_node(NodeKind::Storage);
    let b = graph.add_node(NodeKind::Storage);
    let c = graph.add_node(NodeKind::Storage);

    let ea = graph.connect(&source, &a).unwrap();
    let eb = graph.connect(&source, &b).unwrap();
    graph.set_edge_weight(&ea, 70.0).unwrap();
    assert_eq!(graph.edge(&eb).unwrap().weight(), Some(30.0));

    graph.connect(&source, &c).unwrap();
    graph.set_edge_weight(&ea, 70.0).unwrap();
    assert_eq!(weights_from(&graph, &source), vec![70.0, 30.0, 100.0]);

    graph.set_edge_weight_text(&eb, "not a number").unwrap();
    assert_eq!(graph.edge(&eb).unwrap().weight(), Some(0.0));
}

#[test]
fn rejected_connections_create_nothing() {
    let mut graph = GraphModel::new();
    let capture = graph.add_node(NodeKind::Capture);
    let transport = graph.add_node(NodeKind::Transport);
    let storage = graph.add_node(NodeKind::Storage);

    assert!(!is_valid_connection(&graph, &storage, &transport));
    assert!(!is_valid_connection(&graph, &transport, &capture));
    assert!(!is_valid_connection(&graph, &transport, &transport));

    let err = graph.connect(&transport, &capture).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Rejected(ConnectionRejection::CaptureTarget(_))
    ));
    assert!(graph.edges().is_empty());
}

#[test]
fn removing_an_edge_does_not_rebalance() {
    let mut graph = GraphModel::new();
    let source = graph.add_node(NodeKind::Transport);
    let a = graph.add_node(NodeKind::Storage);
    let b = graph.add_node(NodeKind::Storage);
    let ea = graph.connect(&source, &a).unwrap();
    graph.connect(&source, &b).unwrap();

    graph.remove_edge(&ea).unwrap();
    assert_eq!(weights_from(&graph, &source), vec![50.0]);
    // display share still reads 100 for the survivor
    let survivor = graph.outgoing(&source).next().unwrap().id().clone();
    assert_eq!(graph.share(&survivor), Some(100.0));
}

#[test]
fn loaded_edges_without_weight_keep_none() {
    let mut graph = GraphModel::new();
    let c = graph.add_node(NodeKind::Capture);
    let s = graph.add_node(NodeKind::Storage);
    let id = graph.insert_edge(Some("e-c-s".into()), &c, &s, None).unwrap();
    assert_eq!(id, "e-c-s");
    assert_eq!(graph.edge(&id).unwrap().weight(), None);
    assert_eq!(graph.share(&id), Some(100.0));

    let dup = graph.insert_edge(Some("e-c-s".into()), &c, &s, Some(10.0));
    assert!(matches!(dup, Err(GraphError::DuplicateEdgeId { .. })));
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Connect(usize, usize),
    RemoveNode(usize),
    RemoveEdge(usize),
    SetWeight(usize, f64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_usize..4).prop_map(Op::Add),
        (0_usize..16, 0_usize..16).prop_map(|(a, b)| Op::Connect(a, b)),
        (0_usize..16).prop_map(Op::RemoveNode),
        (0_usize..16).prop_map(Op::RemoveEdge),
        (0_usize..16, -50.0_f64..150.0).prop_map(|(e, w)| Op::SetWeight(e, w)),
    ]
}

proptest! {
    #[test]
    fn topology_holds_under_random_edits(ops in prop::collection::vec(op(), 1..60)) {
        let mut graph = GraphModel::new();
        for op in ops {
            match op {
                Op::Add(k) => {
                    graph.add_node(NodeKind::ALL[k]);
                }
                Op::Connect(a, b) => {
                    let nodes = graph.nodes();
                    if nodes.is_empty() {
                        continue;
                    }
                    let src = nodes[a % nodes.len()].id().clone();
                    let dst = nodes[b % nodes.len()].id().clone();
                    let _ = graph.connect(&src, &dst);
                }
                Op::RemoveNode(i) => {
                    if let Some(id) = graph.nodes().get(i).map(|n| n.id().clone()) {
                        graph.remove_node(&id).unwrap();
                    }
                }
                Op::RemoveEdge(i) => {
                    if let Some(id) = graph.edges().get(i).map(|e| e.id().clone()) {
                        graph.remove_edge(&id).unwrap();
                    }
                }
                Op::SetWeight(i, w) => {
                    if let Some(id) = graph.edges().get(i).map(|e| e.id().clone()) {
                        graph.set_edge_weight(&id, w).unwrap();
                    }
                }
            }

            prop_assert!(graph.validate().is_ok());
            for edge in graph.edges() {
                let src = graph.node(edge.source()).unwrap();
                let dst = graph.node(edge.target()).unwrap();
                prop_assert!(src.kind() != NodeKind::Storage && src.kind() != NodeKind::Utilization);
                prop_assert!(dst.kind() != NodeKind::Capture);
            }
        }
    }
}
