//! Proportional-split maintenance for outgoing edge weights.
//!
//! A weight is the percentage of the source node's outflow routed onto an
//! edge. Weights are only rebalanced automatically where the redistribution is
//! unambiguous, i.e. for a binary split. Three or more siblings are left as
//! entered; the derived [`share_of`] is what gets displayed.

use cf_core::{EdgeId, PERCENT_MAX, Real, clamp_percent};

use crate::graph::Edge;

/// Weight of a sole route, and of any route added beyond the first split.
pub const FULL_WEIGHT: Real = PERCENT_MAX;

/// Each half of a binary split created by adding a second route.
pub const SPLIT_WEIGHT: Real = 50.0;

/// Outcome of a single-edge weight edit.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEdit {
    pub edge: EdgeId,
    /// Clamped value stored on the edited edge.
    pub weight: Real,
    /// The sibling rebalanced to `100 - weight`, when the source has exactly two routes.
    pub sibling: Option<(EdgeId, Real)>,
}

fn sibling_indices(edges: &[Edge], source: &str) -> Vec<usize> {
    edges
        .iter()
        .enumerate()
        .filter(|(_, e)| e.source == source)
        .map(|(i, _)| i)
        .collect()
}

/// Apply the creation rule to the edge just pushed at `new_index`.
pub(crate) fn apply_new_edge(edges: &mut [Edge], new_index: usize) {
    let source = edges[new_index].source.clone();
    let siblings = sibling_indices(edges, &source);
    match siblings.as_slice() {
        [pair_a, pair_b] => {
            edges[*pair_a].weight = Some(SPLIT_WEIGHT);
            edges[*pair_b].weight = Some(SPLIT_WEIGHT);
        }
        _ => edges[new_index].weight = Some(FULL_WEIGHT),
    }
}

/// Clamp and store `requested`; mirror onto the sibling of a binary split.
pub(crate) fn apply_weight_edit(edges: &mut [Edge], index: usize, requested: Real) -> WeightEdit {
    let clamped = clamp_percent(requested);
    let source = edges[index].source.clone();
    let siblings = sibling_indices(edges, &source);

    edges[index].weight = Some(clamped);

    let sibling = match siblings.as_slice() {
        [a, b] => {
            let other = if *a == index { *b } else { *a };
            let mirrored = PERCENT_MAX - clamped;
            edges[other].weight = Some(mirrored);
            Some((edges[other].id.clone(), mirrored))
        }
        _ => None,
    };

    WeightEdit {
        edge: edges[index].id.clone(),
        weight: clamped,
        sibling,
    }
}

/// Weight as seen by share computation: missing reads as 100, anything
/// non-finite or negative reads as 0.
pub fn effective_weight(edge: &Edge) -> Real {
    let raw = edge.weight.unwrap_or(FULL_WEIGHT);
    if raw.is_finite() && raw >= 0.0 { raw } else { 0.0 }
}

/// Normalized share (percent) of `edge` among edges with the same source.
///
/// Recomputed from current weights on every call; a zero total splits evenly.
pub fn share_of(edges: &[Edge], edge: &Edge) -> Real {
    let (count, total) = edges
        .iter()
        .filter(|e| e.source == edge.source)
        .fold((0_usize, 0.0), |(n, sum), e| (n + 1, sum + effective_weight(e)));

    if total > 0.0 {
        effective_weight(edge) / total * PERCENT_MAX
    } else if count > 0 {
        PERCENT_MAX / count as Real
    } else {
        PERCENT_MAX
    }
}

/// Shares of every outgoing edge of `source`, in edge order.
pub fn shares_for_source(edges: &[Edge], source: &str) -> Vec<(EdgeId, Real)> {
    edges
        .iter()
        .filter(|e| e.source == source)
        .map(|e| (e.id.clone(), share_of(edges, e)))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pair(wa: Real, wb: Real) -> Vec<Edge> {
        vec![
            Edge {
                id: "a".into(),
                source: "n".into(),
                target: "x".into(),
                weight: Some(wa),
            },
            Edge {
                id: "b".into(),
                source: "n".into(),
                target: "y".into(),
                weight: Some(wb),
            },
        ]
    }

    proptest! {
        #[test]
        fn binary_edit_keeps_pair_at_100(
            wa in 0.0_f64..100.0,
            wb in 0.0_f64..100.0,
            requested in -500.0_f64..500.0,
            pick in 0_usize..2,
        ) {
            let mut edges = pair(wa, wb);
            apply_weight_edit(&mut edges, pick, requested);
            let sum = edges[0].weight.unwrap() + edges[1].weight.unwrap();
            prop_assert!((sum - 100.0).abs() < 1e-9);
        }

        #[test]
        fn shares_sum_to_100(weights in prop::collection::vec(0.0_f64..200.0, 1..8)) {
            let edges: Vec<Edge> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| Edge {
                    id: format!("e{i}").into(),
                    source: "n".into(),
                    target: format!("t{i}").into(),
                    weight: Some(*w),
                })
                .collect();
            let total: Real = edges.iter().map(|e| share_of(&edges, e)).sum();
            prop_assert!((total - 100.0).abs() < 1e-6);
        }

        #[test]
        fn zero_weights_share_equally(count in 1_usize..10) {
            let edges: Vec<Edge> = (0..count)
                .map(|i| Edge {
                    id: format!("e{i}").into(),
                    source: "n".into(),
                    target: format!("t{i}").into(),
                    weight: Some(0.0),
                })
                .collect();
            for e in &edges {
                prop_assert!((share_of(&edges, e) - 100.0 / count as Real).abs() < 1e-9);
            }
        }
    }
}
