//! Route composition: the strategy seam and the deterministic greedy composer.

use std::future::Future;

use crate::error::PlanError;
use crate::geo::{DistanceMetric, Haversine};
use crate::models::{CandidateRoute, Leg, Node, NodeSet};
use crate::urgency::{compare_urgency, is_urgent};

/// Something that can propose a visiting order for a node set.
///
/// Proposals are candidates only; the planner always runs them through the
/// verifier before use.
pub trait ComposerStrategy: Send + Sync {
    fn compose(
        &self,
        nodes: &NodeSet,
    ) -> impl Future<Output = Result<CandidateRoute, PlanError>> + Send;
}

/// Priority-first composer with nearest-neighbour tie-breaking.
///
/// Urgent nodes come first, each tier ordered by descending fill level.
/// Nodes sharing a fill level are chained by distance from the previously
/// placed stop; with no previous stop the smallest id wins.
#[derive(Debug, Clone, Default)]
pub struct GreedyComposer<M = Haversine> {
    metric: M,
}

impl GreedyComposer<Haversine> {
    pub fn new() -> Self {
        Self { metric: Haversine }
    }
}

impl<M: DistanceMetric> GreedyComposer<M> {
    pub fn with_metric(metric: M) -> Self {
        Self { metric }
    }

    /// Visiting order for the node set.
    pub fn order<'a>(&self, nodes: &'a NodeSet) -> Vec<&'a Node> {
        let (mut urgent, mut normal): (Vec<&Node>, Vec<&Node>) =
            nodes.iter().partition(|node| is_urgent(node));
        urgent.sort_by(|a, b| compare_urgency(a, b));
        normal.sort_by(|a, b| compare_urgency(a, b));

        let mut ordered = Vec::with_capacity(nodes.len());
        // The previous stop carries over from the urgent tier into the normal one.
        let mut previous: Option<&Node> = None;
        for tier in [urgent, normal] {
            for group in tier.chunk_by(|a, b| a.fill_level == b.fill_level) {
                self.chain_group(group, &mut previous, &mut ordered);
            }
        }
        ordered
    }

    fn chain_group<'a>(
        &self,
        group: &[&'a Node],
        previous: &mut Option<&'a Node>,
        ordered: &mut Vec<&'a Node>,
    ) {
        let mut remaining = group.to_vec();
        while !remaining.is_empty() {
            let next_idx = match *previous {
                // `remaining` is id-sorted, so index 0 is the smallest id.
                None => 0,
                Some(prev) => self.nearest(prev, &remaining),
            };
            let next = remaining.remove(next_idx);
            ordered.push(next);
            *previous = Some(next);
        }
    }

    fn nearest(&self, from: &Node, candidates: &[&Node]) -> usize {
        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, candidate) in candidates.iter().enumerate() {
            let dist = self.metric.distance_km(from, candidate);
            // Strict comparison keeps the smaller id on distance ties.
            if dist < best_dist {
                best_idx = idx;
                best_dist = dist;
            }
        }
        best_idx
    }

    /// Build the full candidate (ids, legs, total) synchronously.
    pub fn compose_now(&self, nodes: &NodeSet) -> CandidateRoute {
        let ordered = self.order(nodes);
        let legs: Vec<Leg> = ordered
            .windows(2)
            .map(|pair| {
                Leg::new(
                    pair[0].id.clone(),
                    pair[1].id.clone(),
                    self.metric.distance_km(pair[0], pair[1]),
                )
            })
            .collect();
        let total_distance_km = legs.iter().map(|leg| leg.distance_km).sum();

        CandidateRoute {
            route: ordered.iter().map(|node| node.id.clone()).collect(),
            legs,
            total_distance_km,
            estimated_duration_min: None,
        }
    }
}

impl<M: DistanceMetric> ComposerStrategy for GreedyComposer<M> {
    async fn compose(&self, nodes: &NodeSet) -> Result<CandidateRoute, PlanError> {
        Ok(self.compose_now(nodes))
    }
}
