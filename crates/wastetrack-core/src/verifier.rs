//! Hard-invariant gate for candidate routes.
//!
//! Every candidate, whether composed locally or returned by an external
//! solver, must pass [`verify`] before it is used. Checks run in a fixed
//! order and stop at the first failure:
//!
//! 1. completeness (the route is a permutation of the input ids)
//! 2. leg count
//! 3. leg endpoints
//! 4. urgent nodes form a contiguous prefix
//! 5. fill levels are non-increasing within each tier
//! 6. leg distances sum to the reported total
//! 7. each leg distance matches the haversine recomputation

use std::collections::HashMap;

use crate::error::{VerificationError, VerificationRule};
use crate::geo::haversine_km;
use crate::models::{CandidateRoute, Node, NodeSet, Route};
use crate::urgency::is_urgent;

/// Absolute tolerance for distance comparisons, in kilometres.
pub const DISTANCE_TOLERANCE_KM: f64 = 0.01;

pub fn verify(candidate: CandidateRoute, nodes: &NodeSet) -> Result<Route, VerificationError> {
    let stops = check_completeness(&candidate, nodes)?;
    check_leg_count(&candidate)?;
    check_leg_endpoints(&candidate)?;
    check_urgent_prefix(&stops)?;
    check_tier_ordering(&stops)?;
    check_distance_consistency(&candidate)?;
    check_distance_correctness(&candidate, &stops)?;
    Ok(Route::accepted(candidate))
}

fn check_completeness<'a>(
    candidate: &CandidateRoute,
    nodes: &'a NodeSet,
) -> Result<Vec<&'a Node>, VerificationError> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(candidate.route.len());
    let mut foreign = Vec::new();
    let mut duplicated = Vec::new();
    let mut stops = Vec::with_capacity(candidate.route.len());

    for (position, id) in candidate.route.iter().enumerate() {
        match nodes.get(id) {
            Some(node) => {
                if let Some(first) = seen.insert(id.as_str(), position) {
                    duplicated.push(format!("{id} at positions {first} and {position}"));
                } else {
                    stops.push(node);
                }
            }
            None => foreign.push(format!("{id} at position {position}")),
        }
    }

    let mut missing: Vec<&str> = nodes
        .iter()
        .map(|node| node.id.as_str())
        .filter(|id| !seen.contains_key(id))
        .collect();
    missing.sort_unstable();

    let mut problems = Vec::new();
    if !duplicated.is_empty() {
        problems.push(format!("duplicated: {}", duplicated.join(", ")));
    }
    if !foreign.is_empty() {
        problems.push(format!("unknown: {}", foreign.join(", ")));
    }
    if !missing.is_empty() {
        problems.push(format!("missing: {}", missing.join(", ")));
    }
    if !problems.is_empty() {
        return Err(VerificationError::new(
            VerificationRule::Completeness,
            problems.join("; "),
        ));
    }

    Ok(stops)
}

fn check_leg_count(candidate: &CandidateRoute) -> Result<(), VerificationError> {
    let expected = candidate.route.len().saturating_sub(1);
    if candidate.legs.len() != expected {
        return Err(VerificationError::new(
            VerificationRule::LegCount,
            format!(
                "expected {expected} legs for {} stops, got {}",
                candidate.route.len(),
                candidate.legs.len()
            ),
        ));
    }
    Ok(())
}

fn check_leg_endpoints(candidate: &CandidateRoute) -> Result<(), VerificationError> {
    for (idx, (leg, pair)) in candidate
        .legs
        .iter()
        .zip(candidate.route.windows(2))
        .enumerate()
    {
        if leg.from_id != pair[0] || leg.to_id != pair[1] {
            return Err(VerificationError::new(
                VerificationRule::LegEndpoints,
                format!(
                    "leg {idx} is {} -> {}, route expects {} -> {}",
                    leg.from_id, leg.to_id, pair[0], pair[1]
                ),
            ));
        }
    }
    Ok(())
}

fn check_urgent_prefix(stops: &[&Node]) -> Result<(), VerificationError> {
    let mut first_normal: Option<(usize, &str)> = None;
    for (position, node) in stops.iter().enumerate() {
        match (is_urgent(node), first_normal) {
            (false, None) => first_normal = Some((position, node.id.as_str())),
            (true, Some((normal_pos, normal_id))) => {
                return Err(VerificationError::new(
                    VerificationRule::UrgentFirst,
                    format!(
                        "urgent {} at position {position} follows non-urgent {normal_id} at position {normal_pos}",
                        node.id
                    ),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_tier_ordering(stops: &[&Node]) -> Result<(), VerificationError> {
    for (position, pair) in stops.windows(2).enumerate() {
        let (prev, next) = (pair[0], pair[1]);
        // Crossing from the urgent prefix into the normal suffix resets the ordering.
        if is_urgent(prev) != is_urgent(next) {
            continue;
        }
        if next.fill_level > prev.fill_level {
            let tier = if is_urgent(prev) { "urgent" } else { "non-urgent" };
            return Err(VerificationError::new(
                VerificationRule::TierOrdering,
                format!(
                    "{tier} {} (fill {}) at position {} follows {} (fill {}) at position {position}",
                    next.id,
                    next.fill_level,
                    position + 1,
                    prev.id,
                    prev.fill_level
                ),
            ));
        }
    }
    Ok(())
}

fn check_distance_consistency(candidate: &CandidateRoute) -> Result<(), VerificationError> {
    let sum: f64 = candidate.legs.iter().map(|leg| leg.distance_km).sum();
    let total = candidate.total_distance_km;
    let within =
        sum.is_finite() && total.is_finite() && (sum - total).abs() <= DISTANCE_TOLERANCE_KM;
    if !within {
        return Err(VerificationError::new(
            VerificationRule::DistanceConsistency,
            format!("legs sum to {sum} km, route reports {total} km"),
        ));
    }
    Ok(())
}

fn check_distance_correctness(
    candidate: &CandidateRoute,
    stops: &[&Node],
) -> Result<(), VerificationError> {
    for (idx, (leg, pair)) in candidate.legs.iter().zip(stops.windows(2)).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        let expected = haversine_km(from.latitude, from.longitude, to.latitude, to.longitude);
        let valid = leg.distance_km.is_finite()
            && leg.distance_km >= 0.0
            && (leg.distance_km - expected).abs() <= DISTANCE_TOLERANCE_KM;
        if !valid {
            return Err(VerificationError::new(
                VerificationRule::DistanceCorrectness,
                format!(
                    "leg {idx} {} -> {} reports {} km, expected {expected:.4} km",
                    leg.from_id, leg.to_id, leg.distance_km
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::GreedyComposer;
    use crate::models::Leg;
    use std::collections::HashSet;

    fn sample_nodes() -> NodeSet {
        NodeSet::new(vec![
            Node::new("A", -33.45, -70.66, 95, 90),
            Node::new("B", -33.46, -70.65, 50, 90),
            Node::new("C", -33.47, -70.64, 98, 90),
            Node::new("D", -33.44, -70.67, 30, 90),
        ])
        .unwrap()
    }

    /// Candidate for an arbitrary order with correct distances.
    fn candidate_for(order: &[&str], nodes: &NodeSet) -> CandidateRoute {
        let legs: Vec<Leg> = order
            .windows(2)
            .map(|pair| {
                let a = nodes.get(pair[0]).unwrap();
                let b = nodes.get(pair[1]).unwrap();
                Leg::new(
                    pair[0],
                    pair[1],
                    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude),
                )
            })
            .collect();
        let total_distance_km = legs.iter().map(|leg| leg.distance_km).sum();
        CandidateRoute {
            route: order.iter().map(|id| id.to_string()).collect(),
            legs,
            total_distance_km,
            estimated_duration_min: None,
        }
    }

    fn rule_of(result: Result<Route, VerificationError>) -> VerificationRule {
        result.expect_err("route should be rejected").rule
    }

    #[test]
    fn accepts_greedy_route() {
        let nodes = sample_nodes();
        let candidate = GreedyComposer::new().compose_now(&nodes);
        let route = verify(candidate, &nodes).unwrap();
        assert_eq!(route.stops(), ["C", "A", "B", "D"]);
    }

    #[test]
    fn rejects_missing_and_duplicate_ids() {
        let nodes = sample_nodes();

        let omitted = candidate_for(&["C", "A", "B"], &nodes);
        let err = verify(omitted, &nodes).unwrap_err();
        assert_eq!(err.rule, VerificationRule::Completeness);
        assert!(err.detail.contains("missing: D"), "{}", err.detail);

        let duplicated = candidate_for(&["C", "A", "B", "B"], &nodes);
        let err = verify(duplicated, &nodes).unwrap_err();
        assert_eq!(err.rule, VerificationRule::Completeness);
        assert!(err.detail.contains("duplicated: B"), "{}", err.detail);
    }

    #[test]
    fn rejects_foreign_ids() {
        let nodes = sample_nodes();
        let mut candidate = candidate_for(&["C", "A", "B", "D"], &nodes);
        candidate.route[3] = "Z".to_string();
        let err = verify(candidate, &nodes).unwrap_err();
        assert_eq!(err.rule, VerificationRule::Completeness);
        assert!(err.detail.contains("unknown: Z at position 3"), "{}", err.detail);
    }

    #[test]
    fn rejects_wrong_leg_count() {
        let nodes = sample_nodes();
        let mut candidate = candidate_for(&["C", "A", "B", "D"], &nodes);
        candidate.legs.pop();
        assert_eq!(rule_of(verify(candidate, &nodes)), VerificationRule::LegCount);
    }

    #[test]
    fn rejects_mismatched_leg_endpoints() {
        let nodes = sample_nodes();
        let mut candidate = candidate_for(&["C", "A", "B", "D"], &nodes);
        candidate.legs[1].to_id = "D".to_string();
        let err = verify(candidate, &nodes).unwrap_err();
        assert_eq!(err.rule, VerificationRule::LegEndpoints);
        assert!(err.detail.starts_with("leg 1"), "{}", err.detail);
    }

    #[test]
    fn rejects_every_permutation_with_normal_before_urgent() {
        let nodes = sample_nodes();
        let ids = ["A", "B", "C", "D"];
        let mut rejected = 0;
        for a in ids {
            for b in ids {
                for c in ids {
                    for d in ids {
                        let order = [a, b, c, d];
                        let unique: HashSet<&str> = order.iter().copied().collect();
                        if unique.len() != 4 {
                            continue;
                        }
                        let urgent = |id: &str| is_urgent(nodes.get(id).unwrap());
                        let urgent_after_normal = order.iter().enumerate().any(|(i, id)| {
                            urgent(*id) && order[..i].iter().any(|prev| !urgent(*prev))
                        });
                        if !urgent_after_normal {
                            continue;
                        }
                        let result = verify(candidate_for(&order, &nodes), &nodes);
                        assert_eq!(rule_of(result), VerificationRule::UrgentFirst, "{order:?}");
                        rejected += 1;
                    }
                }
            }
        }
        // 24 permutations, 4 keep both urgent nodes in front.
        assert_eq!(rejected, 20);
    }

    #[test]
    fn rejects_tier_order_violations() {
        let nodes = sample_nodes();
        let urgent_swapped = candidate_for(&["A", "C", "B", "D"], &nodes);
        let err = verify(urgent_swapped, &nodes).unwrap_err();
        assert_eq!(err.rule, VerificationRule::TierOrdering);
        assert!(err.detail.contains("urgent C"), "{}", err.detail);

        let normal_swapped = candidate_for(&["C", "A", "D", "B"], &nodes);
        let err = verify(normal_swapped, &nodes).unwrap_err();
        assert_eq!(err.rule, VerificationRule::TierOrdering);
        assert!(err.detail.contains("non-urgent B"), "{}", err.detail);
    }

    #[test]
    fn rejects_inconsistent_total() {
        let nodes = sample_nodes();
        let mut candidate = candidate_for(&["C", "A", "B", "D"], &nodes);
        candidate.total_distance_km += 0.02;
        assert_eq!(
            rule_of(verify(candidate.clone(), &nodes)),
            VerificationRule::DistanceConsistency
        );

        candidate.total_distance_km -= 0.015;
        assert!(verify(candidate, &nodes).is_ok());
    }

    #[test]
    fn rejects_fabricated_leg_distances() {
        let nodes = sample_nodes();
        let mut candidate = candidate_for(&["C", "A", "B", "D"], &nodes);
        // Shift distance between legs so the total still adds up.
        candidate.legs[0].distance_km += 0.5;
        candidate.legs[1].distance_km -= 0.5;
        let err = verify(candidate, &nodes).unwrap_err();
        assert_eq!(err.rule, VerificationRule::DistanceCorrectness);
        assert!(err.detail.contains("leg 0 C -> A"), "{}", err.detail);
    }

    #[test]
    fn rejects_negative_leg_distance() {
        let nodes = NodeSet::new(vec![
            Node::new("p", 0.0, 0.0, 95, 90),
            Node::new("q", 0.0, 0.0, 95, 90),
        ])
        .unwrap();
        let candidate = CandidateRoute {
            route: vec!["p".into(), "q".into()],
            legs: vec![Leg::new("p", "q", -0.001)],
            total_distance_km: -0.001,
            estimated_duration_min: None,
        };
        assert_eq!(
            rule_of(verify(candidate, &nodes)),
            VerificationRule::DistanceCorrectness
        );
    }

    #[test]
    fn single_stop_route_is_accepted() {
        let nodes = NodeSet::new(vec![Node::new("X", 1.0, 1.0, 0, 100)]).unwrap();
        let candidate = candidate_for(&["X"], &nodes);
        let route = verify(candidate, &nodes).unwrap();
        assert!(route.legs().is_empty());
        assert_eq!(route.total_distance_km(), 0.0);
    }
}
