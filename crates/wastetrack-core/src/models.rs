//! Core data models for route planning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::geo::validate_coordinate;

/// Highest valid value for fill levels and urgency limits (percent).
pub const MAX_PERCENT: u8 = 100;

/// One container to visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Current fill level in percent
    pub fill_level: u8,
    /// Fill level at which the container counts as urgent
    pub urgency_limit: u8,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        fill_level: u8,
        urgency_limit: u8,
    ) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            fill_level,
            urgency_limit,
        }
    }
}

/// A validated, non-empty set of nodes with unique ids.
///
/// Composers and the verifier only accept a `NodeSet`, so coordinates and
/// fill levels are known to be in range by the time any distance is computed.
#[derive(Debug, Clone)]
pub struct NodeSet {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl NodeSet {
    pub fn new(nodes: Vec<Node>) -> Result<Self, PlanError> {
        if nodes.is_empty() {
            return Err(PlanError::EmptyNodeSet);
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            validate_coordinate(&node.id, node.latitude, node.longitude)?;
            validate_percent(&node.id, "fill_level", node.fill_level)?;
            validate_percent(&node.id, "urgency_limit", node.urgency_limit)?;
            if index.insert(node.id.clone(), position).is_some() {
                return Err(PlanError::DuplicateNodeId(node.id.clone()));
            }
        }

        Ok(Self { nodes, index })
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }
}

fn validate_percent(id: &str, field: &'static str, value: u8) -> Result<(), PlanError> {
    if value > MAX_PERCENT {
        return Err(PlanError::InvalidFillLevel {
            id: id.to_string(),
            field,
            value: i64::from(value),
        });
    }
    Ok(())
}

/// One directed hop between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    #[serde(rename = "from")]
    pub from_id: String,
    #[serde(rename = "to")]
    pub to_id: String,
    pub distance_km: f64,
}

impl Leg {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, distance_km: f64) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            distance_km,
        }
    }
}

/// An unverified route proposal, from the greedy composer or an external solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRoute {
    pub route: Vec<String>,
    #[serde(rename = "distances")]
    pub legs: Vec<Leg>,
    pub total_distance_km: f64,
    /// Duration as reported by the proposer. Never trusted; the assembler recomputes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_min: Option<f64>,
}

/// A candidate that passed every verifier check.
///
/// Only [`crate::verifier::verify`] constructs this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    route: Vec<String>,
    #[serde(rename = "distances")]
    legs: Vec<Leg>,
    total_distance_km: f64,
}

impl Route {
    pub(crate) fn accepted(candidate: CandidateRoute) -> Self {
        Self {
            route: candidate.route,
            legs: candidate.legs,
            total_distance_km: candidate.total_distance_km,
        }
    }

    pub fn stops(&self) -> &[String] {
        &self.route
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }
}

/// Presentation form of an accepted route, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub route: Vec<String>,
    pub distances: Vec<Leg>,
    pub total_distance_km: f64,
    pub estimated_duration_min: f64,
}
