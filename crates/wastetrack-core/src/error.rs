//! Error taxonomy for route planning.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::intake::SkippedContainer;

/// Errors surfaced by the planning engine and its composer strategies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid coordinate for node {id}: ({latitude}, {longitude})")]
    InvalidCoordinate {
        id: String,
        latitude: f64,
        longitude: f64,
    },
    #[error("invalid {field} for node {id}: {value} (expected 0..=100)")]
    InvalidFillLevel {
        id: String,
        field: &'static str,
        value: i64,
    },
    #[error("duplicate node id {0}")]
    DuplicateNodeId(String),
    #[error("node set is empty")]
    EmptyNodeSet,
    #[error("no plannable containers: all {} record(s) lacked usable coordinates", .0.len())]
    AllContainersSkipped(Vec<SkippedContainer>),
    #[error("malformed solver response: {0}")]
    MalformedSolverResponse(String),
    #[error("solver did not answer within {0:?}")]
    SolverTimeout(Duration),
    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl PlanError {
    /// Errors that come from the external solver path and warrant a greedy fallback.
    pub fn is_solver_failure(&self) -> bool {
        matches!(
            self,
            PlanError::MalformedSolverResponse(_)
                | PlanError::SolverTimeout(_)
                | PlanError::SolverUnavailable(_)
                | PlanError::Verification(_)
        )
    }
}

/// The verifier rule a candidate route violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationRule {
    Completeness,
    LegCount,
    LegEndpoints,
    UrgentFirst,
    TierOrdering,
    DistanceConsistency,
    DistanceCorrectness,
}

impl fmt::Display for VerificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerificationRule::Completeness => "completeness",
            VerificationRule::LegCount => "leg count",
            VerificationRule::LegEndpoints => "leg endpoints",
            VerificationRule::UrgentFirst => "urgent-first block",
            VerificationRule::TierOrdering => "tier ordering",
            VerificationRule::DistanceConsistency => "distance consistency",
            VerificationRule::DistanceCorrectness => "distance correctness",
        };
        f.write_str(name)
    }
}

/// A candidate route failed verification.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("route rejected by {rule} check: {detail}")]
pub struct VerificationError {
    pub rule: VerificationRule,
    pub detail: String,
}

impl VerificationError {
    pub fn new(rule: VerificationRule, detail: impl Into<String>) -> Self {
        Self {
            rule,
            detail: detail.into(),
        }
    }
}
