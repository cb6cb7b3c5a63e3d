//! External solver as a composer strategy.

use anyhow::Result;
use wastetrack_core::{CandidateRoute, ComposerStrategy, NodeSet, PlanError};

use crate::client::SolverClient;
use crate::config::SolverConfig;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::response::parse_reply;

/// Asks a chat-completions model for a route.
///
/// Replies are only parsed here; the planner verifies them before use.
pub struct ExternalSolver {
    client: SolverClient,
}

impl ExternalSolver {
    pub fn new(client: SolverClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        Ok(Self::new(SolverClient::new(config)?))
    }

    pub fn client(&self) -> &SolverClient {
        &self.client
    }
}

impl ComposerStrategy for ExternalSolver {
    async fn compose(&self, nodes: &NodeSet) -> Result<CandidateRoute, PlanError> {
        let prompt = build_prompt(nodes);
        let content = self.client.complete(SYSTEM_PROMPT, &prompt).await?;

        match parse_reply(&content) {
            Ok(candidate) => {
                tracing::debug!(
                    "Solver {} proposed {} stops over {:.2} km",
                    self.client.model(),
                    candidate.route.len(),
                    candidate.total_distance_km
                );
                Ok(candidate)
            }
            Err(err) => {
                tracing::warn!("Unusable reply from solver {}: {}", self.client.model(), err);
                Err(err)
            }
        }
    }
}
