//! Planning pipeline: intake, propose, verify, assemble.
//!
//! An external strategy is optional. Whatever it returns is verified like any
//! other candidate; timeouts, malformed replies and rejected routes all fall
//! back to the greedy composer. The planner never returns an unverified route.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::assembler::{assemble, DEFAULT_MINUTES_PER_KM};
use crate::composer::{ComposerStrategy, GreedyComposer};
use crate::error::PlanError;
use crate::geo::{DistanceMetric, Haversine};
use crate::intake::{prepare_nodes, ContainerRecord, PreparedNodes, SkippedContainer};
use crate::models::{NodeSet, Route, RouteSummary};
use crate::verifier::verify;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Travel-time assumption for the duration estimate
    pub minutes_per_km: f64,
    /// Upper bound for one external solver round-trip
    pub solver_timeout: Duration,
    /// External attempts before falling back to the greedy composer
    pub solver_attempts: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            minutes_per_km: DEFAULT_MINUTES_PER_KM,
            solver_timeout: Duration::from_secs(30),
            solver_attempts: 1,
        }
    }
}

/// Which composer produced the accepted route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Greedy,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    #[serde(flatten)]
    pub summary: RouteSummary,
    pub source: RouteSource,
    /// Why the external solver's answer was not used, if it was consulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedContainer>,
}

/// Placeholder strategy for planners without an external solver.
#[derive(Debug, Clone, Copy)]
pub enum NoExternalSolver {}

impl ComposerStrategy for NoExternalSolver {
    async fn compose(&self, _nodes: &NodeSet) -> Result<crate::models::CandidateRoute, PlanError> {
        match *self {}
    }
}

pub struct RoutePlanner<S = NoExternalSolver, M = Haversine> {
    external: Option<S>,
    greedy: GreedyComposer<M>,
    config: PlannerConfig,
}

impl RoutePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            external: None,
            greedy: GreedyComposer::new(),
            config,
        }
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl<S, M> RoutePlanner<S, M>
where
    S: ComposerStrategy,
    M: DistanceMetric,
{
    /// Consult `strategy` first, keeping the greedy composer as fallback.
    pub fn with_external<T: ComposerStrategy>(self, strategy: T) -> RoutePlanner<T, M> {
        RoutePlanner {
            external: Some(strategy),
            greedy: self.greedy,
            config: self.config,
        }
    }

    /// Use a different distance source for greedy composition (e.g. a shared cache).
    pub fn with_metric<N: DistanceMetric>(self, metric: N) -> RoutePlanner<S, N> {
        RoutePlanner {
            external: self.external,
            greedy: GreedyComposer::with_metric(metric),
            config: self.config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Plan a route for raw container records.
    pub async fn plan<I>(&self, records: I) -> Result<PlanOutcome, PlanError>
    where
        I: IntoIterator<Item = ContainerRecord>,
    {
        let PreparedNodes { nodes, skipped } = prepare_nodes(records)?;
        if nodes.is_empty() && !skipped.is_empty() {
            tracing::warn!("All {} container(s) lacked usable coordinates", skipped.len());
            return Err(PlanError::AllContainersSkipped(skipped));
        }
        if !skipped.is_empty() {
            tracing::warn!(
                "{} container(s) excluded from planning for missing coordinates",
                skipped.len()
            );
        }
        let nodes = NodeSet::new(nodes)?;

        let mut outcome = self.plan_nodes(&nodes).await?;
        outcome.skipped = skipped;
        Ok(outcome)
    }

    /// Plan a route for an already validated node set.
    pub async fn plan_nodes(&self, nodes: &NodeSet) -> Result<PlanOutcome, PlanError> {
        let mut fallback_reason = None;

        if let Some(external) = &self.external {
            match self.try_external(external, nodes).await {
                Ok(route) => {
                    tracing::info!(
                        "Accepted external route: {} stops, {:.2} km",
                        route.stops().len(),
                        route.total_distance_km()
                    );
                    return Ok(self.finish(&route, RouteSource::External, None));
                }
                Err(err) => {
                    tracing::warn!("External solver failed, using greedy composer: {}", err);
                    fallback_reason = Some(err.to_string());
                }
            }
        }

        let route = self.compose_greedy(nodes)?;
        Ok(self.finish(&route, RouteSource::Greedy, fallback_reason))
    }

    /// Greedy composition only; never touches the external strategy.
    pub fn plan_greedy(&self, nodes: &NodeSet) -> Result<PlanOutcome, PlanError> {
        let route = self.compose_greedy(nodes)?;
        Ok(self.finish(&route, RouteSource::Greedy, None))
    }

    async fn try_external(&self, external: &S, nodes: &NodeSet) -> Result<Route, PlanError> {
        let attempts = self.config.solver_attempts.max(1);
        let mut last_error = PlanError::SolverUnavailable("no attempt made".to_string());

        for attempt in 1..=attempts {
            let limit = self.config.solver_timeout;
            let proposal = match timeout(limit, external.compose(nodes)).await {
                Ok(result) => result,
                Err(_) => Err(PlanError::SolverTimeout(limit)),
            };
            let result =
                proposal.and_then(|candidate| verify(candidate, nodes).map_err(PlanError::from));

            match result {
                Ok(route) => return Ok(route),
                Err(err) if err.is_solver_failure() => {
                    tracing::warn!(
                        "External solver attempt {}/{} rejected: {}",
                        attempt,
                        attempts,
                        err
                    );
                    last_error = err;
                }
                // Anything else will not improve on retry.
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }

    fn compose_greedy(&self, nodes: &NodeSet) -> Result<Route, PlanError> {
        let candidate = self.greedy.compose_now(nodes);
        verify(candidate, nodes).map_err(|err| {
            tracing::error!(
                "Greedy composer produced a route that failed verification (this is a bug): {}",
                err
            );
            PlanError::Verification(err)
        })
    }

    fn finish(
        &self,
        route: &Route,
        source: RouteSource,
        fallback_reason: Option<String>,
    ) -> PlanOutcome {
        PlanOutcome {
            summary: assemble(route, self.config.minutes_per_km),
            source,
            fallback_reason,
            skipped: Vec::new(),
        }
    }
}
