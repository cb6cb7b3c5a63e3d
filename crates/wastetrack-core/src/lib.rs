//! WasteTrack route planning engine.
//!
//! Orders collection containers so near-full ones are emptied first, chains
//! stops of equal priority by nearest neighbour, and verifies every proposed
//! route (local or external) against a fixed invariant set before use.

pub mod assembler;
pub mod cache;
pub mod composer;
pub mod error;
pub mod geo;
pub mod intake;
pub mod models;
pub mod planner;
pub mod urgency;
pub mod verifier;

pub use assembler::{assemble, round2, DEFAULT_MINUTES_PER_KM};
pub use cache::DistanceCache;
pub use composer::{ComposerStrategy, GreedyComposer};
pub use error::{PlanError, VerificationError, VerificationRule};
pub use geo::{distance, haversine_km, DistanceMetric, Haversine, EARTH_RADIUS_KM};
pub use intake::{prepare_nodes, ContainerRecord, CoordinateValue, PreparedNodes, SkippedContainer};
pub use models::{CandidateRoute, Leg, Node, NodeSet, Route, RouteSummary};
pub use planner::{NoExternalSolver, PlanOutcome, PlannerConfig, RoutePlanner, RouteSource};
pub use urgency::{is_urgent, tier_of, urgency_key, Tier};
pub use verifier::{verify, DISTANCE_TOLERANCE_KM};
