//! Container input files and the simulation record written to stdout.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wastetrack_core::{ContainerRecord, PlanOutcome};

#[derive(Deserialize)]
#[serde(untagged)]
enum ContainerFile {
    List(Vec<ContainerRecord>),
    Wrapped { containers: Vec<ContainerRecord> },
}

/// Parse a JSON container list, either bare or under a `containers` key.
pub fn parse_containers(json: &str) -> Result<Vec<ContainerRecord>> {
    let file: ContainerFile =
        serde_json::from_str(json).context("Container file is not a JSON container list")?;
    Ok(match file {
        ContainerFile::List(records) | ContainerFile::Wrapped { containers: records } => records,
    })
}

pub fn load_containers(path: &Path) -> Result<Vec<ContainerRecord>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_containers(&json).with_context(|| format!("Invalid container file {}", path.display()))
}

/// One planning run as persisted by simulation tooling.
#[derive(Debug, Serialize)]
pub struct SimulationRecord {
    pub created_at: DateTime<Utc>,
    pub container_count: usize,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}

impl SimulationRecord {
    pub fn new(container_count: usize, outcome: PlanOutcome) -> Self {
        Self {
            created_at: Utc::now(),
            container_count,
            outcome,
        }
    }
}
