//! Conversion of container records from the data source into planner nodes.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::models::{Node, MAX_PERCENT};

fn default_urgency_limit() -> i64 {
    i64::from(MAX_PERCENT)
}

/// Coordinate as delivered by the data source: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

/// A container as stored by the external data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    #[serde(alias = "guid")]
    pub id: String,
    #[serde(default)]
    pub latitude: Option<CoordinateValue>,
    #[serde(default)]
    pub longitude: Option<CoordinateValue>,
    pub fill_level: i64,
    #[serde(alias = "limit", default = "default_urgency_limit")]
    pub urgency_limit: i64,
}

impl ContainerRecord {
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        fill_level: i64,
        urgency_limit: i64,
    ) -> Self {
        Self {
            id: id.into(),
            latitude: Some(CoordinateValue::Number(latitude)),
            longitude: Some(CoordinateValue::Number(longitude)),
            fill_level,
            urgency_limit,
        }
    }
}

impl From<Node> for ContainerRecord {
    fn from(node: Node) -> Self {
        Self::new(
            node.id,
            node.latitude,
            node.longitude,
            i64::from(node.fill_level),
            i64::from(node.urgency_limit),
        )
    }
}

/// A record left out of planning, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedContainer {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct PreparedNodes {
    pub nodes: Vec<Node>,
    pub skipped: Vec<SkippedContainer>,
}

/// Turn records into nodes.
///
/// Records without a usable coordinate are skipped and reported. Fill levels
/// and limits outside 0..=100 are input errors; coordinate ranges are
/// checked later by [`crate::models::NodeSet::new`].
pub fn prepare_nodes<I>(records: I) -> Result<PreparedNodes, PlanError>
where
    I: IntoIterator<Item = ContainerRecord>,
{
    let mut prepared = PreparedNodes::default();

    for record in records {
        let coordinates = resolve_coordinate(record.latitude.as_ref(), "latitude").and_then(
            |latitude| {
                resolve_coordinate(record.longitude.as_ref(), "longitude")
                    .map(|longitude| (latitude, longitude))
            },
        );
        let (latitude, longitude) = match coordinates {
            Ok(pair) => pair,
            Err(reason) => {
                tracing::warn!("Skipping container {}: {}", record.id, reason);
                prepared.skipped.push(SkippedContainer {
                    id: record.id,
                    reason,
                });
                continue;
            }
        };

        let fill_level = percent(&record.id, "fill_level", record.fill_level)?;
        let urgency_limit = percent(&record.id, "urgency_limit", record.urgency_limit)?;
        prepared.nodes.push(Node {
            id: record.id,
            latitude,
            longitude,
            fill_level,
            urgency_limit,
        });
    }

    Ok(prepared)
}

fn resolve_coordinate(value: Option<&CoordinateValue>, field: &str) -> Result<f64, String> {
    match value {
        None => Err(format!("missing {field}")),
        Some(CoordinateValue::Number(number)) => Ok(*number),
        Some(CoordinateValue::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(format!("missing {field}"));
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| format!("unparseable {field} {text:?}"))
        }
    }
}

fn percent(id: &str, field: &'static str, value: i64) -> Result<u8, PlanError> {
    u8::try_from(value)
        .ok()
        .filter(|percent| *percent <= MAX_PERCENT)
        .ok_or_else(|| PlanError::InvalidFillLevel {
            id: id.to_string(),
            field,
            value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_and_numeric_coordinates() {
        let records: Vec<ContainerRecord> = serde_json::from_value(serde_json::json!([
            {"guid": "AB12CD", "latitude": "-33.4489", "longitude": "-70.6693", "fill_level": 80, "limit": 75},
            {"id": "ZX98YU", "latitude": -33.5, "longitude": -70.7, "fill_level": 20}
        ]))
        .unwrap();

        let prepared = prepare_nodes(records).unwrap();
        assert!(prepared.skipped.is_empty());
        assert_eq!(prepared.nodes.len(), 2);

        let first = &prepared.nodes[0];
        assert_eq!(first.id, "AB12CD");
        assert_eq!(first.latitude, -33.4489);
        assert_eq!(first.urgency_limit, 75);

        // Limit defaults to 100 when the source does not provide one.
        assert_eq!(prepared.nodes[1].urgency_limit, 100);
    }

    #[test]
    fn records_without_coordinates_are_skipped_and_reported() {
        let records: Vec<ContainerRecord> = serde_json::from_value(serde_json::json!([
            {"id": "ok", "latitude": 1.0, "longitude": 2.0, "fill_level": 10},
            {"id": "no-lat", "longitude": 2.0, "fill_level": 10},
            {"id": "blank", "latitude": "  ", "longitude": "2.0", "fill_level": 10},
            {"id": "garbage", "latitude": "1.0", "longitude": "east", "fill_level": 10},
            {"id": "null", "latitude": null, "longitude": null, "fill_level": 10}
        ]))
        .unwrap();

        let prepared = prepare_nodes(records).unwrap();
        assert_eq!(prepared.nodes.len(), 1);
        assert_eq!(prepared.nodes.len() + prepared.skipped.len(), 5);

        let reasons: Vec<(&str, &str)> = prepared
            .skipped
            .iter()
            .map(|s| (s.id.as_str(), s.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            [
                ("no-lat", "missing latitude"),
                ("blank", "missing latitude"),
                ("garbage", "unparseable longitude \"east\""),
                ("null", "missing latitude"),
            ]
        );
    }

    #[test]
    fn out_of_range_fill_level_is_an_error() {
        let negative = vec![ContainerRecord::new("neg", 0.0, 0.0, -1, 90)];
        match prepare_nodes(negative) {
            Err(PlanError::InvalidFillLevel { id, field, value }) => {
                assert_eq!((id.as_str(), field, value), ("neg", "fill_level", -1));
            }
            other => panic!("expected InvalidFillLevel, got {other:?}"),
        }

        let over_limit = vec![ContainerRecord::new("big", 0.0, 0.0, 50, 101)];
        assert!(matches!(
            prepare_nodes(over_limit),
            Err(PlanError::InvalidFillLevel { field: "urgency_limit", .. })
        ));
    }
}
