//! Prompt construction for the external solver.

use serde_json::{json, Value};
use wastetrack_core::{is_urgent, NodeSet};

pub const SYSTEM_PROMPT: &str = "You are a route optimization assistant.";

/// Describe the node set and the priority rules the reply must honour.
pub fn build_prompt(nodes: &NodeSet) -> String {
    let containers: Vec<Value> = nodes
        .iter()
        .map(|node| {
            json!({
                "id": node.id,
                "latitude": node.latitude,
                "longitude": node.longitude,
                "fill_level": node.fill_level,
                "urgency_limit": node.urgency_limit,
                "urgent": is_urgent(node),
            })
        })
        .collect();

    format!(
        "You are ordering the stops of a waste collection route.\n\
         Each container has an id, latitude and longitude, a fill_level (0 to 100, \
         higher = fuller) and an urgency_limit. A container is urgent when fill_level >= \
         urgency_limit; this is precomputed in the `urgent` field.\n\n\
         Produce a visiting order that:\n\
         1. Visits every container exactly once.\n\
         2. Visits ALL urgent containers before any non-urgent container.\n\
         3. Within the urgent group, and within the non-urgent group, never visits a \
         container before one with a higher fill_level.\n\
         4. Among containers with equal fill_level, minimizes travel distance.\n\
         Distances are great-circle distances in kilometres (haversine, Earth radius 6371 km).\n\n\
         Return ONLY a JSON object in this format:\n\
         {{\n\
           \"route\": [\"id1\", \"id2\", ...],\n\
           \"distances\": [{{\"from\": \"id1\", \"to\": \"id2\", \"distance_km\": float}}, ...],\n\
           \"total_distance_km\": float,\n\
           \"duration_min\": float\n\
         }}\n\n\
         Containers:\n\n{:#}",
        Value::Array(containers)
    )
}
