//! Parsing of solver replies into candidate routes.
//!
//! Formatting noise around the JSON object (markdown fences, a sentence of
//! preamble) is tolerated. Anything structurally wrong inside it is not.

use serde_json::{Map, Value};
use wastetrack_core::{CandidateRoute, Leg, PlanError};

fn malformed(detail: impl Into<String>) -> PlanError {
    PlanError::MalformedSolverResponse(detail.into())
}

/// Remove a surrounding markdown code fence and whitespace.
///
/// The opening fence may carry an info string (`json`) and the payload may
/// start on the fence line itself.
pub fn strip_framing(content: &str) -> &str {
    let mut body = content.trim();

    if let Some(rest) = body.strip_prefix("```") {
        let info_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
            .unwrap_or(rest.len());
        body = rest[info_len..].trim_start();
        body = body.trim_end();
        body = body.strip_suffix("```").unwrap_or(body).trim_end();
    }

    body
}

/// Locate the reply object inside the stripped body.
///
/// A body that is JSON on its own is taken as is, so a top-level array stays
/// an array. Otherwise the first `{` that starts a complete object wins,
/// skipping objects that sit inside array syntax.
fn extract_value(body: &str, content: &str) -> Result<Value, PlanError> {
    let whole_err = match serde_json::from_str::<Value>(body) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    for (start, _) in body.match_indices('{') {
        let before = body[..start].trim_end();
        if before.ends_with('[') || before.ends_with(',') {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return Ok(value);
        }
    }

    Err(malformed(format!(
        "reply is not valid JSON ({whole_err}): {}",
        preview(content)
    )))
}

/// Parse the assistant's message content into a candidate route.
pub fn parse_reply(content: &str) -> Result<CandidateRoute, PlanError> {
    let value = extract_value(strip_framing(content), content)?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("reply is not a JSON object"))?;

    let route = parse_route(object)?;
    let legs = parse_legs(object)?;

    let total_distance_km = object
        .get("total_distance_km")
        .or_else(|| object.get("distance_km"))
        .ok_or_else(|| malformed("missing field `total_distance_km`"))?
        .as_f64()
        .ok_or_else(|| malformed("`total_distance_km` is not a number"))?;

    let estimated_duration_min = object
        .get("duration_min")
        .or_else(|| object.get("estimated_duration_min"))
        .and_then(Value::as_f64);

    Ok(CandidateRoute {
        route,
        legs,
        total_distance_km,
        estimated_duration_min,
    })
}

fn parse_route(object: &Map<String, Value>) -> Result<Vec<String>, PlanError> {
    let items = object
        .get("route")
        .ok_or_else(|| malformed("missing field `route`"))?
        .as_array()
        .ok_or_else(|| malformed("`route` is not an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    malformed(format!("`route` element {idx} is not a string id: {item}"))
                })
        })
        .collect()
}

fn parse_legs(object: &Map<String, Value>) -> Result<Vec<Leg>, PlanError> {
    let items = object
        .get("distances")
        .ok_or_else(|| malformed("missing field `distances`"))?
        .as_array()
        .ok_or_else(|| malformed("`distances` is not an ordered sequence"))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value::<Leg>(item.clone())
                .map_err(|err| malformed(format!("distance record {idx} is invalid: {err}")))
        })
        .collect()
}

fn preview(content: &str) -> String {
    const MAX_CHARS: usize = 120;
    let mut shown: String = content.chars().take(MAX_CHARS).collect();
    if content.chars().count() > MAX_CHARS {
        shown.push_str("...");
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "route": ["C", "A", "B"],
        "distances": [
            {"from": "C", "to": "A", "distance_km": 1.52},
            {"from": "A", "to": "B", "distance_km": 0.87}
        ],
        "total_distance_km": 2.39,
        "duration_min": 4.78
    }"#;

    fn detail(result: Result<CandidateRoute, PlanError>) -> String {
        match result {
            Err(PlanError::MalformedSolverResponse(detail)) => detail,
            other => panic!("expected MalformedSolverResponse, got {other:?}"),
        }
    }

    #[test]
    fn parses_plain_json() {
        let candidate = parse_reply(VALID).unwrap();
        assert_eq!(candidate.route, ["C", "A", "B"]);
        assert_eq!(candidate.legs.len(), 2);
        assert_eq!(candidate.legs[0], Leg::new("C", "A", 1.52));
        assert_eq!(candidate.total_distance_km, 2.39);
        assert_eq!(candidate.estimated_duration_min, Some(4.78));
    }

    #[test]
    fn strips_code_fences_and_prose() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(parse_reply(&fenced).unwrap().route, ["C", "A", "B"]);

        let chatty = format!("Here is the optimized route:\n\n{VALID}\n\nLet me know!");
        assert_eq!(parse_reply(&chatty).unwrap().route, ["C", "A", "B"]);

        let bare_fence = format!("```\n{VALID}```");
        assert_eq!(parse_reply(&bare_fence).unwrap().legs.len(), 2);
    }

    #[test]
    fn accepts_payload_on_the_fence_line() {
        let compact = r#"{"route":["X"],"distances":[],"total_distance_km":0.0}"#;

        let single_line = format!("```json {compact}```");
        assert_eq!(parse_reply(&single_line).unwrap().route, ["X"]);

        let no_info = format!("```{compact}\n```");
        assert_eq!(parse_reply(&no_info).unwrap().route, ["X"]);

        let info_then_newline = format!("```json\n{compact}```");
        assert_eq!(parse_reply(&info_then_newline).unwrap().route, ["X"]);
    }

    #[test]
    fn skips_braces_in_preamble() {
        let reply = format!("Route for {{3}} bins: {VALID} (distances in km)");
        assert_eq!(parse_reply(&reply).unwrap().route, ["C", "A", "B"]);

        let fenced = format!("Plan {{draft}}:\n```json\n{VALID}\n```");
        assert_eq!(parse_reply(&fenced).unwrap().route, ["C", "A", "B"]);
    }

    #[test]
    fn accepts_legacy_total_field() {
        let reply = r#"{"route": ["X"], "distances": [], "distance_km": 0.0}"#;
        let candidate = parse_reply(reply).unwrap();
        assert_eq!(candidate.total_distance_km, 0.0);
        assert_eq!(candidate.estimated_duration_min, None);
    }

    #[test]
    fn rejects_non_json_body() {
        let detail = detail(parse_reply("Sorry, I cannot help with that."));
        assert!(detail.starts_with("reply is not valid JSON"), "{detail}");
    }

    #[test]
    fn rejects_missing_fields() {
        let no_route = r#"{"distances": [], "total_distance_km": 0}"#;
        assert_eq!(detail(parse_reply(no_route)), "missing field `route`");

        let no_distances = r#"{"route": ["X"], "total_distance_km": 0}"#;
        assert_eq!(detail(parse_reply(no_distances)), "missing field `distances`");

        let no_total = r#"{"route": ["X"], "distances": []}"#;
        assert_eq!(detail(parse_reply(no_total)), "missing field `total_distance_km`");
    }

    #[test]
    fn rejects_non_string_route_ids() {
        let reply = r#"{"route": ["A", 7], "distances": [], "total_distance_km": 0}"#;
        let detail = detail(parse_reply(reply));
        assert!(detail.starts_with("`route` element 1 is not a string id"), "{detail}");
    }

    #[test]
    fn rejects_unordered_distances() {
        let reply = r#"{"route": ["A", "B"], "distances": {"A": 1.0}, "total_distance_km": 1.0}"#;
        assert_eq!(detail(parse_reply(reply)), "`distances` is not an ordered sequence");

        let bad_record = r#"{
            "route": ["A", "B"],
            "distances": [{"from": "A", "distance_km": 1.0}],
            "total_distance_km": 1.0
        }"#;
        let detail = detail(parse_reply(bad_record));
        assert!(detail.starts_with("distance record 0 is invalid"), "{detail}");
    }

    #[test]
    fn rejects_top_level_array() {
        assert_eq!(detail(parse_reply(r#"["A", "B"]"#)), "reply is not a JSON object");

        let wrapped = format!("[{VALID}]");
        assert_eq!(detail(parse_reply(&wrapped)), "reply is not a JSON object");

        let fenced = format!("```json\n[{VALID}]\n```");
        assert_eq!(detail(parse_reply(&fenced)), "reply is not a JSON object");

        let chatty = format!("Here you go: [{VALID}]");
        assert!(detail(parse_reply(&chatty)).starts_with("reply is not valid JSON"));
    }
}
