//! `currentmatch` / `nextmatch` payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tournament state for the match on (or up next on) a cabinet.
///
/// The cabinet encodes every field as a JSON string. Numeric fields are
/// coerced and become NaN when they do not parse; `concluded` is the
/// literal string `"True"` on the wire, not a JSON boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveMatch {
    pub id: f64,
    pub best_of: f64,
    pub teams: [String; 2],
    pub scores: [f64; 2],
    pub warmup_seconds: f64,
    pub machine: String,
    pub concluded: bool,
    pub next_match_teams: Option<[String; 2]>,
}

/// Parses the JSON value of a `currentmatch`/`nextmatch` frame.
///
/// Total over malformed input: a value that is not JSON at all yields a
/// payload with every numeric field NaN and every string field empty.
/// `next_match_teams` is present only when both `next1` and `next2` are
/// present and non-empty.
pub fn parse_active_match(raw: &str) -> ActiveMatch {
    let parsed: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
    let next_match_teams = match (
        non_empty_field(&parsed, "next1"),
        non_empty_field(&parsed, "next2"),
    ) {
        (Some(next1), Some(next2)) => Some([next1, next2]),
        _ => None,
    };
    ActiveMatch {
        id: numeric_field(&parsed, "id"),
        best_of: numeric_field(&parsed, "bestOf"),
        teams: [string_field(&parsed, "team1"), string_field(&parsed, "team2")],
        scores: [
            numeric_field(&parsed, "score1"),
            numeric_field(&parsed, "score2"),
        ],
        warmup_seconds: numeric_field(&parsed, "warmup"),
        machine: string_field(&parsed, "machineName"),
        concluded: parsed.get("concluded").and_then(Value::as_str) == Some("True"),
        next_match_teams,
    }
}

fn numeric_field(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn non_empty_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
