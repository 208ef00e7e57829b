//! Tolerant line decoding.
//!
//! Some log producers write the source type as a bare enum token, e.g.
//! `"source_type": gold_league`. Such lines are repaired by quoting the
//! token; no other rewriting is attempted.

use pvp_types::RawEvent;
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::OnceLock;

fn bare_source_type_re() -> &'static Regex {
    static BARE_SOURCE_TYPE_RE: OnceLock<Regex> = OnceLock::new();
    BARE_SOURCE_TYPE_RE.get_or_init(|| {
        Regex::new(
            r#"("(?:source_type|sourceType)"\s*:\s*)(gold_league|season_play_pvp_mgr|qualifying_wheel_first_combat)\b"#,
        )
        .expect("valid source type repair regex")
    })
}

/// Decode one log line into a [`RawEvent`].
///
/// Returns `None` for blank lines, lines that are not a JSON object, and
/// lines that stay malformed after the source type repair. A key repeated
/// within the object keeps its last value.
pub fn decode_line(line: &str) -> Option<RawEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(event) = decode_object(line) {
        return Some(event);
    }
    match repair(line) {
        Cow::Owned(fixed) => decode_object(&fixed),
        Cow::Borrowed(_) => None,
    }
}

fn decode_object(text: &str) -> Option<RawEvent> {
    // a map first: derived structs reject repeated keys and accept arrays
    let object: Map<String, Value> = serde_json::from_str(text).ok()?;
    serde_json::from_value(Value::Object(object)).ok()
}

/// Quote bare source type tokens. Borrowed when nothing matched.
pub fn repair(line: &str) -> Cow<'_, str> {
    bare_source_type_re().replace_all(line, "${1}\"${2}\"")
}
