//! Source type resolution.
//!
//! A numeric source type is stored as-is. A symbolic label names a
//! [`SourceFamily`]; the event then fans out into one row per metric it
//! actually carries: a win-rate row when the win flag is valid and a
//! duration row when the duration is a positive number.

use pvp_types::{coerce_int, RawEvent, SourceFamily, UNKNOWN_SOURCE_TYPE};
use serde_json::Value;

/// Resolve the source type codes for `event`. Never empty.
///
/// Symbolic results are always ordered win-rate code first. A label with
/// neither a valid win flag nor a valid duration yields the win-rate code
/// alone.
pub fn resolve(event: &RawEvent) -> Vec<i32> {
    match &event.source_type {
        Some(value @ (Value::Number(_) | Value::Bool(_))) => vec![to_code(coerce_int(value))],
        Some(Value::String(label)) => match SourceFamily::from_label(label) {
            Some(family) => resolve_family(family, event),
            None => vec![to_code(label.trim().parse().ok())],
        },
        _ => vec![UNKNOWN_SOURCE_TYPE],
    }
}

fn resolve_family(family: SourceFamily, event: &RawEvent) -> Vec<i32> {
    let mut codes = Vec::with_capacity(2);
    if has_valid_win(event) {
        codes.push(family.win_rate_code());
    }
    if has_valid_duration(event) {
        codes.push(family.duration_code());
    }
    if codes.is_empty() {
        codes.push(family.win_rate_code());
    }
    codes
}

/// The win flag is present and numerically exactly 0 or 1.
///
/// Booleans count as 0/1; strings do not.
pub fn has_valid_win(event: &RawEvent) -> bool {
    match &event.is_win {
        Some(Value::Bool(_)) => true,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v == 0.0 || v == 1.0),
        _ => false,
    }
}

/// The duration is present, numeric and positive.
///
/// `true` counts as 1 and is valid; `false` is not.
pub fn has_valid_duration(event: &RawEvent) -> bool {
    match &event.duration {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v > 0.0),
        _ => false,
    }
}

fn to_code(value: Option<i64>) -> i32 {
    value
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(UNKNOWN_SOURCE_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(source_type: Value, is_win: Option<Value>, duration: Option<Value>) -> RawEvent {
        RawEvent {
            source_type: Some(source_type),
            is_win,
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn test_numeric_passes_through() {
        assert_eq!(resolve(&event(json!(7), Some(json!(1)), Some(json!(60)))), vec![7]);
        assert_eq!(resolve(&event(json!(4.9), None, None)), vec![4]);
        assert_eq!(resolve(&event(json!(true), None, None)), vec![1]);
    }

    #[test]
    fn test_label_fans_out() {
        let e = event(json!("gold_league"), Some(json!(1)), Some(json!(120)));
        assert_eq!(resolve(&e), vec![1, 4]);

        let e = event(json!(" Season "), Some(json!(0)), Some(json!(12.5)));
        assert_eq!(resolve(&e), vec![3, 6]);

        let e = event(json!("wheel_first"), Some(json!(1)), Some(json!(30)));
        assert_eq!(resolve(&e), vec![2, 5]);
    }

    #[test]
    fn test_label_single_metric() {
        let e = event(json!("gold_league"), Some(json!(1)), None);
        assert_eq!(resolve(&e), vec![1]);

        let e = event(json!("gold_league"), None, Some(json!(45)));
        assert_eq!(resolve(&e), vec![4]);
    }

    #[test]
    fn test_label_without_metrics_defaults_to_win_rate() {
        let e = event(json!("ladder"), Some(json!(2)), Some(json!(0)));
        assert_eq!(resolve(&e), vec![3]);

        let e = event(json!("ladder"), Some(json!("1")), Some(json!(false)));
        assert_eq!(resolve(&e), vec![3]);
    }

    #[test]
    fn test_unknown_string() {
        assert_eq!(resolve(&event(json!(" 8 "), None, None)), vec![8]);
        assert_eq!(resolve(&event(json!("arena"), None, None)), vec![0]);
    }

    #[test]
    fn test_missing_or_other_shapes() {
        assert_eq!(resolve(&RawEvent::default()), vec![0]);
        assert_eq!(resolve(&event(json!([1]), None, None)), vec![0]);
        assert_eq!(resolve(&event(json!({"a": 1}), None, None)), vec![0]);
    }

    #[test]
    fn test_boolean_duration_fans_out() {
        let e = event(json!("gold_league"), Some(json!(1)), Some(json!(true)));
        assert_eq!(resolve(&e), vec![1, 4]);
    }

    #[test]
    fn test_predicates() {
        assert!(has_valid_win(&event(json!(""), Some(json!(true)), None)));
        assert!(has_valid_win(&event(json!(""), Some(json!(1.0)), None)));
        assert!(!has_valid_win(&event(json!(""), Some(json!(0.5)), None)));
        assert!(has_valid_duration(&event(json!(""), None, Some(json!(true)))));
        assert!(!has_valid_duration(&event(json!(""), None, Some(json!(false)))));
        assert!(!has_valid_duration(&event(json!(""), None, Some(json!(-3)))));
        assert!(!has_valid_duration(&event(json!(""), None, Some(json!("60")))));
        assert!(has_valid_duration(&event(json!(""), None, Some(json!(0.5)))));
    }
}
