//! Raw events as decoded from log lines.
//!
//! Log producers are inconsistent: numbers arrive as strings, some keys use
//! legacy names, and optional keys may be missing or null. [`RawEvent`]
//! keeps every recognized key as an explicit optional field holding the
//! loosely-typed JSON value, so later stages can decide how strict to be
//! about each one. Unknown keys are ignored during decoding.

use crate::error::TypeError;
use crate::record::MatchRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded log line.
///
/// Every spelling of a key has its own field, so a line carrying both a
/// canonical key and one of its alternates still decodes. The field
/// normalizer in the ingestion layer merges alternates into canonical
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub server: Option<Value>,
    pub timestamp: Option<Value>,
    pub level: Option<Value>,
    #[serde(rename = "class")]
    pub own_class: Option<Value>,
    #[serde(rename = "schools")]
    pub own_school: Option<Value>,
    pub opponent_class: Option<Value>,
    #[serde(rename = "opponent_schools")]
    pub opponent_school: Option<Value>,
    pub is_win: Option<Value>,
    pub duration: Option<Value>,
    pub source_type: Option<Value>,
    pub score_ratio: Option<Value>,

    // Canonical equipment keys.
    #[serde(rename = "spirit_animal")]
    pub companions: Option<Value>,
    #[serde(rename = "spirit_animal_talents")]
    pub companion_talents: Option<Value>,
    #[serde(rename = "legendary_runes")]
    pub legendary_items: Option<Value>,
    #[serde(rename = "super_armor")]
    pub special_gear: Option<Value>,

    // Legacy keys.
    pub pet_list: Option<Value>,
    pub pet_talent_list: Option<Value>,
    pub rune_list: Option<Value>,
    pub armor: Option<Value>,

    // Alternate spellings of the keys above.
    #[serde(rename = "sourceType")]
    pub source_type_alt: Option<Value>,
    #[serde(rename = "companions")]
    pub companions_alt: Option<Value>,
    #[serde(rename = "companionTalents")]
    pub companion_talents_alt: Option<Value>,
    #[serde(rename = "legendaryItems")]
    pub legendary_items_alt: Option<Value>,
    #[serde(rename = "specialGear")]
    pub special_gear_alt: Option<Value>,
    #[serde(rename = "petList")]
    pub pet_list_alt: Option<Value>,
    #[serde(rename = "petTalentList")]
    pub pet_talent_list_alt: Option<Value>,
    #[serde(rename = "runeList")]
    pub rune_list_alt: Option<Value>,
}

impl RawEvent {
    /// The server id coerced to an integer, if possible.
    pub fn server_id(&self) -> Option<i64> {
        self.server.as_ref().and_then(coerce_int)
    }

    /// Build a persisted record tagged with `source_type`.
    ///
    /// `server`, `timestamp`, `level`, `class` and `schools` are mandatory.
    /// Opponent dimensions, win flag, duration and score ratio default to 0.
    /// Only canonical equipment fields are read; run the field normalizer
    /// first if legacy aliases should be honoured.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::MissingField`] for an absent mandatory field and
    /// [`TypeError::InvalidField`] for any value that cannot be coerced.
    pub fn to_record(&self, source_type: i32) -> Result<MatchRecord, TypeError> {
        let mut record = MatchRecord::new(
            required(&self.server, "server")?,
            required(&self.timestamp, "timestamp")?,
            required(&self.level, "level")?,
            narrow(required(&self.own_class, "class")?, "class")?,
            narrow(required(&self.own_school, "schools")?, "schools")?,
        );

        record.opponent_class = narrow(
            optional(&self.opponent_class, "opponent_class")?.unwrap_or(0),
            "opponent_class",
        )?;
        record.opponent_school = narrow(
            optional(&self.opponent_school, "opponent_schools")?.unwrap_or(0),
            "opponent_schools",
        )?;
        record.is_win = narrow(optional(&self.is_win, "is_win")?.unwrap_or(0), "is_win")?;
        record.duration_seconds = optional(&self.duration, "duration")?.unwrap_or(0);
        record.score_ratio = optional(&self.score_ratio, "score_ratio")?.unwrap_or(0);
        record.special_gear = optional(&self.special_gear, "super_armor")?;
        record.source_type = source_type;

        record.set_companions(
            int_list(&self.companions, "spirit_animal")?,
            int_list(&self.companion_talents, "spirit_animal_talents")?,
        );
        record.set_legendary_items(int_list(&self.legendary_items, "legendary_runes")?);

        Ok(record)
    }
}

/// Coerce a loosely-typed JSON value to an integer.
///
/// Integers pass through, finite floats truncate toward zero, booleans map
/// to 0/1 and strings are parsed after trimming. Everything else (null,
/// arrays, objects, unparseable strings) yields `None`.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn invalid(field: &'static str, value: &Value) -> TypeError {
    TypeError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn required(value: &Option<Value>, field: &'static str) -> Result<i64, TypeError> {
    optional(value, field)?.ok_or(TypeError::MissingField(field))
}

fn optional(value: &Option<Value>, field: &'static str) -> Result<Option<i64>, TypeError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => coerce_int(v).map(Some).ok_or_else(|| invalid(field, v)),
    }
}

fn narrow(value: i64, field: &'static str) -> Result<i32, TypeError> {
    i32::try_from(value).map_err(|_| TypeError::InvalidField {
        field,
        value: value.to_string(),
    })
}

fn int_list(value: &Option<Value>, field: &'static str) -> Result<Vec<i64>, TypeError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| coerce_int(item).ok_or_else(|| invalid(field, item)))
            .collect(),
        Some(other) => Err(invalid(field, other)),
    }
}
