//! Conversion between Unix epoch seconds and UTC points in time
//!
//! Slack exports write timestamps either as JSON numbers (`"created": 1433338283`)
//! or as numeric strings with microsecond precision (`"ts": "1433338283.000002"`).
//! Both forms decode to a [`DateTime<Utc>`]; encoding always produces a number.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

use crate::error::{Error, Result};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Encode a point in time as seconds since the Unix epoch
///
/// Whole seconds are written as integers so integral source values round-trip
/// unchanged; anything finer is written as a float with microsecond precision.
pub fn encode(t: &DateTime<Utc>) -> Result<Number> {
    let seconds = t.timestamp();
    let micros = t.timestamp_subsec_micros();
    if micros == 0 {
        return Ok(Number::from(seconds));
    }

    let value = seconds as f64 + f64::from(micros) / MICROS_PER_SECOND;
    Number::from_f64(value)
        .ok_or_else(|| Error::InvalidInput(format!("{t} can't be written as epoch seconds")))
}

/// Decode a JSON number or numeric string into a point in time
pub fn decode(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Number(number) => decode_number(number),
        Value::String(text) => decode_str(text),
        other => Err(malformed(other.to_string(), token_kind(other))),
    }
}

fn decode_number(number: &Number) -> Result<DateTime<Utc>> {
    if let Some(seconds) = number.as_i64() {
        return from_whole_seconds(seconds, || number.to_string(), "integer");
    }
    if let Some(seconds) = number.as_u64() {
        let seconds = i64::try_from(seconds).map_err(|_| malformed(number.to_string(), "integer"))?;
        return from_whole_seconds(seconds, || number.to_string(), "integer");
    }
    match number.as_f64() {
        Some(seconds) => from_fractional_seconds(seconds, || number.to_string(), "float"),
        None => Err(malformed(number.to_string(), "number")),
    }
}

fn decode_str(text: &str) -> Result<DateTime<Utc>> {
    let seconds: f64 = text
        .trim()
        .parse()
        .map_err(|_| malformed(text.to_string(), "string"))?;
    from_fractional_seconds(seconds, || text.to_string(), "string")
}

fn from_whole_seconds(
    seconds: i64,
    raw: impl Fn() -> String,
    kind: &'static str,
) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| malformed(raw(), kind))
}

fn from_fractional_seconds(
    seconds: f64,
    raw: impl Fn() -> String,
    kind: &'static str,
) -> Result<DateTime<Utc>> {
    if !seconds.is_finite() {
        return Err(malformed(raw(), kind));
    }

    let mut whole = seconds.floor();
    let mut micros = ((seconds - whole) * MICROS_PER_SECOND).round();
    if micros >= MICROS_PER_SECOND {
        whole += 1.0;
        micros = 0.0;
    }
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(malformed(raw(), kind));
    }

    DateTime::from_timestamp(whole as i64, micros as u32 * 1_000).ok_or_else(|| malformed(raw(), kind))
}

fn malformed(raw: String, kind: &'static str) -> Error {
    Error::MalformedTimestamp { raw, kind }
}

fn token_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serde adapter for `#[serde(with = "epoch_seconds")]` fields
pub mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::de::{self, MapAccess, SeqAccess, Visitor};
    use serde::{Deserializer, Serialize, Serializer};
    use std::fmt;

    pub fn serialize<S>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let number = super::encode(t).map_err(serde::ser::Error::custom)?;
        number.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(EpochVisitor)
    }

    struct EpochVisitor;

    impl<'de> Visitor<'de> for EpochVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a Unix epoch timestamp as a number or numeric string")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            super::from_whole_seconds(value, || value.to_string(), "integer").map_err(E::custom)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let seconds = i64::try_from(value)
                .map_err(|_| E::custom(super::malformed(value.to_string(), "integer")))?;
            super::from_whole_seconds(seconds, || value.to_string(), "integer").map_err(E::custom)
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            super::from_fractional_seconds(value, || value.to_string(), "float").map_err(E::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            super::decode_str(value).map_err(E::custom)
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Err(E::custom(super::malformed(value.to_string(), "boolean")))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Err(E::custom(super::malformed("null".to_string(), "null")))
        }

        fn visit_seq<A>(self, _seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            Err(de::Error::custom(super::malformed("[...]".to_string(), "array")))
        }

        fn visit_map<A>(self, _map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            Err(de::Error::custom(super::malformed("{...}".to_string(), "object")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stamped {
        #[serde(with = "epoch_seconds")]
        ts: DateTime<Utc>,
    }

    #[test]
    fn test_decode_integer() {
        let t = decode(&json!(1433338283)).unwrap();
        assert_eq!(t.timestamp(), 1433338283);
        assert_eq!(t.timestamp_subsec_micros(), 0);
    }

    #[test]
    fn test_decode_slack_string() {
        let t = decode(&json!("1433338283.000002")).unwrap();
        assert_eq!(t.timestamp(), 1433338283);
        assert_eq!(t.timestamp_subsec_micros(), 2);
    }

    #[test]
    fn test_decode_float() {
        let t = decode(&json!(1433338283.5)).unwrap();
        assert_eq!(t.timestamp(), 1433338283);
        assert_eq!(t.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_decode_rejects_non_numeric_string() {
        match decode(&json!("yesterday")) {
            Err(Error::MalformedTimestamp { raw, kind }) => {
                assert_eq!(raw, "yesterday");
                assert_eq!(kind, "string");
            }
            other => panic!("expected MalformedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_other_tokens() {
        for (value, expected_kind) in [
            (json!(true), "boolean"),
            (json!(null), "null"),
            (json!([1, 2]), "array"),
            (json!({"ts": 1}), "object"),
        ] {
            match decode(&value) {
                Err(Error::MalformedTimestamp { kind, .. }) => assert_eq!(kind, expected_kind),
                other => panic!("expected MalformedTimestamp for {value}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_rejects_nan_string() {
        assert!(matches!(
            decode(&json!("NaN")),
            Err(Error::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_encode_whole_seconds_as_integer() {
        let original = json!(1433338283);
        let encoded = encode(&decode(&original).unwrap()).unwrap();
        assert_eq!(Value::Number(encoded), original);
    }

    #[test]
    fn test_encode_decode_preserves_fraction() {
        let t = decode(&json!("1433338283.25")).unwrap();
        let encoded = encode(&t).unwrap();
        assert_eq!(encoded.as_f64(), Some(1433338283.25));
        assert_eq!(decode(&Value::Number(encoded)).unwrap(), t);
    }

    #[test]
    fn test_serde_field_accepts_both_forms() {
        let from_string: Stamped = serde_json::from_str(r#"{"ts": "1433338283.000002"}"#).unwrap();
        let from_number: Stamped = serde_json::from_str(r#"{"ts": 1433338283}"#).unwrap();
        assert_eq!(from_string.ts.timestamp(), from_number.ts.timestamp());

        let json = serde_json::to_string(&from_string).unwrap();
        let back: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(back, from_string);
    }

    #[test]
    fn test_serde_field_reports_token_kind() {
        let err = serde_json::from_str::<Stamped>(r#"{"ts": false}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("boolean"), "unexpected message: {message}");
        assert!(message.contains("false"), "unexpected message: {message}");
    }
}
