//! Lenient decoders for Tautulli's loosely typed JSON.
//!
//! Tautulli serializes most numbers as strings (`"stream_count": "2"`) and
//! flags as `0`/`1`, `"0"`/`"1"` or real booleans depending on the field and
//! server version. These helpers accept every form and reject anything else.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(u64),
    Float(f64),
    Text(String),
}

pub fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Loose::Int(n)) => Ok(n),
        Some(Loose::Float(f)) if f >= 0.0 => Ok(f as u64),
        Some(Loose::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<u64>()
                .or_else(|_| s.parse::<f64>().map(|f| f.max(0.0) as u64))
                .map_err(|_| D::Error::custom(format!("expected a number, got `{s}`")))
        }
        Some(_) => Err(D::Error::custom("expected a non-negative number")),
    }
}

pub fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Loose::Int(n)) => Ok(n as f64),
        Some(Loose::Float(f)) => Ok(f),
        Some(Loose::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0.0);
            }
            s.parse::<f64>()
                .map_err(|_| D::Error::custom(format!("expected a number, got `{s}`")))
        }
        Some(Loose::Bool(_)) => Err(D::Error::custom("expected a number, got a boolean")),
    }
}

pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Loose::Bool(b)) => Ok(b),
        Some(Loose::Int(n)) => Ok(n != 0),
        Some(Loose::Float(f)) => Ok(f != 0.0),
        Some(Loose::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(D::Error::custom(format!("expected a flag, got `{other}`"))),
        },
    }
}

/// Text field that may arrive as a number (`year`, `media_index`) or null
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => String::new(),
        Some(Loose::Bool(b)) => b.to_string(),
        Some(Loose::Int(n)) => n.to_string(),
        Some(Loose::Float(f)) => f.to_string(),
        Some(Loose::Text(s)) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize_u64")]
        count: u64,
        #[serde(default, deserialize_with = "deserialize_f64")]
        percent: f64,
        #[serde(default, deserialize_with = "deserialize_flag")]
        secure: bool,
        #[serde(default, deserialize_with = "deserialize_text")]
        year: String,
    }

    fn probe(value: serde_json::Value) -> Probe {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers_accept_strings_and_nulls() {
        let p = probe(json!({"count": "3", "percent": "42.5"}));
        assert_eq!(p.count, 3);
        assert_eq!(p.percent, 42.5);

        let p = probe(json!({"count": null, "percent": ""}));
        assert_eq!(p.count, 0);
        assert_eq!(p.percent, 0.0);

        let p = probe(json!({}));
        assert_eq!(p.count, 0);
    }

    #[test]
    fn test_garbage_number_is_rejected() {
        let result: Result<Probe, _> = serde_json::from_value(json!({"count": "lots"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_flags() {
        assert!(probe(json!({"secure": 1})).secure);
        assert!(probe(json!({"secure": "1"})).secure);
        assert!(probe(json!({"secure": true})).secure);
        assert!(!probe(json!({"secure": "0"})).secure);
        assert!(!probe(json!({"secure": null})).secure);
    }

    #[test]
    fn test_text_accepts_numbers() {
        assert_eq!(probe(json!({"year": 1999})).year, "1999");
        assert_eq!(probe(json!({"year": "2004"})).year, "2004");
        assert_eq!(probe(json!({"year": null})).year, "");
    }
}
