//! Coercion of loosely formatted model output into typed, nullable values
//!
//! Anything that does not clearly denote a value becomes `None`. Nothing is
//! ever defaulted to zero or `false`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9.,]*").expect("number pattern is valid"));

/// Values models use for "unknown"
const PLACEHOLDERS: &[&str] = &[
    "", "-", "--", "n/a", "na", "none", "null", "nil", "unknown", "onbekend", "niet bekend",
    "nvt", "n.v.t.",
];

const TRUE_WORDS: &[&str] = &["ja", "yes", "true", "y", "aanwezig", "1"];
const FALSE_WORDS: &[&str] = &["nee", "no", "false", "n", "niet aanwezig", "geen", "0"];

fn is_placeholder(s: &str) -> bool {
    PLACEHOLDERS.contains(&s.to_lowercase().as_str())
}

pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!is_placeholder(trimmed)).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "ja" } else { "nee" }.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

pub fn decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub fn integer(value: &Value) -> Option<i64> {
    let number = decimal(value)?;
    if number.fract() != 0.0 || !number.is_finite() || number.abs() > i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}

pub fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => {
            let word = s.trim().trim_end_matches('.').to_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                Some(true)
            } else if FALSE_WORDS.contains(&word.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// First number in a free-text value, read with Dutch conventions
///
/// `,` is the decimal separator and `.` groups thousands. A lone `.` followed
/// by something other than exactly three digits is read as a decimal point.
fn parse_number(s: &str) -> Option<f64> {
    let token = NUMBER.find(s)?.as_str().trim_end_matches(['.', ',']);

    let normalized = match (token.rfind(','), token.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => token.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => token.replace(',', ""),
        (Some(_), None) if token.matches(',').count() > 1 => token.replace(',', ""),
        (Some(_), None) => token.replace(',', "."),
        (None, Some(_)) if token.matches('.').count() > 1 => token.replace('.', ""),
        (None, Some(dot)) if token.len() - dot - 1 == 3 => token.replace('.', ""),
        _ => token.to_string(),
    };
    normalized.parse().ok()
}

pub(crate) fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Value::deserialize(d).map(|v| text(&v))
}

pub(crate) fn de_integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Value::deserialize(d).map(|v| integer(&v))
}

pub(crate) fn de_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Value::deserialize(d).map(|v| decimal(&v))
}

pub(crate) fn de_boolean<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Value::deserialize(d).map(|v| boolean(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text() {
        assert_eq!(text(&json!("  Nobelstraat 37 C ")).as_deref(), Some("Nobelstraat 37 C"));
        assert_eq!(text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(text(&json!(["Lift", "Dakterras"])).as_deref(), Some("Lift, Dakterras"));
        assert_eq!(text(&json!("Onbekend")), None);
        assert_eq!(text(&json!("")), None);
        assert_eq!(text(&json!(null)), None);
        assert_eq!(text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_prices_and_areas() {
        assert_eq!(integer(&json!("€ 425.000 k.k.")), Some(425_000));
        assert_eq!(integer(&json!("€ 1.495.000 v.o.n.")), Some(1_495_000));
        assert_eq!(decimal(&json!("85 m²")), Some(85.0));
        assert_eq!(decimal(&json!("€ 4.250 per m²")), Some(4250.0));
        assert_eq!(decimal(&json!("€ 152,50 per maand")), Some(152.5));
        assert_eq!(decimal(&json!("85.5")), Some(85.5));
        assert_eq!(decimal(&json!("1,234.56")), Some(1234.56));
        assert_eq!(decimal(&json!(250.75)), Some(250.75));
    }

    #[test]
    fn test_integers() {
        assert_eq!(integer(&json!(3)), Some(3));
        assert_eq!(integer(&json!("1930")), Some(1930));
        assert_eq!(integer(&json!("4 kamers")), Some(4));
        assert_eq!(integer(&json!(2.0)), Some(2));
        assert_eq!(integer(&json!(2.5)), None);
        assert_eq!(integer(&json!("2,5")), None);
    }

    #[test]
    fn test_invalid_numbers_are_null_not_zero() {
        assert_eq!(integer(&json!("Prijs op aanvraag")), None);
        assert_eq!(decimal(&json!("")), None);
        assert_eq!(decimal(&json!(null)), None);
        assert_eq!(decimal(&json!(true)), None);
        assert_eq!(integer(&json!(["3"])), None);
    }

    #[test]
    fn test_booleans() {
        assert_eq!(boolean(&json!(true)), Some(true));
        assert_eq!(boolean(&json!("Ja")), Some(true));
        assert_eq!(boolean(&json!("nee.")), Some(false));
        assert_eq!(boolean(&json!(0)), Some(false));
        assert_eq!(boolean(&json!("misschien")), None);
        assert_eq!(boolean(&json!(null)), None);
        assert_eq!(boolean(&json!(7)), None);
    }
}
