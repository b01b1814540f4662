//! Turning a raw completion into a JSON object
//!
//! Models wrap their answer in code fences, add prose around it, forget commas
//! between lines or leave one before a closing brace. These are repaired; any
//! other malformation is reported so the request can be resubmitted.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::error::ResponseError;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid"));

/// Remove surrounding markdown code fences, with or without a language tag
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag
    let body = rest
        .split_once('\n')
        .map_or(rest.trim_start_matches(char::is_alphabetic), |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Outermost `{...}` of the text, if any
fn isolate_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn ends_value(line: &str) -> bool {
    line.ends_with('"')
        || line.ends_with('}')
        || line.ends_with(']')
        || line.ends_with("true")
        || line.ends_with("false")
        || line.ends_with("null")
        || line.chars().last().is_some_and(|c| c.is_ascii_digit())
}

/// Insert missing commas between a value line and a following key line, and
/// drop commas before a closing bracket
pub fn repair_json(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let mut repaired = String::with_capacity(text.len() + 16);

    for (i, line) in lines.iter().enumerate() {
        repaired.push_str(line);
        let next = lines[i + 1..].iter().map(|l| l.trim()).find(|l| !l.is_empty());
        if let Some(next) = next {
            let current = line.trim();
            if next.starts_with('"') && ends_value(current) && !current.ends_with(',') {
                repaired.push(',');
            }
        }
        repaired.push('\n');
    }

    TRAILING_COMMA.replace_all(&repaired, "$1").into_owned()
}

/// Parse a completion into a JSON object
pub fn parse_response(response: &str) -> Result<Map<String, Value>, ResponseError> {
    let unfenced = strip_code_fences(response);
    let object = isolate_object(unfenced).ok_or(ResponseError::NoJsonObject)?;

    let value: Value = match serde_json::from_str(object) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(&repair_json(object))
            .map_err(|e| ResponseError::Malformed(e.to_string()))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ResponseError::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_clean_object() {
        let map = parse_response("{\"city\": \"Rotterdam\", \"bedrooms\": 2}").unwrap();
        assert_eq!(map["city"], "Rotterdam");
        assert_eq!(map["bedrooms"], 2);
    }

    #[test]
    fn test_parse_fenced_with_prose() {
        let response = "Here is the data:\n```json\n{\n  \"city\": \"Rotterdam\"\n}\n```\nLet me know!";
        let map = parse_response(response).unwrap();
        assert_eq!(map["city"], "Rotterdam");
    }

    #[test]
    fn test_repairs_missing_commas() {
        let response = r#"{
  "address": "Nobelstraat 37 C"
  "bedrooms": 2
  "reserve_fund": true
  "facilities": ["Lift"]
  "energy_label": null
  "city": "Rotterdam"
}"#;
        let map = parse_response(response).unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map["address"], "Nobelstraat 37 C");
        assert_eq!(map["energy_label"], Value::Null);
    }

    #[test]
    fn test_repairs_trailing_comma() {
        let map = parse_response("{\n  \"city\": \"Rotterdam\",\n  \"tags\": [\"a\", \"b\",],\n}").unwrap();
        assert_eq!(map["city"], "Rotterdam");
        assert_eq!(map["tags"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_rejects_unrepairable() {
        assert!(matches!(
            parse_response("I could not find any listing data."),
            Err(ResponseError::NoJsonObject)
        ));
        assert!(matches!(
            parse_response("{\"city\": Rotterdam}"),
            Err(ResponseError::Malformed(_))
        ));
        assert!(matches!(parse_response("} {"), Err(ResponseError::NoJsonObject)));
    }
}
