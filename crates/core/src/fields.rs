//! Field-level payload contract helpers.
//!
//! Resources declare their fields explicitly and read them out of a JSON
//! object through [`Payload`]; every failure is recorded per field in
//! [`FieldErrors`] so a client sees all problems at once.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Key used for errors that are not attached to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";

/// Field name -> messages, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, msg: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(msg.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(value)` if nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl core::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for msg in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {msg}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A JSON object body, viewed field by field.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    map: &'a Map<String, Value>,
}

/// What a payload holds for one declared field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Null,
    Present(&'a Value),
}

impl<'a> Payload<'a> {
    /// Only JSON objects are accepted as payloads.
    pub fn from_json(value: &'a Value) -> Result<Self, FieldErrors> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => {
                let mut errors = FieldErrors::new();
                errors.add(
                    NON_FIELD_ERRORS,
                    format!("Invalid data. Expected a dictionary, but got {}.", json_type_name(other)),
                );
                Err(errors)
            }
        }
    }

    pub fn field(&self, name: &str) -> FieldValue<'a> {
        match self.map.get(name) {
            None => FieldValue::Missing,
            Some(Value::Null) => FieldValue::Null,
            Some(v) => FieldValue::Present(v),
        }
    }
}

/// Rules for a text field.
#[derive(Debug, Clone, Copy)]
pub struct TextRules {
    pub max_chars: Option<usize>,
    pub allow_blank: bool,
}

impl TextRules {
    pub const fn new() -> Self {
        Self { max_chars: None, allow_blank: false }
    }

    pub const fn max_chars(mut self, n: usize) -> Self {
        self.max_chars = Some(n);
        self
    }

    pub const fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }
}

impl Default for TextRules {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a text value: strings are trimmed, numbers are taken in their
/// decimal form, anything else is rejected.
pub fn parse_text(value: &Value, rules: TextRules) -> Result<String, String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(NOT_A_STRING.to_string()),
    };

    if text.is_empty() && !rules.allow_blank {
        return Err(NOT_BLANK.to_string());
    }
    if let Some(max) = rules.max_chars {
        if text.chars().count() > max {
            return Err(format!("Ensure this field has no more than {max} characters."));
        }
    }
    Ok(text)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field is required.");
        errors.add("price", "A valid number is required.");
        errors.add("price", "Ensure this value is greater than or equal to 0.");

        assert_eq!(errors.get("price").unwrap().len(), 2);
        assert!(errors.contains("name"));
        assert!(!errors.contains("stock"));
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut errors = FieldErrors::new();
        errors.add("username", "A user with that username already exists.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "username": ["A user with that username already exists."] })
        );
    }

    #[test]
    fn into_result_passes_value_through_when_empty() {
        assert_eq!(FieldErrors::new().into_result(7), Ok(7));

        let mut errors = FieldErrors::new();
        errors.add(NON_FIELD_ERRORS, "Invalid data.");
        assert!(errors.into_result(7).is_err());
    }

    #[test]
    fn payload_must_be_an_object() {
        let value = serde_json::json!(["name"]);
        let errors = Payload::from_json(&value).unwrap_err();
        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            ["Invalid data. Expected a dictionary, but got list.".to_string()]
        );
    }

    #[test]
    fn field_distinguishes_missing_from_null() {
        let value = serde_json::json!({ "a": null, "b": 1 });
        let payload = Payload::from_json(&value).unwrap();
        assert_eq!(payload.field("a"), FieldValue::Null);
        assert_eq!(payload.field("c"), FieldValue::Missing);
        assert!(matches!(payload.field("b"), FieldValue::Present(_)));
    }

    #[test]
    fn parse_text_trims_and_enforces_rules() {
        let rules = TextRules::new().max_chars(5);
        assert_eq!(parse_text(&serde_json::json!("  abc "), rules).unwrap(), "abc");
        assert_eq!(parse_text(&serde_json::json!(42), rules).unwrap(), "42");
        assert_eq!(parse_text(&serde_json::json!("   "), rules).unwrap_err(), NOT_BLANK);
        assert_eq!(parse_text(&serde_json::json!(true), rules).unwrap_err(), NOT_A_STRING);
        assert_eq!(
            parse_text(&serde_json::json!("abcdef"), rules).unwrap_err(),
            "Ensure this field has no more than 5 characters."
        );
        assert_eq!(parse_text(&serde_json::json!(""), rules.allow_blank()).unwrap(), "");
    }

    #[test]
    fn display_joins_every_message() {
        let mut errors = FieldErrors::new();
        errors.add("b", "two");
        errors.add("a", "one");
        assert_eq!(errors.to_string(), "a: one; b: two");
    }
}
