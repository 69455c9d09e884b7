use serde_json::Value;

use shopfront_core::fields::{self, FieldErrors, Payload, TextRules};

use crate::password::Password;
use crate::registration::{parse_password, read};

/// Username + password presented to obtain a token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Password,
}

impl Credentials {
    pub fn from_json(value: &Value) -> Result<Self, FieldErrors> {
        let payload = Payload::from_json(value)?;
        let mut errors = FieldErrors::new();

        let username = read(&payload, "username", &mut errors, |v| {
            fields::parse_text(v, TextRules::new())
        });
        let password = read(&payload, "password", &mut errors, parse_password);

        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => Ok(Self { username, password }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn both_fields_required() {
        let errors = Credentials::from_json(&json!({ "username": "alice" })).unwrap_err();
        assert!(errors.contains("password"));
        assert!(!errors.contains("username"));
    }

    #[test]
    fn accepts_plain_pair() {
        let creds = Credentials::from_json(&json!({ "username": "alice", "password": "pw" })).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password.expose(), "pw");
    }
}
