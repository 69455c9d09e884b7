//! Account registration contract.
//!
//! Input: `username`, `email`, `password` (all required). Output: `username`
//! and `email` only; the password is write-only.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use shopfront_core::fields::{self, FieldErrors, FieldValue, Payload, TextRules, NOT_NULL, REQUIRED};

use crate::password::Password;
use crate::user::{NewAccount, UserAccount};

pub const USERNAME_MAX_CHARS: usize = 150;
pub const EMAIL_MAX_CHARS: usize = 254;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

// Dotted domain of hyphen-safe labels; bare hosts like `localhost` are refused.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
    )
    .expect("compile email regex")
});

const USERNAME: TextRules = TextRules::new().max_chars(USERNAME_MAX_CHARS);
const EMAIL: TextRules = TextRules::new().max_chars(EMAIL_MAX_CHARS);

/// A validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: Password,
}

/// What a successful sign-up returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub username: String,
    pub email: String,
}

impl Registration {
    pub fn from_json(value: &Value) -> Result<Self, FieldErrors> {
        let payload = Payload::from_json(value)?;
        let mut errors = FieldErrors::new();

        let username = read(&payload, "username", &mut errors, parse_username);
        let email = read(&payload, "email", &mut errors, parse_email);
        let password = read(&payload, "password", &mut errors, parse_password);

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(Self {
                username,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }

    /// Combine with the already-computed hash; the plaintext is dropped here.
    pub fn into_new_account(self, password_hash: String) -> NewAccount {
        NewAccount {
            username: self.username,
            email: self.email,
            password_hash,
        }
    }
}

impl From<&UserAccount> for RegisteredUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            email: account.email.clone(),
        }
    }
}

/// Validation errors for a username that is already registered.
pub fn username_taken() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add("username", USERNAME_TAKEN);
    errors
}

pub(crate) fn read<T>(
    payload: &Payload<'_>,
    field: &str,
    errors: &mut FieldErrors,
    parse: impl FnOnce(&Value) -> Result<T, String>,
) -> Option<T> {
    match payload.field(field) {
        FieldValue::Missing => {
            errors.add(field, REQUIRED);
            None
        }
        FieldValue::Null => {
            errors.add(field, NOT_NULL);
            None
        }
        FieldValue::Present(v) => parse(v).map_err(|msg| errors.add(field, msg)).ok(),
    }
}

fn parse_username(value: &Value) -> Result<String, String> {
    let username = fields::parse_text(value, USERNAME)?;
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(username)
    } else {
        Err(INVALID_USERNAME.to_string())
    }
}

fn parse_email(value: &Value) -> Result<String, String> {
    let email = fields::parse_text(value, EMAIL)?;
    if EMAIL_REGEX.is_match(&email) {
        Ok(email)
    } else {
        Err(INVALID_EMAIL.to_string())
    }
}

/// Passwords are taken verbatim (no trimming) but may not be blank.
pub(crate) fn parse_password(value: &Value) -> Result<Password, String> {
    let Value::String(raw) = value else {
        return Err(fields::NOT_A_STRING.to_string());
    };
    if raw.trim().is_empty() {
        return Err(fields::NOT_BLANK.to_string());
    }
    Ok(Password::new(raw.clone()))
}
