//! Product field contract.
//!
//! Writable fields: `name`, `description`, `price`, `stock`, `category`,
//! `image_url`. Read-only fields (`id`, `created_at`, `updated_at`) and any
//! unknown keys are ignored when present in a payload.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use shopfront_core::fields::{self, FieldErrors, FieldValue, Payload, TextRules, NOT_NULL, REQUIRED};

use crate::product::PRICE_SCALE;

pub const NAME_MAX_CHARS: usize = 255;
pub const CATEGORY_MAX_CHARS: usize = 100;
pub const IMAGE_URL_MAX_CHARS: usize = 200;
pub const PRICE_MAX_DIGITS: u32 = 10;

const NAME: TextRules = TextRules::new().max_chars(NAME_MAX_CHARS);
const DESCRIPTION: TextRules = TextRules::new().allow_blank();
const CATEGORY: TextRules = TextRules::new().max_chars(CATEGORY_MAX_CHARS).allow_blank();

/// Every writable product field, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub image_url: Option<String>,
}

/// A validated partial update. `None` means "leave unchanged"; for
/// `image_url`, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub image_url: Option<Option<String>>,
}

impl ProductFields {
    /// Validate a create / full-update payload.
    ///
    /// `name` and `price` are required; `description` and `category` default
    /// to empty, `stock` to 0 and `image_url` to null.
    pub fn from_json(value: &Value) -> Result<Self, FieldErrors> {
        let payload = Payload::from_json(value)?;
        let mut errors = FieldErrors::new();

        let name = required(&payload, "name", &mut errors, |v| fields::parse_text(v, NAME));
        let price = required(&payload, "price", &mut errors, parse_price);
        let description = optional(&payload, "description", &mut errors, |v| {
            fields::parse_text(v, DESCRIPTION)
        });
        let stock = optional(&payload, "stock", &mut errors, parse_stock);
        let category = optional(&payload, "category", &mut errors, |v| {
            fields::parse_text(v, CATEGORY)
        });
        let image_url = nullable(&payload, "image_url", &mut errors, parse_image_url);

        match (name, price) {
            (Some(name), Some(price)) if errors.is_empty() => Ok(Self {
                name,
                description: description.unwrap_or_default(),
                price,
                stock: stock.unwrap_or(0),
                category: category.unwrap_or_default(),
                image_url: image_url.flatten(),
            }),
            _ => Err(errors),
        }
    }
}

impl ProductPatch {
    /// Validate a partial-update payload: only supplied keys are checked.
    pub fn from_json(value: &Value) -> Result<Self, FieldErrors> {
        let payload = Payload::from_json(value)?;
        let mut errors = FieldErrors::new();

        let patch = Self {
            name: optional(&payload, "name", &mut errors, |v| fields::parse_text(v, NAME)),
            description: optional(&payload, "description", &mut errors, |v| {
                fields::parse_text(v, DESCRIPTION)
            }),
            price: optional(&payload, "price", &mut errors, parse_price),
            stock: optional(&payload, "stock", &mut errors, parse_stock),
            category: optional(&payload, "category", &mut errors, |v| {
                fields::parse_text(v, CATEGORY)
            }),
            image_url: nullable(&payload, "image_url", &mut errors, parse_image_url),
        };

        errors.into_result(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn required<T>(
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
        _ => optional(payload, field, errors, parse),
    }
}

fn optional<T>(
    payload: &Payload<'_>,
    field: &str,
    errors: &mut FieldErrors,
    parse: impl FnOnce(&Value) -> Result<T, String>,
) -> Option<T> {
    match payload.field(field) {
        FieldValue::Missing => None,
        FieldValue::Null => {
            errors.add(field, NOT_NULL);
            None
        }
        FieldValue::Present(v) => parse(v).map_err(|msg| errors.add(field, msg)).ok(),
    }
}

// Outer `None`: key absent. `Some(None)`: explicit null.
fn nullable<T>(
    payload: &Payload<'_>,
    field: &str,
    errors: &mut FieldErrors,
    parse: impl FnOnce(&Value) -> Result<Option<T>, String>,
) -> Option<Option<T>> {
    match payload.field(field) {
        FieldValue::Missing => None,
        FieldValue::Null => Some(None),
        FieldValue::Present(v) => parse(v).map_err(|msg| errors.add(field, msg)).ok(),
    }
}

/// Decimal with at most 10 digits, 2 of them after the point, never negative.
///
/// Digits are counted as written, so trailing zeros count: `"1.500"` has 3
/// decimal places.
fn parse_price(value: &Value) -> Result<Decimal, String> {
    const INVALID: &str = "A valid number is required.";

    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(INVALID.to_string()),
    };
    let price = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| INVALID.to_string())?;

    let digits = digit_count(&price);
    let decimals = price.scale();
    let whole_digits = digits.saturating_sub(decimals);
    let max_whole = PRICE_MAX_DIGITS - PRICE_SCALE;

    if digits > PRICE_MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
        ));
    }
    if decimals > PRICE_SCALE {
        return Err(format!(
            "Ensure that there are no more than {PRICE_SCALE} decimal places."
        ));
    }
    if whole_digits > max_whole {
        return Err(format!(
            "Ensure that there are no more than {max_whole} digits before the decimal point."
        ));
    }
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }

    let mut price = price;
    price.rescale(PRICE_SCALE);
    Ok(price)
}

fn digit_count(d: &Decimal) -> u32 {
    let mantissa = d.mantissa().unsigned_abs();
    if mantissa == 0 {
        1
    } else {
        mantissa.ilog10() + 1
    }
}

/// Non-negative integer that fits a 32-bit column.
fn parse_stock(value: &Value) -> Result<i32, String> {
    const INVALID: &str = "A valid integer is required.";

    let n: i64 = match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e18 => f as i64,
            _ => return Err(INVALID.to_string()),
        },
        Value::String(s) => s.trim().parse().map_err(|_| INVALID.to_string())?,
        _ => return Err(INVALID.to_string()),
    };

    if n < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    i32::try_from(n).map_err(|_| format!("Ensure this value is less than or equal to {}.", i32::MAX))
}

/// Absolute http(s) URL; an empty string means "no image".
fn parse_image_url(value: &Value) -> Result<Option<String>, String> {
    let Value::String(s) = value else {
        return Err(fields::NOT_A_STRING.to_string());
    };
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if s.chars().count() > IMAGE_URL_MAX_CHARS {
        return Err(format!(
            "Ensure this field has no more than {IMAGE_URL_MAX_CHARS} characters."
        ));
    }

    let parsed = url::Url::parse(s).map_err(|_| "Enter a valid URL.".to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err("Enter a valid URL.".to_string());
    }
    Ok(Some(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn full_payload_is_accepted() {
        let fields = ProductFields::from_json(&json!({
            "name": "  Desk Lamp ",
            "description": "Warm light",
            "price": "19.9",
            "stock": 12,
            "category": "lighting",
            "image_url": "https://cdn.example.com/lamp.png",
        }))
        .unwrap();

        assert_eq!(fields.name, "Desk Lamp");
        assert_eq!(fields.price, dec("19.90"));
        assert_eq!(fields.price.scale(), 2);
        assert_eq!(fields.stock, 12);
        assert_eq!(fields.image_url.as_deref(), Some("https://cdn.example.com/lamp.png"));
    }

    #[test]
    fn optional_fields_take_defaults() {
        let fields = ProductFields::from_json(&json!({ "name": "Mug", "price": 4 })).unwrap();
        assert_eq!(fields.description, "");
        assert_eq!(fields.category, "");
        assert_eq!(fields.stock, 0);
        assert_eq!(fields.image_url, None);
        assert_eq!(fields.price, dec("4.00"));
    }

    #[test]
    fn missing_required_fields_are_reported_together() {
        let errors = ProductFields::from_json(&json!({ "description": "x" })).unwrap_err();
        assert_eq!(errors.get("name").unwrap(), [REQUIRED.to_string()]);
        assert_eq!(errors.get("price").unwrap(), [REQUIRED.to_string()]);
    }

    #[test]
    fn read_only_and_unknown_keys_are_ignored() {
        let fields = ProductFields::from_json(&json!({
            "id": "0190b1d2-0000-7000-8000-000000000000",
            "name": "Mug",
            "price": "4.00",
            "created_at": "1999-01-01T00:00:00Z",
            "updated_at": "1999-01-01T00:00:00Z",
            "colour": "blue",
        }))
        .unwrap();
        assert_eq!(fields.name, "Mug");
    }

    #[test]
    fn wrong_types_are_rejected_per_field() {
        let errors = ProductFields::from_json(&json!({
            "name": ["Mug"],
            "price": "cheap",
            "stock": 1.5,
            "category": {},
            "image_url": 7,
        }))
        .unwrap_err();

        assert!(errors.contains("name"));
        assert_eq!(errors.get("price").unwrap(), ["A valid number is required.".to_string()]);
        assert_eq!(errors.get("stock").unwrap(), ["A valid integer is required.".to_string()]);
        assert!(errors.contains("category"));
        assert!(errors.contains("image_url"));
    }

    #[test]
    fn null_is_only_allowed_for_image_url() {
        let errors = ProductFields::from_json(&json!({
            "name": "Mug",
            "price": "1.00",
            "description": null,
            "image_url": null,
        }))
        .unwrap_err();
        assert_eq!(errors.get("description").unwrap(), [NOT_NULL.to_string()]);
        assert!(!errors.contains("image_url"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let errors = ProductFields::from_json(&json!({ "name": "   ", "price": 1 })).unwrap_err();
        assert_eq!(errors.get("name").unwrap(), [fields::NOT_BLANK.to_string()]);
    }

    #[test]
    fn price_precision_limits() {
        assert_eq!(parse_price(&json!("12345678.99")).unwrap(), dec("12345678.99"));
        assert_eq!(parse_price(&json!(0)).unwrap(), dec("0.00"));
        assert_eq!(parse_price(&json!("1.50")).unwrap(), dec("1.50"));
        assert_eq!(parse_price(&json!("1e2")).unwrap(), dec("100.00"));

        assert_eq!(
            parse_price(&json!("1.999")).unwrap_err(),
            "Ensure that there are no more than 2 decimal places."
        );
        assert_eq!(
            parse_price(&json!("1.500")).unwrap_err(),
            "Ensure that there are no more than 2 decimal places."
        );
        assert_eq!(
            parse_price(&json!("12345678.990")).unwrap_err(),
            "Ensure that there are no more than 10 digits in total."
        );
        assert_eq!(
            parse_price(&json!("123456789.99")).unwrap_err(),
            "Ensure that there are no more than 10 digits in total."
        );
        assert_eq!(
            parse_price(&json!("123456789")).unwrap_err(),
            "Ensure that there are no more than 8 digits before the decimal point."
        );
        assert_eq!(
            parse_price(&json!(-1)).unwrap_err(),
            "Ensure this value is greater than or equal to 0."
        );
        assert!(parse_price(&json!(true)).is_err());
    }

    #[test]
    fn stock_limits() {
        assert_eq!(parse_stock(&json!("7")).unwrap(), 7);
        assert_eq!(parse_stock(&json!(3.0)).unwrap(), 3);
        assert!(parse_stock(&json!(-1)).is_err());
        assert!(parse_stock(&json!(i64::from(i32::MAX) + 1)).is_err());
        assert!(parse_stock(&json!("seven")).is_err());
    }

    #[test]
    fn image_url_must_be_http_or_https() {
        assert_eq!(parse_image_url(&json!("")).unwrap(), None);
        assert!(parse_image_url(&json!("ftp://example.com/a.png")).is_err());
        assert!(parse_image_url(&json!("not a url")).is_err());
        assert!(parse_image_url(&json!("/relative/path.png")).is_err());

        let long = format!("https://example.com/{}", "a".repeat(IMAGE_URL_MAX_CHARS));
        assert!(parse_image_url(&json!(long)).is_err());
    }

    #[test]
    fn patch_checks_only_supplied_keys() {
        let patch = ProductPatch::from_json(&json!({ "stock": 5 })).unwrap();
        assert_eq!(patch.stock, Some(5));
        assert_eq!(patch.name, None);
        assert_eq!(patch.price, None);

        let errors = ProductPatch::from_json(&json!({ "price": "-3" })).unwrap_err();
        assert!(errors.contains("price"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn patch_distinguishes_clearing_from_leaving_image_url() {
        let cleared = ProductPatch::from_json(&json!({ "image_url": null })).unwrap();
        assert_eq!(cleared.image_url, Some(None));

        let untouched = ProductPatch::from_json(&json!({})).unwrap();
        assert_eq!(untouched.image_url, None);
        assert!(untouched.is_empty());
    }

    #[test]
    fn patch_ignores_timestamps() {
        let patch = ProductPatch::from_json(&json!({ "updated_at": "2000-01-01T00:00:00Z" })).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let errors = ProductFields::from_json(&json!("Mug")).unwrap_err();
        assert!(errors.contains(fields::NON_FIELD_ERRORS));
        let errors = ProductPatch::from_json(&json!(null)).unwrap_err();
        assert!(errors.contains(fields::NON_FIELD_ERRORS));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: any cents amount within the column round-trips through
            /// its string form unchanged.
            #[test]
            fn valid_prices_are_accepted(cents in 0i64..=9_999_999_999i64) {
                let price = Decimal::new(cents, 2);
                let parsed = parse_price(&json!(price.to_string())).unwrap();
                prop_assert_eq!(parsed, price);
                prop_assert_eq!(parsed.scale(), 2);
            }

            /// Property: timestamp keys never influence the validated fields.
            #[test]
            fn timestamps_never_leak_into_fields(
                name in "[A-Za-z][A-Za-z0-9 ]{0,40}",
                stamp in "[0-9]{4}-[0-9]{2}-[0-9]{2}T00:00:00Z",
            ) {
                let plain = ProductFields::from_json(&json!({ "name": name, "price": "1.00" })).unwrap();
                let stamped = ProductFields::from_json(&json!({
                    "name": name,
                    "price": "1.00",
                    "created_at": stamp,
                    "updated_at": stamp,
                }))
                .unwrap();
                prop_assert_eq!(plain, stamped);
            }
        }
    }
}
