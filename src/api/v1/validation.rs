//! Field validation for request bodies.

use std::collections::BTreeMap;

use axum::{Json, http::StatusCode};
use chrono::{DateTime, SecondsFormat, Utc};

use super::{ErrorResponse, HandlerError};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

/// Collects per-field messages; empty means the input is valid.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A non-blank string of at most `max` characters.
    pub fn text(
        &mut self,
        field: &str,
        value: Option<String>,
        max: usize,
        required: bool,
    ) -> Option<String> {
        let Some(value) = value else {
            if required {
                self.add(field, REQUIRED);
            }
            return None;
        };

        if value.trim().is_empty() {
            self.add(field, BLANK);
            None
        } else if value.chars().count() > max {
            self.add(
                field,
                format!("Ensure this field has no more than {} characters.", max),
            );
            None
        } else {
            Some(value)
        }
    }

    /// A `#rgb` or `#rrggbb` color.
    pub fn color(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = value?;
        if is_valid_color(&value) {
            Some(value)
        } else {
            self.add(field, "Enter a valid color in #rgb or #rrggbb form.");
            None
        }
    }

    /// An RFC 3339 timestamp, normalised to UTC.
    pub fn deadline(&mut self, field: &str, value: Option<String>, required: bool) -> Option<String> {
        let Some(value) = value else {
            if required {
                self.add(field, REQUIRED);
            }
            return None;
        };

        match parse_deadline(&value) {
            Some(normalised) => Some(normalised),
            None => {
                self.add(
                    field,
                    "Datetime has wrong format. Use RFC 3339, e.g. 2030-01-01T12:00:00Z.",
                );
                None
            }
        }
    }

    /// Turn collected messages into a 400 response.
    pub fn finish(self) -> Result<(), HandlerError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(validation_failed(self.0))
        }
    }
}

fn validation_failed(fields: BTreeMap<String, Vec<String>>) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Validation failed".to_string(),
            fields: Some(fields),
        }),
    )
}

/// Single-field validation failure.
pub fn field_error(field: &str, message: impl Into<String>) -> HandlerError {
    validation_failed(BTreeMap::from([(field.to_string(), vec![message.into()])]))
}

pub fn is_valid_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn parse_deadline(value: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        })
}

/// Query-string boolean: `true`/`t`/`1` and `false`/`f`/`0`, any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}
