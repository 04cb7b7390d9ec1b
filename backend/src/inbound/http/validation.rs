//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request payloads arrive as plain strings; these helpers convert them into
//! domain newtypes and fold any failure into a `400` with structured details
//! naming the offending field.

use serde_json::json;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Map a domain newtype validation failure onto a `400` naming the field.
pub(crate) fn invalid_field_error(field: FieldName, error: impl Display) -> Error {
    let field = field.as_str();
    ValidationError::new(field, error.to_string()).with_code(ErrorCode::InvalidValue)
}

/// Parse a domain newtype from a string field via its fallible constructor.
pub(crate) fn parse_field<T, E>(
    value: String,
    field: FieldName,
    construct: impl FnOnce(String) -> Result<T, E>,
) -> Result<T, Error>
where
    E: Display,
{
    construct(value).map_err(|error| invalid_field_error(field, error))
}

/// Parse an enumerated value such as a document kind from its wire name.
pub(crate) fn parse_enum<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|error| invalid_field_error(field, error))
}
