//! Core domain types used across all microservices

use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated destination number as returned by a number lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberDetails {
    /// Normalized E.164 number, e.g. `+15551234567`
    pub phone_number: String,
    /// ISO-3166 alpha-2 country, when the lookup could determine one
    pub country_code: Option<String>,
    pub national_format: Option<String>,
}

impl NumberDetails {
    pub fn new(phone_number: impl Into<String>, country_code: Option<&str>) -> Self {
        Self {
            phone_number: phone_number.into(),
            country_code: country_code.map(str::to_string),
            national_format: None,
        }
    }
}

/// Call-flow identifier (`FW...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowSid(pub String);

impl FlowSid {
    pub fn new(sid: impl Into<String>) -> Self {
        Self(sid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flow execution identifier (`FN...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionSid(pub String);

impl ExecutionSid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
