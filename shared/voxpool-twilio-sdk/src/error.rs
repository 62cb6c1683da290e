//! Twilio API errors

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwilioError>;

#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<u32>,
        message: String,
        more_info: Option<String>,
        details: Option<serde_json::Value>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error document returned on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<u32>,
    message: Option<String>,
    more_info: Option<String>,
    status: Option<u16>,
    details: Option<serde_json::Value>,
}

impl TwilioError {
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => TwilioError::Api {
                status: parsed.status.unwrap_or(status),
                code: parsed.code,
                message: parsed.message.unwrap_or_else(|| format!("HTTP {}", status)),
                more_info: parsed.more_info,
                details: parsed.details,
            },
            Err(_) => TwilioError::Api {
                status,
                code: None,
                message: if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
                more_info: None,
                details: None,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TwilioError::Api { status, .. } => Some(*status),
            TwilioError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the request never produced an API response
    pub fn is_transport(&self) -> bool {
        matches!(self, TwilioError::Http(_))
    }

    /// The `details` document when the platform sent one, otherwise the message.
    ///
    /// Studio reports flow definition problems only in `details`.
    pub fn details_or_message(&self) -> String {
        match self {
            TwilioError::Api {
                details: Some(details),
                ..
            } => details.to_string(),
            TwilioError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
