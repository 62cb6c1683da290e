//! Outgoing Call Initiator
//!
//! Validates the destination through Lookup, picks the FROM number from the
//! number pool and starts a Studio execution that reads the message and the
//! verification code to the callee.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use voxpool_core::{ExecutionSid, FlowSid, Result, VoxpoolError};
use voxpool_twilio_sdk::{CreateExecution, FlowExecutor, NumberLookup};

use crate::active_flow::ActiveFlow;
use crate::number_pool::{NumberPool, SelectionSource};
use crate::platform;

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hi, this is the default verification welcome message.";
pub const NO_CODE_PLACEHOLDER: &str = "No code passed";

/// Pause inserted between code digits so text-to-speech reads them one by one
const CODE_SEPARATOR: &str = ". ";

/// Verification code as submitted: form fields are always text, JSON bodies
/// may carry a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallCode {
    Text(String),
    Number(u64),
}

impl CallCode {
    fn characters(&self) -> String {
        match self {
            CallCode::Text(text) => text.trim().to_string(),
            CallCode::Number(n) => n.to_string(),
        }
    }
}

/// Inbound request to place a verification call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_code")]
    pub code: Option<CallCode>,
}

fn deserialize_code<'de, D>(deserializer: D) -> std::result::Result<Option<CallCode>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CodeVisitor;

    impl<'de> Visitor<'de> for CodeVisitor {
        type Value = Option<CallCode>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a verification code as a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(Some(CallCode::Text(v.to_string())))
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
            Ok(Some(CallCode::Text(v)))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(CallCode::Number(v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(CallCode::Text(v.to_string())))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(CallCode::Text(v.to_string())))
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> std::result::Result<Self::Value, D2::Error> {
            d.deserialize_any(CodeVisitor)
        }
    }

    deserializer.deserialize_any(CodeVisitor)
}

/// Message text sent to the flow; blank or missing falls back to the welcome message
pub fn resolve_message(message: Option<&str>) -> String {
    match message.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => DEFAULT_WELCOME_MESSAGE.to_string(),
    }
}

/// `"5135"` -> `"5. 1. 3. 5"`; blank or missing -> placeholder
pub fn render_code(code: Option<&CallCode>) -> String {
    let characters = code.map(CallCode::characters).unwrap_or_default();
    if characters.is_empty() {
        return NO_CODE_PLACEHOLDER.to_string();
    }

    characters
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(CODE_SEPARATOR)
}

/// Everything the Studio execution is started with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowExecutionParameters {
    pub to: String,
    pub from: String,
    pub message: String,
    pub code: String,
}

impl FlowExecutionParameters {
    fn to_execution(&self) -> CreateExecution {
        CreateExecution {
            to: self.to.clone(),
            from: self.from.clone(),
            parameters: json!({
                "message": self.message,
                "code": self.code,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallOutcome {
    pub execution_sid: ExecutionSid,
    pub flow_sid: FlowSid,
    pub to: String,
    pub from: String,
    pub selected_by: SelectionSource,
    pub confirmation: String,
}

pub struct CallInitiator {
    lookup: Arc<dyn NumberLookup>,
    executor: Arc<dyn FlowExecutor>,
    pool: Arc<NumberPool>,
    active_flow: Arc<ActiveFlow>,
}

impl CallInitiator {
    pub fn new(
        lookup: Arc<dyn NumberLookup>,
        executor: Arc<dyn FlowExecutor>,
        pool: Arc<NumberPool>,
        active_flow: Arc<ActiveFlow>,
    ) -> Self {
        Self {
            lookup,
            executor,
            pool,
            active_flow,
        }
    }

    /// Validate, select, execute. Each step must succeed before the next
    /// starts; nothing is undone when a later step fails.
    pub async fn initiate(&self, request: CallRequest) -> Result<CallOutcome> {
        let to = request
            .to
            .as_deref()
            .map(str::trim)
            .filter(|to| !to.is_empty())
            .ok_or_else(|| VoxpoolError::Validation("missing required field 'to'".to_string()))?;

        let info = self.lookup.lookup(to).await.map_err(|e| {
            warn!(to = %to, error = %e, "Error trying to get number details for TO number");
            platform::lookup_error(e)
        })?;
        let details = platform::number_details(info);

        info!(
            phone_number = %details.phone_number,
            country_code = ?details.country_code,
            "Number details resolved"
        );

        let (from, selected_by) = self.pool.select_with_source(&details);
        info!(from = %from, selected_by = ?selected_by, "FROM number selected");

        let parameters = FlowExecutionParameters {
            to: details.phone_number.clone(),
            from: from.to_string(),
            message: resolve_message(request.message.as_deref()),
            code: render_code(request.code.as_ref()),
        };

        let flow_sid = self
            .active_flow
            .current()
            .ok_or_else(|| VoxpoolError::Config("STUDIO_FLOW is not configured".to_string()))?;

        let execution = self
            .executor
            .create_execution(flow_sid.as_str(), &parameters.to_execution())
            .await
            .map_err(|e| {
                warn!(flow_sid = %flow_sid, error = %e, "Studio execution failed");
                platform::execution_error("Error creating Studio execution", e)
            })?;

        info!(execution_sid = %execution.sid, flow_sid = %flow_sid, "Execution created");

        Ok(CallOutcome {
            confirmation: format!("Initiated Studio Flow: {}", execution.sid),
            execution_sid: ExecutionSid(execution.sid),
            flow_sid,
            to: parameters.to,
            from: parameters.from,
            selected_by,
        })
    }
}
