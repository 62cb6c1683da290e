//! Studio v2 - flow executions and flow publishing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::TwilioClient;
use crate::error::{Result, TwilioError};

/// Flow revision status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    Draft,
    Published,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Draft => "draft",
            FlowStatus::Published => "published",
        }
    }
}

/// Request to start one execution of a flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExecution {
    pub to: String,
    pub from: String,
    /// Exposed to the flow as `flow.data`
    pub parameters: serde_json::Value,
}

impl CreateExecution {
    fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let parameters = serde_json::to_string(&self.parameters)
            .map_err(|e| TwilioError::Parse(e.to_string()))?;

        Ok(vec![
            ("To", self.to.clone()),
            ("From", self.from.clone()),
            ("Parameters", parameters),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub sid: String,
    pub flow_sid: Option<String>,
    pub status: Option<String>,
    pub contact_channel_address: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
}

/// Request to publish a new flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlow {
    pub friendly_name: String,
    pub status: FlowStatus,
    pub definition: serde_json::Value,
    pub commit_message: Option<String>,
}

impl CreateFlow {
    fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let definition = serde_json::to_string(&self.definition)
            .map_err(|e| TwilioError::Parse(e.to_string()))?;

        let mut fields = vec![
            ("FriendlyName", self.friendly_name.clone()),
            ("Status", self.status.as_str().to_string()),
            ("Definition", definition),
        ];
        if let Some(message) = &self.commit_message {
            fields.push(("CommitMessage", message.clone()));
        }
        Ok(fields)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub sid: String,
    pub friendly_name: Option<String>,
    pub status: Option<FlowStatus>,
    pub revision: Option<u32>,
    pub valid: Option<bool>,
    pub date_created: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait FlowExecutor: Send + Sync {
    async fn create_execution(&self, flow_sid: &str, request: &CreateExecution) -> Result<Execution>;
}

#[async_trait]
pub trait FlowPublisher: Send + Sync {
    async fn create_flow(&self, request: &CreateFlow) -> Result<Flow>;
}

#[async_trait]
impl FlowExecutor for TwilioClient {
    async fn create_execution(&self, flow_sid: &str, request: &CreateExecution) -> Result<Execution> {
        let url = Self::endpoint(&self.urls.studio, &["v2", "Flows", flow_sid, "Executions"])?;
        let execution: Execution = self.post_form(url, &request.form_fields()?).await?;

        info!(flow_sid = %flow_sid, execution_sid = %execution.sid, "Studio execution created");
        Ok(execution)
    }
}

#[async_trait]
impl FlowPublisher for TwilioClient {
    async fn create_flow(&self, request: &CreateFlow) -> Result<Flow> {
        let url = Self::endpoint(&self.urls.studio, &["v2", "Flows"])?;
        let flow: Flow = self.post_form(url, &request.form_fields()?).await?;

        info!(
            flow_sid = %flow.sid,
            friendly_name = %request.friendly_name,
            status = request.status.as_str(),
            "Studio flow created"
        );
        Ok(flow)
    }
}
