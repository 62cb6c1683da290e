//! Studio Flow Redeployer
//!
//! Publishes the bundled flow definition as a new Studio flow and points the
//! Serverless environment's flow variable at it.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use voxpool_core::{FlowSid, Result, VoxpoolError};
use voxpool_twilio_sdk::{CreateFlow, EnvironmentStore, FlowPublisher, FlowStatus};

use crate::active_flow::ActiveFlow;
use crate::platform;

#[derive(Debug, Clone)]
pub struct RedeploySettings {
    pub asset_path: PathBuf,
    pub friendly_name: String,
    /// Environment variable that holds the flow sid (`STUDIO_FLOW`)
    pub flow_variable_key: String,
    pub domain_name: Option<String>,
    pub service_sid: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowDeploymentState {
    pub environment_sid: String,
    pub build_sid: Option<String>,
    #[serde(skip)]
    pub definition: serde_json::Value,
    pub flow_sid: FlowSid,
    pub variable_sid: String,
    pub previous_flow_sid: Option<String>,
    pub confirmation: String,
}

/// Read and parse the bundled flow definition
pub async fn load_flow_definition(path: &Path) -> Result<serde_json::Value> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        VoxpoolError::Config(format!("Cannot read flow definition {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        VoxpoolError::Config(format!("Flow definition {} is not valid JSON: {}", path.display(), e))
    })
}

pub struct FlowRedeployer {
    publisher: Arc<dyn FlowPublisher>,
    environments: Arc<dyn EnvironmentStore>,
    settings: RedeploySettings,
    active_flow: Arc<ActiveFlow>,
}

impl FlowRedeployer {
    pub fn new(
        publisher: Arc<dyn FlowPublisher>,
        environments: Arc<dyn EnvironmentStore>,
        settings: RedeploySettings,
        active_flow: Arc<ActiveFlow>,
    ) -> Self {
        Self {
            publisher,
            environments,
            settings,
            active_flow,
        }
    }

    pub async fn redeploy(&self) -> Result<FlowDeploymentState> {
        let definition = load_flow_definition(&self.settings.asset_path).await?;
        info!(asset = %self.settings.asset_path.display(), "Loaded flow definition");

        let domain_name = self
            .settings
            .domain_name
            .as_deref()
            .ok_or_else(|| VoxpoolError::Config("DOMAIN_NAME is not configured".to_string()))?;

        let environment = self
            .environments
            .current_environment(domain_name, self.settings.service_sid.as_deref())
            .await
            .map_err(|e| platform::execution_error("Error reading Serverless environments", e))?
            .ok_or_else(|| VoxpoolError::NotFound(format!("no environment serves domain {}", domain_name)))?;

        let build = self
            .environments
            .last_build(&environment)
            .await
            .map_err(|e| platform::execution_error("Error reading latest build", e))?;
        let build_sid = build.map(|b| b.sid);

        info!(
            environment_sid = %environment.sid,
            build_sid = ?build_sid,
            "Current environment resolved"
        );

        let request = CreateFlow {
            friendly_name: self.settings.friendly_name.clone(),
            status: FlowStatus::Published,
            definition: definition.clone(),
            commit_message: build_sid
                .as_ref()
                .map(|sid| format!("Redeployed from build {}", sid)),
        };

        let flow = self.publisher.create_flow(&request).await.map_err(|e| {
            warn!(details = %e.details_or_message(), "Studio flow publish failed");
            platform::execution_error("Error publishing Studio flow", e)
        })?;

        info!(flow_sid = %flow.sid, "Studio deployed");

        let key = self.settings.flow_variable_key.as_str();
        let existing = self
            .environments
            .target_variable(&environment, key)
            .await
            .map_err(|e| platform::execution_error("Error reading environment variables", e))?;
        let previous_flow_sid = existing.as_ref().and_then(|v| v.value.clone());

        let variable = self
            .environments
            .upsert_variable(&environment, existing.as_ref(), key, &flow.sid)
            .await
            .map_err(|e| platform::execution_error("Error updating environment variable", e))?;

        let flow_sid = FlowSid::new(flow.sid);
        self.active_flow.replace(flow_sid.clone());

        info!(
            key = %key,
            variable_sid = %variable.sid,
            previous = ?previous_flow_sid,
            flow_sid = %flow_sid,
            "Flow variable updated"
        );

        Ok(FlowDeploymentState {
            environment_sid: environment.sid,
            build_sid,
            definition,
            confirmation: format!("Setup successfully ran! ==> {}", flow_sid),
            flow_sid,
            variable_sid: variable.sid,
            previous_flow_sid,
        })
    }
}
