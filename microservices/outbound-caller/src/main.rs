//! Outbound Caller Microservice
//!
//! Voice verification calls over Twilio:
//! - Outgoing call initiation (Lookup -> caller-ID pool -> Studio execution)
//! - Caller-ID number pooling by country and dialing region
//! - Studio flow redeploy with environment variable update

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use voxpool_core::{
    DependencyStatus, HealthStatus, MicroserviceRuntime, ReadinessStatus, Result, VoxpoolError, VoxpoolService,
};
use voxpool_telemetry::TelemetryConfig;
use voxpool_twilio_sdk::{EnvironmentStore, FlowExecutor, FlowPublisher, NumberLookup, TwilioClient};

mod active_flow;
mod config;
mod handlers;
mod initiator;
mod number_pool;
mod platform;
mod redeployer;

#[cfg(test)]
mod fakes;
#[cfg(test)]
mod tests;

pub use config::OutboundCallerConfig;
use active_flow::ActiveFlow;
use handlers::{AppState, Metrics};
use initiator::CallInitiator;
use redeployer::FlowRedeployer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = OutboundCallerConfig::from_env()?;

    let telemetry = TelemetryConfig::new(
        config.service.service_name.clone(),
        config.service.log_level.clone(),
        config.service.json_logs,
    );
    voxpool_telemetry::init(&telemetry).map_err(|e| VoxpoolError::Internal(e.to_string()))?;

    info!("Starting Outbound Caller Microservice");

    let service = Arc::new(OutboundCallerService::new(config)?);
    MicroserviceRuntime::run(service).await
}

/// Outbound Caller Service
pub struct OutboundCallerService {
    config: OutboundCallerConfig,
    state: AppState,
    start_time: Instant,
}

impl OutboundCallerService {
    pub fn new(config: OutboundCallerConfig) -> Result<Self> {
        let client = TwilioClient::new(
            config.twilio.clone(),
            Duration::from_secs(config.twilio_timeout_secs),
        )
        .map_err(|e| VoxpoolError::Config(format!("Cannot build Twilio client: {}", e)))?;
        let client = Arc::new(client);

        let lookup: Arc<dyn NumberLookup> = client.clone();
        let executor: Arc<dyn FlowExecutor> = client.clone();
        let publisher: Arc<dyn FlowPublisher> = client.clone();
        let environments: Arc<dyn EnvironmentStore> = client;

        let active_flow = Arc::new(ActiveFlow::new(config.studio_flow_sid.clone()));
        let pool = Arc::new(config.number_pool.clone());

        info!(
            country_numbers = pool.country().len(),
            regional_numbers = pool.regional().len(),
            default_from = %pool.regional().default_number(),
            studio_flow = ?config.studio_flow_sid,
            "Number pool loaded"
        );

        let state = AppState {
            initiator: Arc::new(CallInitiator::new(lookup, executor, pool, active_flow.clone())),
            redeployer: Arc::new(FlowRedeployer::new(
                publisher,
                environments,
                config.redeploy.clone(),
                active_flow,
            )),
            metrics: Metrics::default(),
            credentials_configured: config.twilio.is_configured(),
        };

        Ok(Self {
            config,
            state,
            start_time: Instant::now(),
        })
    }
}

#[async_trait::async_trait]
impl VoxpoolService for OutboundCallerService {
    fn service_id(&self) -> &'static str {
        "outbound-caller"
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            service_id: self.service_id().to_string(),
            version: self.version().to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    async fn ready(&self) -> ReadinessStatus {
        let credentials = self.config.twilio.is_configured();
        let asset = self.config.redeploy.asset_path.exists();

        ReadinessStatus {
            ready: credentials,
            dependencies: vec![
                DependencyStatus {
                    name: "twilio".to_string(),
                    available: credentials,
                    latency_ms: None,
                },
                DependencyStatus {
                    name: "studio-flow-asset".to_string(),
                    available: asset,
                    latency_ms: None,
                },
            ],
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!(
            calls_initiated = self.state.metrics.calls_initiated.get(),
            flows_deployed = self.state.metrics.flows_deployed.get(),
            "Shutting down Outbound Caller service"
        );
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let bind = self.config.service.http_bind;
        info!(bind = %bind, "Starting Outbound Caller service");

        let app = handlers::create_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(bind).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
