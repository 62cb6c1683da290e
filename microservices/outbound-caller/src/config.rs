//! Outbound Caller Configuration

use std::collections::HashMap;
use std::path::PathBuf;
use voxpool_core::{EnvSource, ProcessEnv, Result, ServiceConfig, VoxpoolError};
use voxpool_twilio_sdk::TwilioCredentials;

use crate::number_pool::{CountryNumberPool, NumberPool, RegionalNumberPool, DEFAULT_KEY};
use crate::redeployer::RedeploySettings;

pub const SERVICE_NAME: &str = "outbound-caller";
pub const DEFAULT_FLOW_ASSET_PATH: &str = "assets/studio.json";
pub const DEFAULT_FLOW_FRIENDLY_NAME: &str = "Outbound Verification Call";
pub const DEFAULT_FLOW_VARIABLE_KEY: &str = "STUDIO_FLOW";

#[derive(Debug, Clone)]
pub struct OutboundCallerConfig {
    pub service: ServiceConfig,
    pub twilio: TwilioCredentials,
    pub twilio_timeout_secs: u64,
    /// Flow sid used for executions until a redeploy replaces it
    pub studio_flow_sid: Option<String>,
    pub redeploy: RedeploySettings,
    pub number_pool: NumberPool,
}

impl OutboundCallerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl EnvSource) -> Result<Self> {
        Ok(Self {
            service: ServiceConfig::named(source, SERVICE_NAME)?,
            twilio: TwilioCredentials::new(
                source.get_or("TWILIO_ACCOUNT_SID", ""),
                source.get_or("TWILIO_AUTH_TOKEN", ""),
            ),
            twilio_timeout_secs: source.parse_or("TWILIO_TIMEOUT_SECS", 30)?,
            studio_flow_sid: source.get_non_empty("STUDIO_FLOW"),
            redeploy: RedeploySettings {
                asset_path: PathBuf::from(source.get_or("STUDIO_FLOW_ASSET_PATH", DEFAULT_FLOW_ASSET_PATH)),
                friendly_name: source.get_or("STUDIO_FLOW_FRIENDLY_NAME", DEFAULT_FLOW_FRIENDLY_NAME),
                flow_variable_key: source.get_or("STUDIO_FLOW_VARIABLE", DEFAULT_FLOW_VARIABLE_KEY),
                domain_name: source.get_non_empty("DOMAIN_NAME"),
                service_sid: source.get_non_empty("SERVICE_SID"),
            },
            number_pool: number_pool_from_source(source)?,
        })
    }
}

/// `COUNTRY_NUMBER_POOL` and `REGIONAL_NUMBER_POOL` are JSON objects.
/// `DEFAULT_FROM_NUMBER` takes precedence over a `default` entry in the
/// regional object; one of the two must be present.
fn number_pool_from_source(source: &impl EnvSource) -> Result<NumberPool> {
    let country = parse_pool(source, "COUNTRY_NUMBER_POOL")?;
    let mut regional = parse_pool(source, "REGIONAL_NUMBER_POOL")?;

    let default = match source.get_non_empty("DEFAULT_FROM_NUMBER") {
        Some(number) => number,
        None => regional.remove(DEFAULT_KEY).unwrap_or_default(),
    };

    Ok(NumberPool::new(
        CountryNumberPool::new(country),
        RegionalNumberPool::new(regional, default)?,
    ))
}

fn parse_pool(source: &impl EnvSource, key: &str) -> Result<HashMap<String, String>> {
    match source.get_non_empty(key) {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            VoxpoolError::Config(format!("Invalid {}: expected a JSON object of numbers: {}", key, e))
        }),
        None => Ok(HashMap::new()),
    }
}
