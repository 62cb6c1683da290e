//! Lookup v1 - phone number validation and normalization

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::TwilioClient;
use crate::error::Result;

/// Lookup result for a single phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneNumberInfo {
    /// E.164 formatted number
    pub phone_number: String,
    pub country_code: Option<String>,
    pub national_format: Option<String>,
    #[serde(default)]
    pub caller_name: Option<serde_json::Value>,
    #[serde(default)]
    pub carrier: Option<serde_json::Value>,
    pub url: Option<String>,
}

/// Validates a raw destination string and returns its normalized form
#[async_trait]
pub trait NumberLookup: Send + Sync {
    async fn lookup(&self, phone_number: &str) -> Result<PhoneNumberInfo>;
}

#[async_trait]
impl NumberLookup for TwilioClient {
    async fn lookup(&self, phone_number: &str) -> Result<PhoneNumberInfo> {
        let url = Self::endpoint(&self.urls.lookups, &["v1", "PhoneNumbers", phone_number.trim()])?;
        let info: PhoneNumberInfo = self.get_json(url).await?;

        debug!(
            phone_number = %info.phone_number,
            country_code = ?info.country_code,
            "Lookup completed"
        );

        Ok(info)
    }
}
