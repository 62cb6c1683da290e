//! Twilio REST client
//!
//! HTTP plumbing shared by the API modules: basic auth, form-encoded
//! requests, JSON responses and list pagination.

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, TwilioError};

pub const LOOKUPS_BASE_URL: &str = "https://lookups.twilio.com";
pub const STUDIO_BASE_URL: &str = "https://studio.twilio.com";
pub const SERVERLESS_BASE_URL: &str = "https://serverless.twilio.com";

const PAGE_SIZE: &str = "50";

/// Account credentials used for HTTP basic auth
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
}

impl TwilioCredentials {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// API hosts, overridable for tests and regional edges
#[derive(Debug, Clone)]
pub struct BaseUrls {
    pub lookups: String,
    pub studio: String,
    pub serverless: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            lookups: LOOKUPS_BASE_URL.to_string(),
            studio: STUDIO_BASE_URL.to_string(),
            serverless: SERVERLESS_BASE_URL.to_string(),
        }
    }
}

impl BaseUrls {
    /// Route every API to the same host
    pub fn single(base: &str) -> Self {
        Self {
            lookups: base.to_string(),
            studio: base.to_string(),
            serverless: base.to_string(),
        }
    }
}

/// Twilio API client
pub struct TwilioClient {
    http: Client,
    credentials: TwilioCredentials,
    pub(crate) urls: BaseUrls,
}

impl TwilioClient {
    pub fn new(credentials: TwilioCredentials, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            credentials,
            urls: BaseUrls::default(),
        })
    }

    pub fn with_base_urls(mut self, urls: BaseUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn credentials(&self) -> &TwilioCredentials {
        &self.credentials
    }

    /// Join path segments onto a base URL, percent-encoding each segment
    pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| TwilioError::InvalidUrl(format!("{}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| TwilioError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");

        let response = self
            .http
            .get(url)
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .send()
            .await?;

        Self::decode(response).await
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &[(&str, String)],
    ) -> Result<T> {
        debug!(url = %url, fields = form.len(), "POST");

        let response = self
            .http
            .post(url)
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(form)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Fetch every page of a list resource.
    ///
    /// List responses carry their items under `key` and the next page under
    /// `meta.next_page_url` (absent or null on the last page).
    pub(crate) async fn list_all<T: DeserializeOwned>(&self, mut url: Url, key: &str) -> Result<Vec<T>> {
        url.query_pairs_mut().append_pair("PageSize", PAGE_SIZE);

        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(page_url) = next.take() {
            let mut page: serde_json::Value = self.get_json(page_url).await?;

            let page_items = page
                .get_mut(key)
                .map(serde_json::Value::take)
                .ok_or_else(|| TwilioError::Parse(format!("list response missing '{}'", key)))?;
            let mut decoded: Vec<T> = serde_json::from_value(page_items)
                .map_err(|e| TwilioError::Parse(e.to_string()))?;
            items.append(&mut decoded);

            next = match page["meta"]["next_page_url"].as_str() {
                Some(raw) if !raw.is_empty() => Some(
                    Url::parse(raw).map_err(|e| TwilioError::InvalidUrl(format!("{}: {}", raw, e)))?,
                ),
                _ => None,
            };
        }

        Ok(items)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| TwilioError::Parse(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TwilioError::from_response(status.as_u16(), &body))
        }
    }
}
