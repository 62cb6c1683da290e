//! Serverless v1 - services, environments, builds and environment variables

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::TwilioClient;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub sid: String,
    pub unique_name: Option<String>,
    pub friendly_name: Option<String>,
}

/// A deployment target (e.g. `dev`, `production`) of a Serverless service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub sid: String,
    pub service_sid: String,
    pub build_sid: Option<String>,
    pub unique_name: Option<String>,
    pub domain_suffix: Option<String>,
    pub domain_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub sid: String,
    pub service_sid: Option<String>,
    pub status: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
}

/// Environment variable attached to one environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub sid: String,
    pub key: String,
    pub value: Option<String>,
    pub environment_sid: Option<String>,
    pub service_sid: Option<String>,
}

/// Read/write access to Serverless environments and their variables.
///
/// The provided methods build the redeploy workflow on top of the raw
/// resource calls.
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>>;

    async fn list_environments(&self, service_sid: &str) -> Result<Vec<Environment>>;

    async fn fetch_build(&self, service_sid: &str, build_sid: &str) -> Result<Build>;

    async fn list_variables(&self, environment: &Environment) -> Result<Vec<Variable>>;

    async fn create_variable(&self, environment: &Environment, key: &str, value: &str) -> Result<Variable>;

    async fn update_variable(
        &self,
        environment: &Environment,
        variable_sid: &str,
        value: &str,
    ) -> Result<Variable>;

    /// Find the environment serving `domain_name`, scanning every service
    /// unless `service_sid` narrows the search to one.
    async fn current_environment(
        &self,
        domain_name: &str,
        service_sid: Option<&str>,
    ) -> Result<Option<Environment>> {
        let service_sids = match service_sid {
            Some(sid) => vec![sid.to_string()],
            None => self
                .list_services()
                .await?
                .into_iter()
                .map(|service| service.sid)
                .collect(),
        };

        for sid in service_sids {
            let found = self
                .list_environments(&sid)
                .await?
                .into_iter()
                .find(|env| {
                    env.domain_name
                        .as_deref()
                        .is_some_and(|name| name.eq_ignore_ascii_case(domain_name))
                });

            if let Some(environment) = found {
                debug!(environment_sid = %environment.sid, service_sid = %sid, "Resolved environment");
                return Ok(Some(environment));
            }
        }

        Ok(None)
    }

    /// The build currently deployed to `environment`, if any
    async fn last_build(&self, environment: &Environment) -> Result<Option<Build>> {
        match &environment.build_sid {
            Some(build_sid) => self
                .fetch_build(&environment.service_sid, build_sid)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    async fn target_variable(&self, environment: &Environment, key: &str) -> Result<Option<Variable>> {
        Ok(self
            .list_variables(environment)
            .await?
            .into_iter()
            .find(|variable| variable.key == key))
    }

    /// Overwrite `existing` or create `key` when there is nothing to overwrite
    async fn upsert_variable(
        &self,
        environment: &Environment,
        existing: Option<&Variable>,
        key: &str,
        value: &str,
    ) -> Result<Variable> {
        match existing {
            Some(variable) => self.update_variable(environment, &variable.sid, value).await,
            None => self.create_variable(environment, key, value).await,
        }
    }
}

#[async_trait]
impl EnvironmentStore for TwilioClient {
    async fn list_services(&self) -> Result<Vec<Service>> {
        let url = Self::endpoint(&self.urls.serverless, &["v1", "Services"])?;
        self.list_all(url, "services").await
    }

    async fn list_environments(&self, service_sid: &str) -> Result<Vec<Environment>> {
        let url = Self::endpoint(&self.urls.serverless, &["v1", "Services", service_sid, "Environments"])?;
        self.list_all(url, "environments").await
    }

    async fn fetch_build(&self, service_sid: &str, build_sid: &str) -> Result<Build> {
        let url = Self::endpoint(&self.urls.serverless, &["v1", "Services", service_sid, "Builds", build_sid])?;
        self.get_json(url).await
    }

    async fn list_variables(&self, environment: &Environment) -> Result<Vec<Variable>> {
        let url = Self::endpoint(
            &self.urls.serverless,
            &["v1", "Services", &environment.service_sid, "Environments", &environment.sid, "Variables"],
        )?;
        self.list_all(url, "variables").await
    }

    async fn create_variable(&self, environment: &Environment, key: &str, value: &str) -> Result<Variable> {
        let url = Self::endpoint(
            &self.urls.serverless,
            &["v1", "Services", &environment.service_sid, "Environments", &environment.sid, "Variables"],
        )?;
        let variable: Variable = self
            .post_form(url, &[("Key", key.to_string()), ("Value", value.to_string())])
            .await?;

        info!(environment_sid = %environment.sid, key = %key, "Environment variable created");
        Ok(variable)
    }

    async fn update_variable(
        &self,
        environment: &Environment,
        variable_sid: &str,
        value: &str,
    ) -> Result<Variable> {
        let url = Self::endpoint(
            &self.urls.serverless,
            &[
                "v1",
                "Services",
                &environment.service_sid,
                "Environments",
                &environment.sid,
                "Variables",
                variable_sid,
            ],
        )?;
        let variable: Variable = self.post_form(url, &[("Value", value.to_string())]).await?;

        info!(environment_sid = %environment.sid, key = %variable.key, "Environment variable updated");
        Ok(variable)
    }
}
