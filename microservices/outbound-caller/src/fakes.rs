//! In-memory doubles of the Twilio SDK traits for service tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use voxpool_twilio_sdk::{
    Build, CreateExecution, CreateFlow, Environment, EnvironmentStore, Execution, Flow, FlowExecutor,
    FlowPublisher, FlowStatus, NumberLookup, PhoneNumberInfo, Result, Service, TwilioError, Variable,
};

pub fn api_error(status: u16, message: &str, details: Option<serde_json::Value>) -> TwilioError {
    TwilioError::Api {
        status,
        code: None,
        message: message.to_string(),
        more_info: None,
        details,
    }
}

/// Lookup that knows a fixed set of numbers and rejects everything else
#[derive(Default)]
pub struct FakeLookup {
    numbers: HashMap<String, PhoneNumberInfo>,
    pub calls: AtomicUsize,
}

impl FakeLookup {
    pub fn with_number(mut self, raw: &str, normalized: &str, country_code: Option<&str>) -> Self {
        self.numbers.insert(
            raw.to_string(),
            PhoneNumberInfo {
                phone_number: normalized.to_string(),
                country_code: country_code.map(str::to_string),
                national_format: None,
                caller_name: None,
                carrier: None,
                url: None,
            },
        );
        self
    }
}

#[async_trait]
impl NumberLookup for FakeLookup {
    async fn lookup(&self, phone_number: &str) -> Result<PhoneNumberInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.numbers
            .get(phone_number)
            .cloned()
            .ok_or_else(|| api_error(404, "The requested resource was not found", None))
    }
}

/// Studio double recording every execution and flow request
#[derive(Default)]
pub struct FakeStudio {
    pub executions: Mutex<Vec<(String, CreateExecution)>>,
    pub flows: Mutex<Vec<CreateFlow>>,
    pub fail_executions: bool,
    pub reject_flows: Option<serde_json::Value>,
}

#[async_trait]
impl FlowExecutor for FakeStudio {
    async fn create_execution(&self, flow_sid: &str, request: &CreateExecution) -> Result<Execution> {
        if self.fail_executions {
            return Err(api_error(400, "To number is not a valid phone number", None));
        }

        let mut executions = self.executions.lock();
        executions.push((flow_sid.to_string(), request.clone()));

        Ok(Execution {
            sid: format!("FN{:032}", executions.len()),
            flow_sid: Some(flow_sid.to_string()),
            status: Some("active".to_string()),
            contact_channel_address: Some(request.to.clone()),
            date_created: None,
        })
    }
}

#[async_trait]
impl FlowPublisher for FakeStudio {
    async fn create_flow(&self, request: &CreateFlow) -> Result<Flow> {
        if let Some(details) = &self.reject_flows {
            return Err(api_error(400, "Invalid Flow Definition", Some(details.clone())));
        }

        let mut flows = self.flows.lock();
        flows.push(request.clone());

        Ok(Flow {
            sid: format!("FW{:032}", flows.len()),
            friendly_name: Some(request.friendly_name.clone()),
            status: Some(FlowStatus::Published),
            revision: Some(1),
            valid: Some(true),
            date_created: None,
        })
    }
}

/// One service with one environment and a mutable variable set
pub struct FakeEnvironments {
    pub environment: Environment,
    pub variables: Mutex<Vec<Variable>>,
    pub variable_writes: AtomicUsize,
}

impl FakeEnvironments {
    pub fn new(domain_name: &str) -> Self {
        Self {
            environment: Environment {
                sid: "ZE00000000000000000000000000000001".to_string(),
                service_sid: "ZS00000000000000000000000000000001".to_string(),
                build_sid: Some("ZB00000000000000000000000000000001".to_string()),
                unique_name: Some("dev-environment".to_string()),
                domain_suffix: Some("dev".to_string()),
                domain_name: Some(domain_name.to_string()),
            },
            variables: Mutex::new(Vec::new()),
            variable_writes: AtomicUsize::new(0),
        }
    }

    pub fn with_variable(self, key: &str, value: &str) -> Self {
        self.variables.lock().push(Variable {
            sid: format!("ZV-{}", key),
            key: key.to_string(),
            value: Some(value.to_string()),
            environment_sid: Some(self.environment.sid.clone()),
            service_sid: Some(self.environment.service_sid.clone()),
        });
        self
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        self.variables
            .lock()
            .iter()
            .find(|v| v.key == key)
            .and_then(|v| v.value.clone())
    }
}

#[async_trait]
impl EnvironmentStore for FakeEnvironments {
    async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(vec![Service {
            sid: self.environment.service_sid.clone(),
            unique_name: Some("verify-calls".to_string()),
            friendly_name: None,
        }])
    }

    async fn list_environments(&self, service_sid: &str) -> Result<Vec<Environment>> {
        if service_sid == self.environment.service_sid {
            Ok(vec![self.environment.clone()])
        } else {
            Err(api_error(404, "Service not found", None))
        }
    }

    async fn fetch_build(&self, service_sid: &str, build_sid: &str) -> Result<Build> {
        Ok(Build {
            sid: build_sid.to_string(),
            service_sid: Some(service_sid.to_string()),
            status: Some("completed".to_string()),
            date_created: None,
        })
    }

    async fn list_variables(&self, _environment: &Environment) -> Result<Vec<Variable>> {
        Ok(self.variables.lock().clone())
    }

    async fn create_variable(&self, environment: &Environment, key: &str, value: &str) -> Result<Variable> {
        self.variable_writes.fetch_add(1, Ordering::SeqCst);
        let variable = Variable {
            sid: format!("ZV-{}", key),
            key: key.to_string(),
            value: Some(value.to_string()),
            environment_sid: Some(environment.sid.clone()),
            service_sid: Some(environment.service_sid.clone()),
        };
        self.variables.lock().push(variable.clone());
        Ok(variable)
    }

    async fn update_variable(
        &self,
        _environment: &Environment,
        variable_sid: &str,
        value: &str,
    ) -> Result<Variable> {
        self.variable_writes.fetch_add(1, Ordering::SeqCst);
        let mut variables = self.variables.lock();
        let variable = variables
            .iter_mut()
            .find(|v| v.sid == variable_sid)
            .ok_or_else(|| api_error(404, "Variable not found", None))?;
        variable.value = Some(value.to_string());
        Ok(variable.clone())
    }
}
