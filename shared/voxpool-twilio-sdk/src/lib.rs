//! Voxpool Twilio SDK
//!
//! Thin typed client over the Twilio REST APIs used by the voice services:
//! - Lookup v1 (destination number validation)
//! - Studio v2 (flow executions and flow publishing)
//! - Serverless v1 (environments, builds and environment variables)
//!
//! Each API surface sits behind a trait so services can be driven by an
//! in-memory double in tests.

pub mod client;
pub mod error;
pub mod lookup;
pub mod serverless;
pub mod studio;


pub use client::{BaseUrls, TwilioClient, TwilioCredentials};
pub use error::{Result, TwilioError};
pub use lookup::{NumberLookup, PhoneNumberInfo};
pub use serverless::{Build, Environment, EnvironmentStore, Service, Variable};
pub use studio::{CreateExecution, CreateFlow, Execution, Flow, FlowExecutor, FlowPublisher, FlowStatus};
