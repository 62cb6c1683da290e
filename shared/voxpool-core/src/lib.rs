//! Voxpool Core - Shared domain types and service infrastructure
//!
//! This crate provides:
//! - Standard service trait all microservices implement
//! - Common domain types (NumberDetails, FlowSid, ExecutionSid)
//! - Error handling utilities
//! - Configuration management

pub mod config;
pub mod domain;
pub mod error;
pub mod service;

pub use config::{EnvSource, ProcessEnv, ServiceConfig};
pub use domain::*;
pub use error::{Result, VoxpoolError};
pub use service::{DependencyStatus, HealthStatus, MicroserviceRuntime, ReadinessStatus, VoxpoolService};
