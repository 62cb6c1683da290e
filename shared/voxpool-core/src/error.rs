//! Error types for Voxpool services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VoxpoolError>;

#[derive(Error, Debug)]
pub enum VoxpoolError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VoxpoolError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Execution(_) => 502,
            Self::Network(_) => 503,
            Self::Config(_) | Self::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Execution(_) => "EXECUTION_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for VoxpoolError {
    fn from(err: std::io::Error) -> Self {
        VoxpoolError::Network(err.to_string())
    }
}
