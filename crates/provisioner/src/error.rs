//! Error types for the provisioner binary

use staking_pool_sdk::SdkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Keypair error: {0}")]
    Keypair(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sdk(#[from] SdkError),
}

impl From<serde_json::Error> for ProvisionerError {
    fn from(err: serde_json::Error) -> Self {
        ProvisionerError::SerializationError(err.to_string())
    }
}

pub type ProvisionerResult<T> = Result<T, ProvisionerError>;
