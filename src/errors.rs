use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::deploy::DeployError;

/// Top-level error for the deployment binary
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}
