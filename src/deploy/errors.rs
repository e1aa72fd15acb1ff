//! Deployment error types

use thiserror::Error;

use crate::api::{ApiError, BotState};
use crate::grid::GridError;

/// Errors that end a deployment run
#[derive(Error, Debug, Clone)]
pub enum DeployError {
    #[error("Grid synthesis failed: {0}")]
    Grid(#[from] GridError),

    #[error("Service call failed: {0}")]
    Api(#[from] ApiError),

    #[error("Bot reported {state} after {attempts} status checks")]
    BotFailed { state: BotState, attempts: u32 },

    #[error("Bot not running after {attempts} status checks")]
    PollExhausted { attempts: u32 },

    #[error("Status polling cancelled after {attempts} status checks")]
    Cancelled { attempts: u32 },
}

/// Result type for deployment operations
pub type DeployResult<T> = std::result::Result<T, DeployError>;
