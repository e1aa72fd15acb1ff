//! Bot-orchestration service contract
//!
//! [`BotApi`] is the seam between the deployment flow and the remote service.
//! [`HummingbotClient`] implements it over HTTP; [`mock::MockBotApi`] keeps
//! everything in memory for tests.

pub mod errors;
pub mod hummingbot;
pub mod mock;
pub mod types;

use async_trait::async_trait;

use crate::grid::{GridStrategyConfig, PriceBar};

pub use errors::{ApiError, ApiResult};
pub use hummingbot::HummingbotClient;
pub use types::{controller_payload, BotState, BotStatus, DeploymentRequest, SideEncoding};

/// Operations the deployment flow needs from the service - can be mocked for testing
#[async_trait]
pub trait BotApi: Send + Sync {
    /// At most `max_records` most recent candles, oldest first
    async fn fetch_candles(
        &self,
        connector_name: &str,
        trading_pair: &str,
        interval: &str,
        max_records: u32,
    ) -> ApiResult<Vec<PriceBar>>;

    /// Create or replace the controller config stored under `config_id`
    async fn upsert_controller_config(
        &self,
        config_id: &str,
        config: &GridStrategyConfig,
    ) -> ApiResult<()>;

    /// Ids of all stored controller configs
    async fn list_controller_configs(&self) -> ApiResult<Vec<String>>;

    /// Start (or re-associate) a bot instance running the referenced configs
    async fn deploy_controllers(&self, request: &DeploymentRequest) -> ApiResult<()>;

    /// Current state of the deployed bot; may fail transiently
    async fn get_active_bot_status(&self) -> ApiResult<BotStatus>;
}
