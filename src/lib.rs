#![deny(unreachable_pub)]
pub mod api;
pub mod config;
pub mod deploy;
mod errors;
pub mod grid;
pub use api::{BotApi, BotState, BotStatus, DeploymentRequest, HummingbotClient, SideEncoding};
pub use config::Settings;
pub use deploy::{DeployError, DeployPlan, Orchestrator, PollPolicy};
pub use errors::Error;
pub use grid::{synthesize, GridError, GridPair, GridStrategyConfig, PriceBar, Stance};
