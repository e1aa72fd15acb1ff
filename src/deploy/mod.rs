//! Deployment orchestration
//!
//! Pushes the synthesized grids to the bot-orchestration service, deploys a
//! bot referencing them and polls until it runs.
//!
//! - [`orchestrator`] - the store / deploy / poll sequence
//! - [`poll`] - retry policy, cancellation and the status loop
//! - [`events`] - injected listener receiving progress events
//! - [`errors`] - deployment error types
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use grid_deployer::api::HummingbotClient;
//! use grid_deployer::deploy::{cancel_pair, DeployPlan, LogListener, Orchestrator};
//!
//! let plan = DeployPlan::new("ERA-USDT");
//! let client = HummingbotClient::new(&api_config, &plan.instance_name)?;
//! let orchestrator = Orchestrator::new(client, Arc::new(LogListener), plan);
//!
//! let (handle, mut token) = cancel_pair();
//! let report = orchestrator.synthesize_and_deploy(&mut token).await?;
//! ```

pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod poll;

pub use errors::{DeployError, DeployResult};
pub use events::{DeployEvent, DeployListener, LogListener, RecordingListener};
pub use orchestrator::{DeployPlan, Orchestrator};
pub use poll::{cancel_pair, poll_until_running, CancelHandle, CancelToken, PollPolicy, PollReport};
