//! DeployListener trait definition
//!
//! The orchestrator reports progress through an injected listener instead of
//! writing to a process-wide logger, so tests can assert on what was emitted.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::api::BotStatus;

/// Progress notifications emitted during a deployment run
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    /// Price history received; bounds are the first/last candle times when known
    HistoryFetched {
        bars: usize,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    ConfigStored {
        id: String,
    },
    AvailableConfigs(Vec<String>),
    DeploymentRequested {
        instance_name: String,
        config_ids: Vec<String>,
    },
    StatusSnapshot {
        attempt: u32,
        status: BotStatus,
    },
    StatusFetchFailed {
        attempt: u32,
        error: String,
    },
    BotFailed {
        attempt: u32,
        status: BotStatus,
    },
    BotRunning {
        attempts: u32,
    },
}

/// Receiver of deployment events
///
/// Invoked synchronously from the deployment flow; implementations must not block.
pub trait DeployListener: Send + Sync {
    fn on_event(&self, event: DeployEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Default)]
pub struct LogListener;

impl DeployListener for LogListener {
    fn on_event(&self, event: DeployEvent) {
        match event {
            DeployEvent::HistoryFetched { bars, from, to } => match (from, to) {
                (Some(from), Some(to)) => info!("Fetched {} candles ({} .. {})", bars, from, to),
                _ => info!("Fetched {} candles", bars),
            },
            DeployEvent::ConfigStored { id } => debug!("Stored controller config {}", id),
            DeployEvent::AvailableConfigs(ids) => info!("Available configs: {:?}", ids),
            DeployEvent::DeploymentRequested {
                instance_name,
                config_ids,
            } => info!("Deploying {} with configs {:?}", instance_name, config_ids),
            DeployEvent::StatusSnapshot { attempt, status } => {
                info!("Bot status (check {}): {}", attempt, status.status)
            }
            DeployEvent::StatusFetchFailed { attempt, error } => {
                error!("Error checking bot status (check {}): {}", attempt, error)
            }
            DeployEvent::BotFailed { attempt, status } => {
                warn!("Bot entered terminal state {} (check {})", status.status, attempt)
            }
            DeployEvent::BotRunning { attempts } => {
                info!("Bot deployed and running successfully after {} checks", attempts)
            }
        }
    }
}

/// Captures events in memory, for assertions in tests
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeployEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of recorded events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DeployEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl DeployListener for RecordingListener {
    fn on_event(&self, event: DeployEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
