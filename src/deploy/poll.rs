//! Bot status polling with an explicit retry policy
//!
//! Each iteration fetches the bot status once:
//!
//! - `RUNNING` ends the loop successfully;
//! - a terminal failure state (see [`BotState::is_terminal_failure`]) ends it
//!   with [`DeployError::BotFailed`];
//! - any other state, or a failed fetch, waits `interval` and tries again
//!   until the attempt limit or deadline is reached.
//!
//! The wait is raced against a [`CancelToken`], so callers can stop the loop
//! at any time. With a deadline set, the last wait is shortened so the final
//! check lands on the deadline rather than up to one interval past it.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use crate::api::{BotApi, BotState, BotStatus};

use super::errors::{DeployError, DeployResult};
use super::events::{DeployEvent, DeployListener};

/// How long and how often to poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between status checks
    pub interval: Duration,
    /// Maximum number of status checks (`None` = unlimited)
    pub max_attempts: Option<u32>,
    /// Maximum time spent polling (`None` = unlimited)
    pub deadline: Option<Duration>,
}

impl PollPolicy {
    /// Poll every `interval` with no attempt limit and no deadline
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            deadline: None,
        }
    }

    /// Builder: cap the number of status checks
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Builder: cap the total polling time
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn is_exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.deadline.is_some_and(|deadline| elapsed >= deadline)
    }

    /// Wait before the next check, never overshooting the deadline
    fn next_wait(&self, elapsed: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => self.interval.min(deadline.saturating_sub(elapsed)),
            None => self.interval,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(5)).with_max_attempts(120)
    }
}

/// Outcome of a successful poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Status checks performed, including the successful one
    pub attempts: u32,
    pub status: BotStatus,
}

/// Create a linked cancel handle / token pair
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Owner side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Another token observing this handle
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side of a cancellation signal
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_, token) = cancel_pair();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pending forever if the handle is dropped first
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Poll `api` until the bot runs, fails terminally, the policy runs out, or `cancel` fires
pub async fn poll_until_running<A: BotApi + ?Sized>(
    api: &A,
    listener: &dyn DeployListener,
    policy: &PollPolicy,
    cancel: &mut CancelToken,
) -> DeployResult<PollReport> {
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled { attempts });
        }

        attempts += 1;
        match api.get_active_bot_status().await {
            Ok(status) => {
                listener.on_event(DeployEvent::StatusSnapshot {
                    attempt: attempts,
                    status: status.clone(),
                });

                if status.status.is_running() {
                    listener.on_event(DeployEvent::BotRunning { attempts });
                    return Ok(PollReport { attempts, status });
                }

                if status.status.is_terminal_failure() {
                    let state: BotState = status.status.clone();
                    listener.on_event(DeployEvent::BotFailed {
                        attempt: attempts,
                        status,
                    });
                    return Err(DeployError::BotFailed { state, attempts });
                }
            }
            Err(e) => listener.on_event(DeployEvent::StatusFetchFailed {
                attempt: attempts,
                error: e.to_string(),
            }),
        }

        if policy.is_exhausted(attempts, started.elapsed()) {
            return Err(DeployError::PollExhausted { attempts });
        }

        let wait = policy.next_wait(started.elapsed());
        tokio::select! {
            _ = sleep(wait) => {}
            _ = cancel.cancelled() => return Err(DeployError::Cancelled { attempts }),
        }
    }
}
