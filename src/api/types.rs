//! Wire-level types exchanged with the bot-orchestration service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grid::{GridStrategyConfig, Stance};

use super::errors::{ApiError, ApiResult};

/// Integer convention used for the `side` field of a controller payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEncoding {
    /// Trade-type convention: long = 1, short = 2
    #[default]
    TradeType,
    /// Signed convention: long = 1, short = -1
    Signed,
}

impl SideEncoding {
    pub fn encode(&self, stance: Stance) -> i8 {
        match (self, stance) {
            (_, Stance::Long) => 1,
            (SideEncoding::TradeType, Stance::Short) => 2,
            (SideEncoding::Signed, Stance::Short) => -1,
        }
    }
}

/// Render a config as the JSON body expected by the controller-config endpoint
pub fn controller_payload(config: &GridStrategyConfig, encoding: SideEncoding) -> ApiResult<Value> {
    let mut payload = serde_json::to_value(config)?;
    match payload.as_object_mut() {
        Some(obj) => {
            obj.insert("side".into(), Value::from(encoding.encode(config.side)));
            Ok(payload)
        }
        None => Err(ApiError::Json("controller config did not serialize to an object".into())),
    }
}

/// Request to start a bot instance running the given controller configs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub instance_name: String,
    pub credentials_profile: String,
    #[serde(rename = "controllers_config")]
    pub config_ids: Vec<String>,
}

impl DeploymentRequest {
    pub fn new(
        instance_name: impl Into<String>,
        credentials_profile: impl Into<String>,
        config_ids: Vec<String>,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            credentials_profile: credentials_profile.into(),
            config_ids,
        }
    }
}

/// Lifecycle state reported by the service for a bot instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BotState {
    Running,
    Initializing,
    Stopped,
    Error,
    /// Any state string this crate does not interpret
    Other(String),
}

impl BotState {
    pub fn is_running(&self) -> bool {
        matches!(self, BotState::Running)
    }

    /// States from which the bot will not reach `Running` on its own
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, BotState::Error)
    }
}

impl From<&str> for BotState {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "RUNNING" => BotState::Running,
            "INITIALIZING" | "STARTING" | "DEPLOYING" | "PENDING" => BotState::Initializing,
            "STOPPED" => BotState::Stopped,
            "ERROR" | "FAILED" | "CRASHED" => BotState::Error,
            _ => BotState::Other(s.to_string()),
        }
    }
}

impl From<String> for BotState {
    fn from(s: String) -> Self {
        BotState::from(s.as_str())
    }
}

impl From<BotState> for String {
    fn from(state: BotState) -> Self {
        state.to_string()
    }
}

impl std::fmt::Display for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotState::Running => f.write_str("RUNNING"),
            BotState::Initializing => f.write_str("INITIALIZING"),
            BotState::Stopped => f.write_str("STOPPED"),
            BotState::Error => f.write_str("ERROR"),
            BotState::Other(s) => f.write_str(s),
        }
    }
}

/// Snapshot of the deployed bot's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStatus {
    pub status: BotState,
}

impl BotStatus {
    pub fn new(status: impl Into<BotState>) -> Self {
        Self {
            status: status.into(),
        }
    }

    /// Extract the status from a service response
    ///
    /// An enveloped reply (`{"status": "success" | "error", ...}`) carries the
    /// bot state only in `data.status`; an `"error"` envelope is returned as
    /// [`ApiError::Service`]. A bare `{"status": ...}` is read directly.
    pub fn from_response(response: &Value) -> ApiResult<Self> {
        let top = response.get("status").and_then(Value::as_str);

        if top.is_some_and(|s| s.eq_ignore_ascii_case("error")) {
            let message = response
                .get("message")
                .or_else(|| response.get("detail"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ApiError::Service(message.to_string()));
        }

        if let Some(data) = response.get("data") {
            return data
                .get("status")
                .and_then(Value::as_str)
                .map(Self::new)
                .ok_or_else(|| {
                    ApiError::Json(format!("no bot status in response data: {}", data))
                });
        }

        match top {
            Some(raw) if !raw.eq_ignore_ascii_case("success") => Ok(Self::new(raw)),
            _ => Err(ApiError::Json(format!("no bot status in response: {}", response))),
        }
    }
}
