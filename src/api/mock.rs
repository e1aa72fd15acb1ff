//! In-memory service for testing the deployment flow without a real backend

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::grid::{GridStrategyConfig, PriceBar};

use super::errors::{ApiError, ApiResult};
use super::types::{BotState, BotStatus, DeploymentRequest};
use super::BotApi;

/// Mock service
///
/// Stored configs are keyed by id, so upserting an existing id replaces it.
/// Status fetches replay a script; the last scripted entry repeats forever.
pub struct MockBotApi {
    pub candles: Arc<Mutex<Vec<PriceBar>>>,
    pub configs: Arc<Mutex<BTreeMap<String, GridStrategyConfig>>>,
    pub deployments: Arc<Mutex<Vec<DeploymentRequest>>>,
    status_script: Arc<Mutex<VecDeque<ApiResult<BotState>>>>,
    pub candle_requests: AtomicU32,
    pub upserts: AtomicU32,
    pub status_fetches: AtomicU32,
    pub should_fail: Arc<Mutex<bool>>,
}

impl MockBotApi {
    pub fn new(candles: Vec<PriceBar>) -> Self {
        Self {
            candles: Arc::new(Mutex::new(candles)),
            configs: Arc::new(Mutex::new(BTreeMap::new())),
            deployments: Arc::new(Mutex::new(Vec::new())),
            status_script: Arc::new(Mutex::new(VecDeque::new())),
            candle_requests: AtomicU32::new(0),
            upserts: AtomicU32::new(0),
            status_fetches: AtomicU32::new(0),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Builder: script the sequence of status fetch results
    pub fn with_statuses(mut self, script: Vec<ApiResult<BotState>>) -> Self {
        self.status_script = Arc::new(Mutex::new(script.into_iter().collect()));
        self
    }

    /// Make every write call (upsert, deploy) fail
    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock().await = fail;
    }

    pub fn status_fetch_count(&self) -> u32 {
        self.status_fetches.load(Ordering::SeqCst)
    }

    async fn check_writable(&self) -> ApiResult<()> {
        if *self.should_fail.lock().await {
            return Err(ApiError::Status {
                status: 500,
                body: "Mock failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BotApi for MockBotApi {
    async fn fetch_candles(
        &self,
        _connector_name: &str,
        _trading_pair: &str,
        _interval: &str,
        max_records: u32,
    ) -> ApiResult<Vec<PriceBar>> {
        self.candle_requests.fetch_add(1, Ordering::SeqCst);
        let candles = self.candles.lock().await;
        let skip = candles.len().saturating_sub(max_records as usize);
        Ok(candles[skip..].to_vec())
    }

    async fn upsert_controller_config(
        &self,
        config_id: &str,
        config: &GridStrategyConfig,
    ) -> ApiResult<()> {
        self.check_writable().await?;
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.configs
            .lock()
            .await
            .insert(config_id.to_string(), config.clone());
        Ok(())
    }

    async fn list_controller_configs(&self) -> ApiResult<Vec<String>> {
        Ok(self.configs.lock().await.keys().cloned().collect())
    }

    async fn deploy_controllers(&self, request: &DeploymentRequest) -> ApiResult<()> {
        self.check_writable().await?;
        self.deployments.lock().await.push(request.clone());
        Ok(())
    }

    async fn get_active_bot_status(&self) -> ApiResult<BotStatus> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        let mut script = self.status_script.lock().await;
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        match next {
            Some(result) => result.map(|status| BotStatus { status }),
            None => Err(ApiError::Http("no bot deployed".into())),
        }
    }
}
