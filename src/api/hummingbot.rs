//! HTTP client for the Hummingbot API

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::ApiConfig;
use crate::grid::{GridStrategyConfig, PriceBar};

use super::errors::{ApiError, ApiResult};
use super::types::{controller_payload, BotStatus, DeploymentRequest, SideEncoding};
use super::BotApi;

/// Hummingbot API client authenticated with HTTP basic auth
pub struct HummingbotClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    side_encoding: SideEncoding,
    /// Bot instance whose status is polled
    instance_name: String,
}

impl HummingbotClient {
    pub fn new(config: &ApiConfig, instance_name: impl Into<String>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            side_encoding: config.side_encoding,
            instance_name: instance_name.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authenticated request and decode the JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Json(e.to_string()))
    }
}

/// Pull config ids out of a listing that holds either bare ids or config objects
fn config_ids(entries: Vec<Value>) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(id) => Some(id),
            Value::Object(obj) => match obj.get("id").and_then(Value::as_str) {
                Some(id) => Some(id.to_string()),
                None => {
                    warn!("Skipping controller config without id: {:?}", obj);
                    None
                }
            },
            other => {
                warn!("Skipping unexpected controller config entry: {}", other);
                None
            }
        })
        .collect()
}

#[async_trait]
impl BotApi for HummingbotClient {
    async fn fetch_candles(
        &self,
        connector_name: &str,
        trading_pair: &str,
        interval: &str,
        max_records: u32,
    ) -> ApiResult<Vec<PriceBar>> {
        debug!(
            "Fetching {} {} candles for {} on {}",
            max_records, interval, trading_pair, connector_name
        );
        let body = json!({
            "connector_name": connector_name,
            "trading_pair": trading_pair,
            "interval": interval,
            "max_records": max_records,
        });
        self.send(self.client.post(self.url("/market-data/candles")).json(&body))
            .await
    }

    async fn upsert_controller_config(
        &self,
        config_id: &str,
        config: &GridStrategyConfig,
    ) -> ApiResult<()> {
        let payload = controller_payload(config, self.side_encoding)?;
        debug!("Upserting controller config {}", config_id);
        let _: Value = self
            .send(
                self.client
                    .post(self.url(&format!("/controllers/configs/{}", config_id)))
                    .json(&payload),
            )
            .await?;
        Ok(())
    }

    async fn list_controller_configs(&self) -> ApiResult<Vec<String>> {
        let entries: Vec<Value> = self
            .send(self.client.get(self.url("/controllers/configs/")))
            .await?;
        Ok(config_ids(entries))
    }

    async fn deploy_controllers(&self, request: &DeploymentRequest) -> ApiResult<()> {
        debug!("Deploying {} with {:?}", request.instance_name, request.config_ids);
        let _: Value = self
            .send(
                self.client
                    .post(self.url("/bot-orchestration/deploy-v2-controllers"))
                    .json(request),
            )
            .await?;
        Ok(())
    }

    async fn get_active_bot_status(&self) -> ApiResult<BotStatus> {
        let response: Value = self
            .send(self.client.get(self.url(&format!(
                "/bot-orchestration/{}/status",
                self.instance_name
            ))))
            .await?;
        BotStatus::from_response(&response)
    }
}
