//! Deploy-then-poll flow

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::{BotApi, DeploymentRequest};
use crate::config::Settings;
use crate::grid::{synthesize, GridPair, GridTemplate, PriceBar, Stance};

use super::errors::{DeployError, DeployResult};
use super::events::{DeployEvent, DeployListener};
use super::poll::{poll_until_running, CancelToken, PollPolicy, PollReport};

/// Everything that stays fixed over one deployment run
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub trading_pair: String,
    pub candle_interval: String,
    pub max_records: u32,
    pub instance_name: String,
    pub credentials_profile: String,
    pub aggressive_side: Stance,
    pub conservative_side: Stance,
    /// Shared grid template; its connector is also used for the candle fetch
    pub template: GridTemplate,
    pub poll: PollPolicy,
}

impl DeployPlan {
    /// Plan with the default deployment for `trading_pair`
    pub fn new(trading_pair: impl Into<String>) -> Self {
        Self {
            trading_pair: trading_pair.into(),
            candle_interval: "1m".into(),
            max_records: 60,
            instance_name: "double_grid_bot".into(),
            credentials_profile: "master_account".into(),
            aggressive_side: Stance::Long,
            conservative_side: Stance::Short,
            template: GridTemplate::default(),
            poll: PollPolicy::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let deploy = &settings.deploy;
        Self {
            trading_pair: deploy.trading_pair.clone(),
            candle_interval: deploy.candle_interval.clone(),
            max_records: deploy.max_records,
            instance_name: deploy.instance_name.clone(),
            credentials_profile: deploy.credentials_profile.clone(),
            aggressive_side: deploy.aggressive_side,
            conservative_side: deploy.conservative_side,
            template: settings.template.clone(),
            poll: settings.poll.policy(),
        }
    }

    /// Builder: set the polling policy
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn deployment_request(&self, configs: &GridPair) -> DeploymentRequest {
        DeploymentRequest::new(
            self.instance_name.clone(),
            self.credentials_profile.clone(),
            configs.ids(),
        )
    }
}

fn bar_time(bar: Option<&PriceBar>) -> Option<DateTime<Utc>> {
    let ts = bar?.timestamp?;
    DateTime::from_timestamp(ts.trunc() as i64, 0)
}

/// Pushes synthesized grids to the service, deploys a bot on them and waits for it to run
pub struct Orchestrator<A: BotApi> {
    api: A,
    listener: Arc<dyn DeployListener>,
    plan: DeployPlan,
}

impl<A: BotApi> Orchestrator<A> {
    pub fn new(api: A, listener: Arc<dyn DeployListener>, plan: DeployPlan) -> Self {
        Self {
            api,
            listener,
            plan,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn plan(&self) -> &DeployPlan {
        &self.plan
    }

    /// Fetch the price history and derive both grids
    ///
    /// Synthesis errors surface before anything is written to the service.
    pub async fn synthesize_configs(&self) -> DeployResult<GridPair> {
        let plan = &self.plan;
        let bars = self
            .api
            .fetch_candles(
                &plan.template.connector_name,
                &plan.trading_pair,
                &plan.candle_interval,
                plan.max_records,
            )
            .await?;

        self.listener.on_event(DeployEvent::HistoryFetched {
            bars: bars.len(),
            from: bar_time(bars.first()),
            to: bar_time(bars.last()),
        });

        Ok(synthesize(
            &bars,
            &plan.trading_pair,
            plan.aggressive_side,
            plan.conservative_side,
            &plan.template,
        )?)
    }

    /// Upsert both configs (aggressive first) and return the stored config ids
    pub async fn store_configs(&self, configs: &GridPair) -> DeployResult<Vec<String>> {
        for config in configs.configs() {
            self.api.upsert_controller_config(&config.id, config).await?;
            self.listener.on_event(DeployEvent::ConfigStored {
                id: config.id.clone(),
            });
        }

        let available = self.api.list_controller_configs().await?;
        self.listener
            .on_event(DeployEvent::AvailableConfigs(available.clone()));
        Ok(available)
    }

    /// Request a bot instance running both configs
    pub async fn deploy(&self, configs: &GridPair) -> DeployResult<DeploymentRequest> {
        let request = self.plan.deployment_request(configs);
        self.api.deploy_controllers(&request).await?;
        self.listener.on_event(DeployEvent::DeploymentRequested {
            instance_name: request.instance_name.clone(),
            config_ids: request.config_ids.clone(),
        });
        Ok(request)
    }

    /// Store, deploy and poll until the bot runs
    ///
    /// Errors from storing or deploying are returned as-is; status fetch errors
    /// are retried according to the plan's [`PollPolicy`]. A cancelled token
    /// stops the run before each remote write.
    pub async fn run(
        &self,
        configs: &GridPair,
        cancel: &mut CancelToken,
    ) -> DeployResult<PollReport> {
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled { attempts: 0 });
        }
        self.store_configs(configs).await?;

        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled { attempts: 0 });
        }
        self.deploy(configs).await?;

        poll_until_running(&self.api, self.listener.as_ref(), &self.plan.poll, cancel).await
    }

    /// Full run: fetch history, synthesize both grids, then [`Orchestrator::run`]
    pub async fn synthesize_and_deploy(
        &self,
        cancel: &mut CancelToken,
    ) -> DeployResult<PollReport> {
        let configs = self.synthesize_configs().await?;
        self.run(&configs, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::api::mock::MockBotApi;
    use crate::api::{ApiError, BotState};
    use crate::deploy::events::RecordingListener;
    use crate::deploy::poll::{cancel_pair, CancelHandle};
    use crate::grid::GridError;

    fn history(len: usize) -> Vec<PriceBar> {
        (0..len)
            .map(|i| {
                let close = 1.0 + (i % 7) as f64 * 0.01;
                PriceBar::new(close + 0.005, close - 0.005, close)
                    .at(1_700_000_000.0 + 60.0 * i as f64)
            })
            .collect()
    }

    fn create_test_orchestrator(
        api: MockBotApi,
    ) -> (Orchestrator<MockBotApi>, Arc<RecordingListener>) {
        let listener = Arc::new(RecordingListener::new());
        let policy = PollPolicy::unbounded(Duration::from_secs(5)).with_max_attempts(10);
        let plan = DeployPlan::new("ERA-USDT").with_poll_policy(policy);
        (Orchestrator::new(api, listener.clone(), plan), listener)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_deployment() {
        let api = MockBotApi::new(history(60)).with_statuses(vec![
            Ok(BotState::Initializing),
            Ok(BotState::Initializing),
            Ok(BotState::Running),
        ]);
        let (orchestrator, listener) = create_test_orchestrator(api);

        let report = orchestrator
            .synthesize_and_deploy(&mut CancelToken::never())
            .await
            .unwrap();
        assert_eq!(report.attempts, 3);

        let api = orchestrator.api();
        let stored = api.configs.lock().await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["aggressive_grid"].side, Stance::Long);
        assert_eq!(stored["conservative_grid"].side, Stance::Short);

        let deployments = api.deployments.lock().await;
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].instance_name, "double_grid_bot");
        assert_eq!(deployments[0].credentials_profile, "master_account");
        assert_eq!(deployments[0].config_ids, vec!["aggressive_grid", "conservative_grid"]);

        let events = listener.events();
        assert!(matches!(
            events[0],
            DeployEvent::HistoryFetched { bars: 60, from: Some(_), to: Some(_) }
        ));
        assert!(events.contains(&DeployEvent::AvailableConfigs(vec![
            "aggressive_grid".into(),
            "conservative_grid".into()
        ])));
        assert_eq!(
            listener.count(|e| matches!(e, DeployEvent::BotRunning { .. })),
            1
        );
    }

    #[tokio::test]
    async fn test_insufficient_history_aborts_before_remote_writes() {
        let api = MockBotApi::new(history(12)).with_statuses(vec![Ok(BotState::Running)]);
        let (orchestrator, _listener) = create_test_orchestrator(api);

        let result = orchestrator
            .synthesize_and_deploy(&mut CancelToken::never())
            .await;

        assert!(matches!(
            result,
            Err(DeployError::Grid(GridError::InsufficientHistory { required: 20, got: 12 }))
        ));
        let api = orchestrator.api();
        assert_eq!(api.upserts.load(Ordering::SeqCst), 0);
        assert!(api.deployments.lock().await.is_empty());
        assert_eq!(api.status_fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_history_aborts() {
        let api = MockBotApi::new(Vec::new());
        let (orchestrator, _listener) = create_test_orchestrator(api);

        let result = orchestrator
            .synthesize_and_deploy(&mut CancelToken::never())
            .await;

        assert!(matches!(result, Err(DeployError::Grid(GridError::EmptyHistory))));
        assert_eq!(orchestrator.api().upserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upsert_failure_propagates() {
        let api = MockBotApi::new(history(30)).with_statuses(vec![Ok(BotState::Running)]);
        api.set_should_fail(true).await;
        let (orchestrator, _listener) = create_test_orchestrator(api);

        let result = orchestrator
            .synthesize_and_deploy(&mut CancelToken::never())
            .await;

        assert!(matches!(
            result,
            Err(DeployError::Api(ApiError::Status { status: 500, .. }))
        ));
        assert!(orchestrator.api().deployments.lock().await.is_empty());
        assert_eq!(orchestrator.api().status_fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_store_writes_nothing() {
        let api = MockBotApi::new(history(30)).with_statuses(vec![Ok(BotState::Running)]);
        let (orchestrator, _listener) = create_test_orchestrator(api);
        let (handle, mut token) = cancel_pair();
        handle.cancel();

        let result = orchestrator.synthesize_and_deploy(&mut token).await;

        assert!(matches!(result, Err(DeployError::Cancelled { attempts: 0 })));
        let api = orchestrator.api();
        assert_eq!(api.upserts.load(Ordering::SeqCst), 0);
        assert!(api.deployments.lock().await.is_empty());
        assert_eq!(api.status_fetch_count(), 0);
    }

    /// Cancels its handle as soon as the stored configs are listed
    struct CancelAfterStore {
        handle: CancelHandle,
    }

    impl DeployListener for CancelAfterStore {
        fn on_event(&self, event: DeployEvent) {
            if matches!(event, DeployEvent::AvailableConfigs(_)) {
                self.handle.cancel();
            }
        }
    }

    #[tokio::test]
    async fn test_cancelled_after_store_skips_deploy() {
        let api = MockBotApi::new(history(30)).with_statuses(vec![Ok(BotState::Running)]);
        let (handle, mut token) = cancel_pair();
        let orchestrator = Orchestrator::new(
            api,
            Arc::new(CancelAfterStore { handle }),
            DeployPlan::new("ERA-USDT"),
        );

        let result = orchestrator.synthesize_and_deploy(&mut token).await;

        assert!(matches!(result, Err(DeployError::Cancelled { attempts: 0 })));
        let api = orchestrator.api();
        assert_eq!(api.upserts.load(Ordering::SeqCst), 2);
        assert!(api.deployments.lock().await.is_empty());
        assert_eq!(api.status_fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redeploy_overwrites_configs() {
        let api = MockBotApi::new(history(60)).with_statuses(vec![Ok(BotState::Running)]);
        let (orchestrator, _listener) = create_test_orchestrator(api);

        let configs = orchestrator.synthesize_configs().await.unwrap();
        orchestrator.run(&configs, &mut CancelToken::never()).await.unwrap();
        orchestrator.run(&configs, &mut CancelToken::never()).await.unwrap();

        let api = orchestrator.api();
        assert_eq!(api.upserts.load(Ordering::SeqCst), 4);
        assert_eq!(
            api.list_controller_configs().await.unwrap(),
            vec!["aggressive_grid", "conservative_grid"]
        );
    }

    #[test]
    fn test_plan_from_settings() {
        let settings = Settings::from_toml(
            r#"
            [deploy]
            trading_pair = "BTC-USDT"
            instance_name = "btc_grid"

            [poll]
            interval_secs = 1
            "#,
        )
        .unwrap();
        let plan = DeployPlan::from_settings(&settings);

        assert_eq!(plan.trading_pair, "BTC-USDT");
        assert_eq!(plan.instance_name, "btc_grid");
        assert_eq!(plan.max_records, 60);
        assert_eq!(plan.poll.interval, Duration::from_secs(1));
        assert_eq!(plan.template.connector_name, "binance_perpetual");
    }
}
