use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use autotest_api::{create_app, AppState};
use autotest_core::config::AppConfig;
use autotest_core::{Notifier, PlanService, StationRegistry};
use autotest_dispatcher::{Orchestrator, PlanWorkflow, StationRunner, WorkflowTiming};
use autotest_infrastructure::{DatasetStager, LogNotifier, RemoteApiClient, WebhookNotifier};
use axum::Router;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{info, warn};

/// 主应用程序
pub struct Application {
    config: AppConfig,
    registry: Arc<StationRegistry>,
    orchestrator: Arc<Orchestrator>,
    stager: DatasetStager,
}

impl Application {
    /// 根据配置创建远程服务客户端和告警通知
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("连接远程排程服务: {}", config.remote.base_url);
        let plan_service = RemoteApiClient::new(
            config.remote.base_url.clone(),
            config.remote.request_timeout(),
        )
        .context("创建远程服务客户端失败")?;

        let notifier: Arc<dyn Notifier> = match &config.notifier.webhook_url {
            Some(url) => Arc::new(
                WebhookNotifier::new(url.clone(), config.notifier.request_timeout())
                    .context("创建告警通知失败")?,
            ),
            None => {
                warn!("未配置告警webhook，通知只写入日志");
                Arc::new(LogNotifier)
            }
        };

        Ok(Self::with_services(config, Arc::new(plan_service), notifier))
    }

    /// 使用指定的远程服务和告警通知组装应用
    pub fn with_services(
        config: AppConfig,
        plan_service: Arc<dyn PlanService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let registry = Arc::new(StationRegistry::from_config(&config.stations));
        let workflow = Arc::new(PlanWorkflow::new(
            plan_service,
            notifier,
            config.plan.clone(),
            WorkflowTiming::from_config(&config.polling),
        ));
        let runner = Arc::new(StationRunner::new(
            registry.clone(),
            workflow,
            config.staging.workspace_root.clone(),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            registry.clone(),
            runner,
            config.staging.staging_root.clone(),
        ));

        info!(
            "应用初始化完成: stations={:?}",
            registry.station_ids().collect::<Vec<_>>()
        );

        Self {
            stager: DatasetStager::new(&config.staging),
            config,
            registry,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        self.orchestrator.clone()
    }

    pub fn router(&self) -> Router {
        create_app(AppState {
            orchestrator: self.orchestrator.clone(),
            registry: self.registry.clone(),
        })
    }

    /// 发布已解压的数据集批次，替换该站点已有的数据集
    pub async fn publish_dataset(&self, station_id: &str, batch_dir: &Path) -> Result<usize> {
        self.registry.resolve(station_id)?;
        let runs = self
            .stager
            .publish(batch_dir, station_id)
            .await
            .with_context(|| format!("发布数据集批次失败: {}", batch_dir.display()))?;
        Ok(runs)
    }

    /// 运行应用程序直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        if !self.config.api.enabled {
            warn!("API服务器被禁用，只能等待关闭信号");
            let _ = shutdown_rx.recv().await;
            self.drain().await;
            return Ok(());
        }

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        self.serve(listener, shutdown_rx).await
    }

    /// 在指定监听器上提供触发接口，关闭后等待站点任务结束
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let address = listener.local_addr().context("读取监听地址失败")?;
        info!("API服务器启动在 http://{}", address);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        self.drain().await;
        Ok(())
    }

    async fn drain(&self) {
        let in_flight = self.orchestrator.in_flight();
        if in_flight > 0 {
            info!("等待{}个站点任务结束", in_flight);
        }
        self.orchestrator.wait_idle().await;
        info!("所有站点任务已结束");
    }
}
