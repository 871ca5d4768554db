use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use autotest_core::{AutoTestStage, PlanType, Result, StationRegistry};

use crate::runner::StationRunner;

/// 一次触发请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub stage: AutoTestStage,
    /// 只执行该计划类型的站点
    pub plan_type: Option<PlanType>,
    pub image_name: Option<String>,
}

impl DispatchRequest {
    pub fn new(stage: AutoTestStage) -> Self {
        Self {
            stage,
            plan_type: None,
            image_name: None,
        }
    }

    pub fn with_plan_type(mut self, plan_type: PlanType) -> Self {
        self.plan_type = Some(plan_type);
        self
    }

    pub fn with_image_name(mut self, image_name: impl Into<String>) -> Self {
        self.image_name = Some(image_name.into());
        self
    }
}

/// 运行中任务计数，任务结束或异常退出时随任务一起释放
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 回归测试编排器
///
/// 每次触发为每个已落地数据集的站点启动一个独立任务，不等待任务结束。
pub struct Orchestrator {
    registry: Arc<StationRegistry>,
    runner: Arc<StationRunner>,
    staging_root: PathBuf,
    tasks: Mutex<JoinSet<(String, usize)>>,
    in_flight: Arc<AtomicUsize>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<StationRegistry>,
        runner: Arc<StationRunner>,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            runner,
            staging_root: staging_root.into(),
            tasks: Mutex::new(JoinSet::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 启动站点任务，返回启动数量
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<usize> {
        let stations = self.staged_stations(request.plan_type).await?;

        let mut tasks = self.tasks.lock().await;
        while let Some(finished) = tasks.try_join_next() {
            log_finished(finished);
        }

        for station_id in &stations {
            let runner = self.runner.clone();
            let station_id = station_id.clone();
            let staging_root = self.staging_root.clone();
            let image_name = request.image_name.clone();
            let stage = request.stage;
            let guard = InFlightGuard::acquire(&self.in_flight);

            tasks.spawn(async move {
                let _guard = guard;
                let runs = runner
                    .run(&station_id, stage, image_name, &staging_root)
                    .await;
                (station_id, runs)
            });
        }

        info!(
            stage = %request.stage,
            plan_type = ?request.plan_type,
            launched = stations.len(),
            "已启动站点任务: {:?}",
            stations
        );
        Ok(stations.len())
    }

    /// 正在运行的站点任务数，包括 `wait_idle` 正在等待的任务
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 等待所有已启动的站点任务结束
    ///
    /// 等待期间不持有任务集合的锁，新的触发可以继续启动任务。
    pub async fn wait_idle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.tasks.lock().await);
            if pending.is_empty() {
                return;
            }
            while let Some(finished) = pending.join_next().await {
                log_finished(finished);
            }
        }
    }

    /// 暂存目录下属于已知站点的一级子目录
    async fn staged_stations(&self, plan_type: Option<PlanType>) -> Result<Vec<String>> {
        if !fs::try_exists(&self.staging_root).await? {
            warn!("数据集暂存目录不存在: {}", self.staging_root.display());
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.staging_root).await?;
        let mut stations = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(profile) = self.registry.get(&name) else {
                debug!("忽略非站点目录: {}", name);
                continue;
            };
            if plan_type.is_some_and(|t| t != profile.plan_type) {
                continue;
            }
            stations.push(name);
        }

        stations.sort();
        Ok(stations)
    }
}

fn log_finished(finished: std::result::Result<(String, usize), JoinError>) {
    match finished {
        Ok((station_id, runs)) => debug!(station = %station_id, runs, "站点任务结束"),
        Err(e) => error!("站点任务异常退出: {}", e),
    }
}
