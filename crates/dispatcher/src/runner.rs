use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::fs;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use autotest_core::{AutoTestStage, Result, RunRequest, StationRegistry};

use crate::plan_number::PlanNumberGenerator;
use crate::workflow::PlanWorkflow;

/// 站点执行器
///
/// 按名称顺序逐个处理站点下的数据集运行：先把运行目录复制到站点工作区，
/// 再执行一次计划工作流。同一站点的运行严格串行：重叠的触发在站点锁上
/// 排队，直到前一次执行结束。
pub struct StationRunner {
    registry: Arc<StationRegistry>,
    workflow: Arc<PlanWorkflow>,
    workspace_root: PathBuf,
    plan_numbers: PlanNumberGenerator,
    station_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl StationRunner {
    pub fn new(
        registry: Arc<StationRegistry>,
        workflow: Arc<PlanWorkflow>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        let plan_numbers = PlanNumberGenerator::new(workflow.plan_config().plan_no_prefix.clone());
        Self {
            registry,
            workflow,
            workspace_root: workspace_root.into(),
            plan_numbers,
            station_locks: Mutex::new(HashMap::new()),
        }
    }

    fn station_lock(&self, station_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .station_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(station_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// 执行站点下的全部数据集，返回实际执行的运行数
    pub async fn run(
        &self,
        station_id: &str,
        stage: AutoTestStage,
        image_name: Option<String>,
        dataset_root: &Path,
    ) -> usize {
        let Some(station) = self.registry.get(station_id) else {
            warn!(station = station_id, "未知站点，跳过");
            return 0;
        };

        let lock = self.station_lock(station_id);
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                info!(station = station_id, stage = %stage, "站点正在执行，等待前一次执行结束");
                lock.lock().await
            }
        };

        let station_dir = dataset_root.join(station_id);
        let runs = match list_run_dirs(&station_dir).await {
            Ok(runs) => runs,
            Err(e) => {
                error!(
                    station = station_id,
                    "读取数据集目录失败: path={}, error={}",
                    station_dir.display(),
                    e
                );
                return 0;
            }
        };

        info!(station = station_id, stage = %stage, runs = runs.len(), "开始执行站点回归测试");

        let mut executed = 0;
        for run_dir in runs {
            let workspace = match self.prepare_workspace(station_id, &run_dir).await {
                Ok(workspace) => workspace,
                Err(e) => {
                    error!(
                        station = station_id,
                        "复制数据集到工作区失败，跳过该运行: run={}, error={}",
                        run_dir.display(),
                        e
                    );
                    continue;
                }
            };

            let request = RunRequest::new(station.clone(), workspace, stage, image_name.clone());
            let plan_no = self.plan_numbers.next(&station.station_code);
            let report = self.workflow.execute(&request, &plan_no).await;

            metrics::counter!("autotest_station_runs_total", "station" => station_id.to_string())
                .increment(1);
            info!(
                station = station_id,
                plan_no = %report.plan_no,
                run = %run_dir.display(),
                outcome = report.result.as_str(),
                "数据集运行结束"
            );
            executed += 1;
        }

        executed
    }

    /// 清空站点工作区后复制运行目录中的文件
    async fn prepare_workspace(&self, station_id: &str, run_dir: &Path) -> Result<PathBuf> {
        let workspace = self.workspace_root.join(station_id);
        if fs::try_exists(&workspace).await? {
            fs::remove_dir_all(&workspace).await?;
        }
        fs::create_dir_all(&workspace).await?;

        let mut entries = fs::read_dir(run_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::copy(entry.path(), workspace.join(entry.file_name())).await?;
            }
        }

        Ok(workspace)
    }
}

/// 站点目录下的直接子目录，按名称排序
async fn list_run_dirs(station_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(station_dir).await?;
    let mut runs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            runs.push(entry.path());
        }
    }
    runs.sort();
    Ok(runs)
}
