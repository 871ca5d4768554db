use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 数据集目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// 已落地数据集根目录，结构为 `<station_id>/<run>/{配置文件, 快照文件}`
    pub staging_root: PathBuf,
    /// 站点执行工作目录根，每个站点一个子目录
    pub workspace_root: PathBuf,
    pub config_extensions: Vec<String>,
    pub snapshot_extensions: Vec<String>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            staging_root: PathBuf::from("data/staging"),
            workspace_root: PathBuf::from("data/workspace"),
            config_extensions: vec![
                "json".to_string(),
                "yaml".to_string(),
                "yml".to_string(),
                "toml".to_string(),
            ],
            snapshot_extensions: vec!["h5".to_string(), "hdf5".to_string()],
        }
    }
}

impl StagingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.staging_root.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("数据集根目录不能为空"));
        }
        if self.workspace_root.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("工作目录根不能为空"));
        }
        if self.staging_root == self.workspace_root {
            return Err(anyhow::anyhow!("数据集根目录和工作目录不能相同"));
        }
        if self.config_extensions.is_empty() || self.snapshot_extensions.is_empty() {
            return Err(anyhow::anyhow!("配置文件和快照文件扩展名不能为空"));
        }
        if self
            .config_extensions
            .iter()
            .any(|ext| self.snapshot_extensions.contains(ext))
        {
            return Err(anyhow::anyhow!("配置文件和快照文件扩展名不能重叠"));
        }
        Ok(())
    }
}

/// 轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub busy_gate_interval_seconds: u64,
    pub progress_interval_seconds: u64,
    /// 忙碌查询失败时视为空闲
    pub busy_gate_fail_open: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            busy_gate_interval_seconds: 60,
            progress_interval_seconds: 60,
            busy_gate_fail_open: true,
        }
    }
}

impl PollingConfig {
    pub fn busy_gate_interval(&self) -> Duration {
        Duration::from_secs(self.busy_gate_interval_seconds)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.busy_gate_interval_seconds == 0 {
            return Err(anyhow::anyhow!("忙碌检查间隔必须大于0"));
        }
        if self.progress_interval_seconds == 0 {
            return Err(anyhow::anyhow!("进度轮询间隔必须大于0"));
        }
        Ok(())
    }
}

/// 创建计划时的固定参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// 计划编号前缀
    pub plan_no_prefix: String,
    pub min_schedule_minutes: u32,
    pub max_schedule_minutes: u32,
    pub exec: String,
    pub data_source: String,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            plan_no_prefix: "Test".to_string(),
            min_schedule_minutes: 24,
            max_schedule_minutes: 30,
            exec: "algo".to_string(),
            data_source: "test".to_string(),
        }
    }
}

impl PlanConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_schedule_minutes == 0 {
            return Err(anyhow::anyhow!("排程时间窗口下限必须大于0"));
        }
        if self.min_schedule_minutes > self.max_schedule_minutes {
            return Err(anyhow::anyhow!(
                "排程时间窗口无效: {} > {}",
                self.min_schedule_minutes,
                self.max_schedule_minutes
            ));
        }
        if self.exec.is_empty() || self.data_source.is_empty() {
            return Err(anyhow::anyhow!("exec和dataSource不能为空"));
        }
        Ok(())
    }
}
