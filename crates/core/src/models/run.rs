use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::station::StationProfile;
use crate::errors::AutotestError;

/// 触发阶段，随计划一起作为元数据转发给远程服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoTestStage {
    /// 每月手动触发
    Monthly,
    /// 分支推送触发
    Push,
    /// 合并触发
    Merge,
}

impl AutoTestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoTestStage::Monthly => "monthly",
            AutoTestStage::Push => "push",
            AutoTestStage::Merge => "merge",
        }
    }
}

impl fmt::Display for AutoTestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoTestStage {
    type Err = AutotestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "monthly" => Ok(AutoTestStage::Monthly),
            "push" => Ok(AutoTestStage::Push),
            "merge" => Ok(AutoTestStage::Merge),
            _ => Err(AutotestError::InvalidStage(value.to_string())),
        }
    }
}

/// 单次数据集运行请求
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub station: Arc<StationProfile>,
    /// 已落地的配置文件和快照文件所在目录
    pub dataset_path: PathBuf,
    pub stage: AutoTestStage,
    /// 镜像名，仅在 push 阶段有意义
    pub image_name: Option<String>,
}

impl RunRequest {
    pub fn new(
        station: Arc<StationProfile>,
        dataset_path: PathBuf,
        stage: AutoTestStage,
        image_name: Option<String>,
    ) -> Self {
        // 镜像名只随 push 阶段转发
        let image_name = match stage {
            AutoTestStage::Push => image_name,
            _ => None,
        };
        Self {
            station,
            dataset_path,
            stage,
            image_name,
        }
    }

    pub fn schedule_options(&self) -> ScheduleOptions {
        ScheduleOptions {
            allow_multi_threads: self.station.allow_multi_threads,
            stage: self.stage,
            image_name: self.image_name.clone(),
        }
    }
}

/// 触发排程时附带的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub allow_multi_threads: bool,
    pub stage: AutoTestStage,
    pub image_name: Option<String>,
}

/// 远程服务返回的计划ID
///
/// 远程服务可能返回数字或字符串，这里保留原始JSON值以便原样回传。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanHandle(Value);

impl PlanHandle {
    pub fn new(id: Value) -> Self {
        Self(id)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for PlanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}
