//! # Autotest Core
//!
//! 自动化回归测试编排系统的核心库：错误类型、数据模型、配置、日志初始化，
//! 以及远程排程服务和告警通知的抽象接口。

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod registry;
pub mod traits;

pub use errors::*;
pub use models::{
    AutoTestStage, PlanHandle, PlanType, RunRequest, ScheduleOptions, StationProfile,
    WorkflowReport, WorkflowResult, WorkflowState,
};
pub use registry::StationRegistry;
pub use traits::{Notifier, PlanService};
