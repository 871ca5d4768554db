//! # 数据模型
//!
//! 定义自动化回归测试编排系统的核心数据结构。
//!
//! ## 核心模型
//!
//! ### StationProfile - 站点路由信息
//! 每个站点（订单计划、S1/D1/D2/T1作业计划）对应的计划类型、远程接口、
//! 是否允许多线程排程以及告警接收人。启动时加载一次，之后只读。
//!
//! ### RunRequest - 单次数据集运行请求
//! 站点下的一个已落地数据集目录，被一次计划工作流消费后即丢弃。
//!
//! ### PlanHandle - 远程计划标识
//! 远程排程服务创建计划后返回的ID，仅属于创建它的工作流实例。
//!
//! ### WorkflowResult - 工作流结果
//! 一次计划工作流执行的终态，用于生成通知内容。
//!
//! ## 状态流转
//!
//! ```text
//! Created → Gating → Scheduling → Polling → Verifying → Succeeded
//!    ↓         ↓          ↓          ↓           ↓
//!  Failed    (无失败)    Failed     Failed      Failed
//! ```

pub mod run;
pub mod station;
pub mod workflow;

pub use run::{AutoTestStage, PlanHandle, RunRequest, ScheduleOptions};
pub use station::{PlanType, StationProfile};
pub use workflow::{WorkflowReport, WorkflowResult, WorkflowState};
