//! # Autotest Dispatcher
//!
//! 回归测试的执行引擎：
//!
//! - [`Orchestrator`] 每次触发为每个已落地数据集的站点启动一个任务
//! - [`StationRunner`] 在站点内串行处理每个数据集运行
//! - [`PlanWorkflow`] 针对单个运行驱动远程排程服务的状态机
//! - [`BusyGate`] 排程前等待同站点的计划排程结束

pub mod busy_gate;
pub mod orchestrator;
pub mod plan_number;
pub mod runner;
pub mod workflow;

pub use busy_gate::{BusyGate, GateFailurePolicy};
pub use orchestrator::{DispatchRequest, Orchestrator};
pub use plan_number::PlanNumberGenerator;
pub use runner::StationRunner;
pub use workflow::{PlanWorkflow, WorkflowTiming};
