use std::fmt;

use serde::{Deserialize, Serialize};

/// 计划工作流终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowResult {
    Success,
    PlanCreationFailed,
    SchedulingFailed,
    ProgressPollFailed,
    NoScheduledJobs,
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowResult::Success)
    }

    /// 指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowResult::Success => "success",
            WorkflowResult::PlanCreationFailed => "plan_creation_failed",
            WorkflowResult::SchedulingFailed => "scheduling_failed",
            WorkflowResult::ProgressPollFailed => "progress_poll_failed",
            WorkflowResult::NoScheduledJobs => "no_scheduled_jobs",
        }
    }

    /// 通知中展示的结果描述
    pub fn describe(&self) -> &'static str {
        match self {
            WorkflowResult::Success => "排程成功",
            WorkflowResult::PlanCreationFailed => "创建计划失败",
            WorkflowResult::SchedulingFailed => "触发排程失败",
            WorkflowResult::ProgressPollFailed => "查询排程进度失败",
            WorkflowResult::NoScheduledJobs => "排程结果为空",
        }
    }
}

impl fmt::Display for WorkflowResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// 计划工作流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Created,
    /// 等待同类型计划排程结束
    Gating,
    Scheduling,
    Polling,
    Verifying,
    Succeeded,
    Failed(WorkflowResult),
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Succeeded | WorkflowState::Failed(_))
    }
}

/// 一次计划工作流的执行记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub station_code: String,
    pub plan_no: String,
    /// 按访问顺序记录的状态
    pub states: Vec<WorkflowState>,
    /// 忙碌检查次数
    pub gate_checks: u32,
    /// 进度查询次数
    pub poll_count: u32,
    pub last_progress: Option<u8>,
    pub result: WorkflowResult,
    /// 失败时的远程错误信息
    pub detail: Option<String>,
}

impl WorkflowReport {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    pub fn final_state(&self) -> Option<WorkflowState> {
        self.states.last().copied()
    }
}
