//! 计划工作流
//!
//! 每个数据集运行执行一次：创建计划 → 忙碌检查 → 触发排程 → 轮询进度 →
//! 校验排程结果。任一远程调用失败立即进入失败终态，不重试。到达终态时
//! 恰好发送一次告警通知。

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use autotest_core::config::{PlanConfig, PollingConfig};
use autotest_core::{
    Notifier, PlanHandle, PlanService, RemoteError, RunRequest, WorkflowReport, WorkflowResult,
    WorkflowState,
};

use crate::busy_gate::{BusyGate, GateFailurePolicy};

/// 轮询间隔和忙碌检查策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowTiming {
    pub busy_gate_interval: Duration,
    pub progress_interval: Duration,
    pub gate_policy: GateFailurePolicy,
}

impl WorkflowTiming {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            busy_gate_interval: config.busy_gate_interval(),
            progress_interval: config.progress_interval(),
            gate_policy: GateFailurePolicy::from_fail_open(config.busy_gate_fail_open),
        }
    }
}

impl Default for WorkflowTiming {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

struct StepFailure {
    result: WorkflowResult,
    detail: String,
}

impl StepFailure {
    fn remote(result: WorkflowResult) -> impl FnOnce(RemoteError) -> Self {
        move |e| Self {
            result,
            detail: e.to_string(),
        }
    }
}

pub struct PlanWorkflow {
    plan_service: Arc<dyn PlanService>,
    notifier: Arc<dyn Notifier>,
    gate: BusyGate,
    plan_config: PlanConfig,
    progress_interval: Duration,
}

impl PlanWorkflow {
    pub fn new(
        plan_service: Arc<dyn PlanService>,
        notifier: Arc<dyn Notifier>,
        plan_config: PlanConfig,
        timing: WorkflowTiming,
    ) -> Self {
        let gate = BusyGate::new(
            plan_service.clone(),
            timing.busy_gate_interval,
            timing.gate_policy,
        );
        Self {
            plan_service,
            notifier,
            gate,
            plan_config,
            progress_interval: timing.progress_interval,
        }
    }

    pub fn plan_config(&self) -> &PlanConfig {
        &self.plan_config
    }

    /// 创建计划的请求体
    pub fn build_payload(&self, request: &RunRequest, plan_no: &str) -> Value {
        let mut payload = json!({
            "planNo": plan_no,
            "stationCode": request.station.station_code,
            "minScheduleMinutes": self.plan_config.min_schedule_minutes,
            "maxScheduleMinutes": self.plan_config.max_schedule_minutes,
            "exec": self.plan_config.exec,
            "dataSource": self.plan_config.data_source,
            "allowMultiThreads": request.station.allow_multi_threads,
            "autoTestStage": request.stage.as_str(),
        });
        if let Some(image_name) = &request.image_name {
            payload["imageName"] = json!(image_name);
        }
        payload
    }

    /// 执行工作流直到终态
    pub async fn execute(&self, request: &RunRequest, plan_no: &str) -> WorkflowReport {
        let mut report = WorkflowReport {
            station_code: request.station.station_code.clone(),
            plan_no: plan_no.to_string(),
            states: vec![WorkflowState::Created],
            gate_checks: 0,
            poll_count: 0,
            last_progress: None,
            result: WorkflowResult::Success,
            detail: None,
        };

        match self.drive(request, plan_no, &mut report).await {
            Ok(()) => {
                report.states.push(WorkflowState::Succeeded);
                info!(
                    station = %report.station_code,
                    plan_no,
                    stage = %request.stage,
                    polls = report.poll_count,
                    "计划排程成功"
                );
            }
            Err(failure) => {
                report.result = failure.result;
                report.states.push(WorkflowState::Failed(failure.result));
                error!(
                    station = %report.station_code,
                    plan_no,
                    stage = %request.stage,
                    "计划工作流失败: {}: {}",
                    failure.result,
                    failure.detail
                );
                report.detail = Some(failure.detail);
            }
        }

        metrics::counter!("autotest_workflow_total", "outcome" => report.result.as_str())
            .increment(1);
        self.notifier
            .notify(&notification_message(request, &report), &request.station.recipients)
            .await;

        report
    }

    async fn drive(
        &self,
        request: &RunRequest,
        plan_no: &str,
        report: &mut WorkflowReport,
    ) -> Result<(), StepFailure> {
        let station = &request.station;
        let plan_type = station.plan_type;

        let payload = self.build_payload(request, plan_no);
        let handle = self
            .plan_service
            .new_plan(plan_type, &station.endpoint, &payload)
            .await
            .map_err(StepFailure::remote(WorkflowResult::PlanCreationFailed))?;
        info!(station = %station.station_code, plan_no, plan_id = %handle, "计划已创建");

        report.states.push(WorkflowState::Gating);
        report.gate_checks = self
            .gate
            .wait_until_idle(plan_type, &station.station_code)
            .await;

        report.states.push(WorkflowState::Scheduling);
        self.plan_service
            .schedule(plan_type, &handle, &request.schedule_options())
            .await
            .map_err(StepFailure::remote(WorkflowResult::SchedulingFailed))?;
        info!(station = %station.station_code, plan_no, "已触发自动排程");

        report.states.push(WorkflowState::Polling);
        self.poll_until_complete(request, &handle, plan_no, report)
            .await?;

        report.states.push(WorkflowState::Verifying);
        let jobs = self
            .plan_service
            .get_scheduled_jobs(plan_type, &handle)
            .await
            .map_err(StepFailure::remote(WorkflowResult::NoScheduledJobs))?;

        if jobs.is_empty() {
            warn!(station = %station.station_code, plan_no, "排程完成但没有排程结果");
            return Err(StepFailure {
                result: WorkflowResult::NoScheduledJobs,
                detail: "排程结果列表为空".to_string(),
            });
        }

        debug!(station = %station.station_code, plan_no, jobs = jobs.len(), "排程结果校验通过");
        Ok(())
    }

    async fn poll_until_complete(
        &self,
        request: &RunRequest,
        handle: &PlanHandle,
        plan_no: &str,
        report: &mut WorkflowReport,
    ) -> Result<(), StepFailure> {
        loop {
            let progress = self
                .plan_service
                .get_progress(request.station.plan_type, handle)
                .await
                .map_err(StepFailure::remote(WorkflowResult::ProgressPollFailed))?;
            report.poll_count += 1;
            report.last_progress = Some(progress);

            if progress >= 100 {
                return Ok(());
            }

            debug!(
                station = %request.station.station_code,
                plan_no,
                progress,
                "排程进行中"
            );
            tokio::time::sleep(self.progress_interval).await;
        }
    }
}

fn notification_message(request: &RunRequest, report: &WorkflowReport) -> String {
    let mut message = format!(
        "【自动化回归测试】{}\n站点: {}\n计划编号: {}\n触发阶段: {}",
        report.result, report.station_code, report.plan_no, request.stage
    );
    if let Some(image_name) = &request.image_name {
        message.push_str(&format!("\n镜像: {image_name}"));
    }
    if let Some(detail) = &report.detail {
        message.push_str(&format!("\n原因: {detail}"));
    }
    message
}
