use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use autotest_core::{PlanService, PlanType};

/// 忙碌查询失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateFailurePolicy {
    /// 查询失败视为空闲，继续排程
    #[default]
    FailOpen,
    /// 查询失败视为忙碌，继续等待
    FailClosed,
}

impl GateFailurePolicy {
    pub fn from_fail_open(fail_open: bool) -> Self {
        if fail_open {
            GateFailurePolicy::FailOpen
        } else {
            GateFailurePolicy::FailClosed
        }
    }
}

/// 排程前的忙碌检查
///
/// 同一计划类型下任何站点的计划处于 computing 状态时循环等待，没有超时。
#[derive(Clone)]
pub struct BusyGate {
    plan_service: Arc<dyn PlanService>,
    interval: Duration,
    policy: GateFailurePolicy,
}

impl BusyGate {
    pub fn new(
        plan_service: Arc<dyn PlanService>,
        interval: Duration,
        policy: GateFailurePolicy,
    ) -> Self {
        Self {
            plan_service,
            interval,
            policy,
        }
    }

    pub fn policy(&self) -> GateFailurePolicy {
        self.policy
    }

    /// 等待直到远程服务空闲，返回查询次数
    pub async fn wait_until_idle(&self, plan_type: PlanType, station_code: &str) -> u32 {
        let mut checks = 0;

        loop {
            checks += 1;
            let busy = match self.plan_service.is_busy(plan_type, station_code).await {
                Ok(busy) => busy,
                Err(e) => {
                    let assume_busy = self.policy == GateFailurePolicy::FailClosed;
                    warn!(
                        station = station_code,
                        "忙碌检查失败: {}, 按{}处理",
                        e,
                        if assume_busy { "忙碌" } else { "空闲" }
                    );
                    assume_busy
                }
            };

            if !busy {
                return checks;
            }

            debug!(
                station = station_code,
                checks, "远程服务正在排程，{:?}后重试", self.interval
            );
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autotest_core::{AutoTestStage, RemoteError, ScheduleOptions};
    use autotest_testing_utils::{ScriptedPlanService, StationScript};
    use serde_json::json;

    fn gate(service: Arc<ScriptedPlanService>, policy: GateFailurePolicy) -> BusyGate {
        BusyGate::new(service, Duration::from_millis(1), policy)
    }

    #[tokio::test]
    async fn test_idle_station_passes_on_first_check() {
        let service = Arc::new(ScriptedPlanService::new());
        let checks = gate(service.clone(), GateFailurePolicy::FailOpen)
            .wait_until_idle(PlanType::JobPlan, "S1")
            .await;
        assert_eq!(checks, 1);
        assert_eq!(service.count_for("S1", "is_busy"), 1);
    }

    #[tokio::test]
    async fn test_waits_while_busy() {
        let service = Arc::new(ScriptedPlanService::new().with_script(
            "D1",
            StationScript::new().with_busy(vec![Ok(true), Ok(true), Ok(false)]),
        ));
        let checks = gate(service, GateFailurePolicy::FailOpen)
            .wait_until_idle(PlanType::JobPlan, "D1")
            .await;
        assert_eq!(checks, 3);
    }

    #[tokio::test]
    async fn test_fail_open_treats_error_as_idle() {
        let service = Arc::new(ScriptedPlanService::new().with_script(
            "T1",
            StationScript::new().with_busy(vec![Err(RemoteError::Transport("refused".into()))]),
        ));
        let checks = gate(service, GateFailurePolicy::FailOpen)
            .wait_until_idle(PlanType::JobPlan, "T1")
            .await;
        assert_eq!(checks, 1);
    }

    #[tokio::test]
    async fn test_fail_closed_keeps_waiting_after_error() {
        let service = Arc::new(ScriptedPlanService::new().with_script(
            "T1",
            StationScript::new().with_busy(vec![
                Err(RemoteError::api(500, "db down")),
                Err(RemoteError::api(500, "db down")),
                Ok(false),
            ]),
        ));
        let checks = gate(service, GateFailurePolicy::FailClosed)
            .wait_until_idle(PlanType::JobPlan, "T1")
            .await;
        assert_eq!(checks, 3);
    }

    #[tokio::test]
    async fn test_waits_for_other_station_of_same_plan_type() {
        let service = Arc::new(
            ScriptedPlanService::new()
                .with_script("T1", StationScript::new().with_progress_fallback(0)),
        );
        let handle = service
            .new_plan(PlanType::JobPlan, "/jobPlan", &json!({"stationCode": "T1"}))
            .await
            .unwrap();
        let options = ScheduleOptions {
            allow_multi_threads: true,
            stage: AutoTestStage::Merge,
            image_name: None,
        };
        service
            .schedule(PlanType::JobPlan, &handle, &options)
            .await
            .unwrap();

        // 订单计划不受作业计划排程影响
        let checks = gate(service.clone(), GateFailurePolicy::FailOpen)
            .wait_until_idle(PlanType::OrderPlan, "Order")
            .await;
        assert_eq!(checks, 1);

        let waiter = {
            let gate = gate(service.clone(), GateFailurePolicy::FailOpen);
            tokio::spawn(async move { gate.wait_until_idle(PlanType::JobPlan, "D1").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        assert!(service.count_for("D1", "is_busy") > 1);

        service.set_progress_fallback("T1", 100);
        assert_eq!(
            service.get_progress(PlanType::JobPlan, &handle).await.unwrap(),
            100
        );

        let checks = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(checks > 1);
        assert_eq!(service.computing_count(), 0);
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(
            GateFailurePolicy::from_fail_open(true),
            GateFailurePolicy::FailOpen
        );
        assert_eq!(
            GateFailurePolicy::from_fail_open(false),
            GateFailurePolicy::FailClosed
        );
    }
}
