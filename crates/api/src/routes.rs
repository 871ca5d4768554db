use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use autotest_core::StationRegistry;
use autotest_dispatcher::Orchestrator;

use crate::handlers::{
    health::health_check,
    triggers::{trigger_merge, trigger_monthly, trigger_push},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub registry: Arc<StationRegistry>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 回归测试触发
        .route("/autotest/monthly", post(trigger_monthly))
        .route("/autotest/push/{plan_type}", post(trigger_push))
        .route("/autotest/merge", post(trigger_merge))
        .with_state(state)
}
