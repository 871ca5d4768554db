use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use autotest_core::{AutoTestStage, PlanType};
use autotest_dispatcher::DispatchRequest;

use crate::{
    error::{ApiError, ApiResult},
    response::accepted,
    routes::AppState,
};

/// 触发受理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerAccepted {
    pub stage: AutoTestStage,
    pub launched: usize,
}

/// push触发的查询参数
#[derive(Debug, Deserialize)]
pub struct PushQuery {
    pub image_name: Option<String>,
}

/// 每月手动触发，执行全部站点
pub async fn trigger_monthly(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    launch(&state, DispatchRequest::new(AutoTestStage::Monthly)).await
}

/// 分支推送触发，只执行指定计划类型的站点
pub async fn trigger_push(
    State(state): State<AppState>,
    Path(plan_type): Path<String>,
    Query(query): Query<PushQuery>,
) -> ApiResult<impl IntoResponse> {
    let plan_type: PlanType = plan_type.parse()?;
    let image_name = query
        .image_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("缺少参数 image_name".to_string()))?;

    let request = DispatchRequest::new(AutoTestStage::Push)
        .with_plan_type(plan_type)
        .with_image_name(image_name);
    launch(&state, request).await
}

/// 合并触发，执行全部站点
pub async fn trigger_merge(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    launch(&state, DispatchRequest::new(AutoTestStage::Merge)).await
}

async fn launch(state: &AppState, request: DispatchRequest) -> ApiResult<impl IntoResponse> {
    let stage = request.stage;
    info!(stage = %stage, plan_type = ?request.plan_type, "收到回归测试触发");

    let launched = state.orchestrator.dispatch(request).await?;
    let message = format!("已启动{launched}个站点的回归测试");
    Ok(accepted(TriggerAccepted { stage, launched }, message))
}
