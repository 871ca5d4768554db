//! # Autotest API
//!
//! 回归测试触发接口，基于Axum构建。触发接口只负责受理请求并启动站点任务，
//! 执行结果通过告警通知发送，不在响应中返回。
//!
//! ## API 端点
//!
//! - `POST /autotest/monthly` - 每月手动触发，执行全部站点
//! - `POST /autotest/push/{plan_type}?image_name=...` - 分支推送触发，
//!   `plan_type` 为 `order_plan` 或 `job_plan`
//! - `POST /autotest/merge` - 合并触发，执行全部站点
//! - `GET /health` - 健康检查
//!
//! ## 响应格式
//!
//! ```json
//! {
//!   "success": true,
//!   "data": { "stage": "push", "launched": 4 },
//!   "message": "已启动4个站点的回归测试",
//!   "timestamp": "2026-01-01T00:00:00Z"
//! }
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
pub use routes::AppState;

/// 创建完整的API应用
pub fn create_app(state: AppState) -> Router {
    routes::create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
