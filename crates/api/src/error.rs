use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use autotest_core::AutotestError;

use crate::response::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Autotest(#[from] AutotestError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Autotest(AutotestError::StationNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Autotest(AutotestError::InvalidPlanType(_))
            | ApiError::Autotest(AutotestError::InvalidStage(_))
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Autotest(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {}", self);
        }
        (status, ApiResponse::failure(self.to_string())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_not_found_maps_to_404() {
        let error: ApiError = AutotestError::StationNotFound {
            id: "x9_plan".to_string(),
        }
        .into();
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_plan_type_maps_to_400() {
        let error: ApiError = AutotestError::InvalidPlanType("weekly".to_string()).into();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_io_error_maps_to_500() {
        let error: ApiError =
            AutotestError::Io(std::io::Error::other("disk")).into();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_request_message() {
        let error = ApiError::BadRequest("缺少参数 image_name".to_string());
        assert_eq!(error.to_string(), "请求参数错误: 缺少参数 image_name");
    }
}
