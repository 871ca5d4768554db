use thiserror::Error;

/// 远程排程服务调用错误
///
/// 所有远程接口的失败都归一化为此类型：传输层错误、响应码非0、响应体无法解析。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("网络传输错误: {0}")]
    Transport(String),

    #[error("远程服务返回错误: code={code}, message={message}")]
    Api { code: i64, message: String },

    #[error("响应解析错误: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }
}

/// 自动化测试编排错误类型定义
#[derive(Debug, Error)]
pub enum AutotestError {
    #[error("远程调用失败: {0}")]
    RemoteCallFailed(#[from] RemoteError),

    #[error("数据集不完整: {path} - {reason}")]
    StagingIncomplete { path: String, reason: String },

    #[error("未知站点: {id}")]
    StationNotFound { id: String },

    #[error("无效的计划类型: {0}")]
    InvalidPlanType(String),

    #[error("无效的触发阶段: {0}")]
    InvalidStage(String),

    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for AutotestError {
    fn from(err: config::ConfigError) -> Self {
        AutotestError::Configuration(err.to_string())
    }
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, AutotestError>;

/// 远程调用的Result类型
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::api(1001, "plan not found");
        assert_eq!(
            err.to_string(),
            "远程服务返回错误: code=1001, message=plan not found"
        );
    }

    #[test]
    fn test_remote_error_converts_into_autotest_error() {
        let err: AutotestError = RemoteError::Transport("connection refused".to_string()).into();
        assert!(matches!(
            err,
            AutotestError::RemoteCallFailed(RemoteError::Transport(_))
        ));
    }

    #[test]
    fn test_staging_incomplete_display() {
        let err = AutotestError::StagingIncomplete {
            path: "/data/batch/run1".to_string(),
            reason: "缺少快照文件".to_string(),
        };
        assert!(err.to_string().contains("/data/batch/run1"));
        assert!(err.to_string().contains("缺少快照文件"));
    }
}
