use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 远程排程服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// 远程服务根地址，接口路径直接拼接在其后
    pub base_url: String,
    /// 单次HTTP请求超时
    pub request_timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow::anyhow!("远程服务地址不能为空"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("远程服务地址格式无效: {}", self.base_url));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }
        Ok(())
    }
}

/// 告警通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// 机器人webhook地址，未配置时只写日志
    pub webhook_url: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            request_timeout_seconds: 10,
        }
    }
}

impl NotifierConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.webhook_url {
            if url.is_empty() {
                return Err(anyhow::anyhow!("webhook地址不能为空字符串"));
            }
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("通知请求超时时间必须大于0"));
        }
        Ok(())
    }
}
