use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use autotest_core::Notifier;

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    msgtype: &'static str,
    text: WebhookText<'a>,
}

#[derive(Debug, Serialize)]
struct WebhookText<'a> {
    content: &'a str,
    mentioned_mobile_list: &'a [String],
}

/// 机器人webhook通知
///
/// 投递失败只记录日志和指标，不向调用方返回错误，也不重试。
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    async fn deliver(&self, message: &str, recipients: &[String]) -> anyhow::Result<()> {
        let body = WebhookMessage {
            msgtype: "text",
            text: WebhookText {
                content: message,
                mentioned_mobile_list: recipients,
            },
        };

        let response = self.client.post(&self.webhook_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("webhook返回HTTP {status}"));
        }

        // 机器人接口在HTTP 200时仍可能通过 errcode 报告失败
        let reply: Value = response.json().await.unwrap_or(Value::Null);
        match reply.get("errcode").and_then(Value::as_i64) {
            Some(code) if code != 0 => Err(anyhow::anyhow!(
                "webhook返回错误: errcode={}, errmsg={}",
                code,
                reply.get("errmsg").and_then(Value::as_str).unwrap_or_default()
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str, recipients: &[String]) {
        match self.deliver(message, recipients).await {
            Ok(()) => info!("告警通知已发送: recipients={:?}", recipients),
            Err(e) => {
                metrics::counter!("autotest_notifications_failed_total").increment(1);
                error!("告警通知发送失败: {}", e);
            }
        }
    }
}

/// 未配置webhook时使用，只写日志
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str, recipients: &[String]) {
        warn!(
            "未配置webhook，通知仅写入日志: recipients={:?}, message={}",
            recipients, message
        );
    }
}
