use async_trait::async_trait;

/// 告警通知接口
///
/// 尽力而为：实现方自行记录投递失败，不向调用方返回错误，也不重试。
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str, recipients: &[String]);
}
