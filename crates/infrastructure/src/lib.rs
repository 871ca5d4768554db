//! 基础设施实现：远程排程服务客户端、告警通知、数据集落地

pub mod notifier;
pub mod remote_client;
pub mod staging;

pub use notifier::{LogNotifier, WebhookNotifier};
pub use remote_client::{RemoteApiClient, ResponseEnvelope};
pub use staging::{DatasetFileKind, DatasetStager};
