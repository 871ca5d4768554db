//! # Autotest Testing Utils
//!
//! 各crate共享的测试工具：
//!
//! - **Mock Services**: 脚本化的远程排程服务、记录型告警通知
//! - **Builders**: 站点信息构建器、数据集目录夹具
//! - **Fake Servers**: 在临时端口上运行的 axum 服务，用于测试HTTP客户端
//! - **Helpers**: 异步条件等待
//!
//! ```toml
//! [dev-dependencies]
//! autotest-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod fake_server;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use fake_server::*;
pub use helpers::*;
pub use mocks::*;
