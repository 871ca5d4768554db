pub mod log_config;
pub mod log_level;

pub use log_config::{LogConfig, OutputFormat};
pub use log_level::LogLevel;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志系统
///
/// `RUST_LOG` 存在时优先于配置中的日志级别。
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        OutputFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("初始化JSON日志格式失败")?,
        OutputFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .context("初始化Pretty日志格式失败")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObservabilityConfig;

    #[test]
    fn test_log_config_from_observability() {
        let observability = ObservabilityConfig {
            log_level: "debug".to_string(),
            log_format: "json".to_string(),
            ..ObservabilityConfig::default()
        };
        let config = LogConfig::from_observability(&observability).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = LogConfig::default()
            .with_overrides(Some("warn"), Some("json"))
            .unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, OutputFormat::Json);

        assert!(LogConfig::default().with_overrides(Some("loud"), None).is_err());
    }
}
