use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    remote::{NotifierConfig, RemoteConfig},
    staging::{PlanConfig, PollingConfig, StagingConfig},
    stations::{default_stations, StationConfig},
};

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub notifier: NotifierConfig,
    pub staging: StagingConfig,
    pub polling: PollingConfig,
    pub plan: PlanConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
    pub stations: BTreeMap<String, StationConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            notifier: NotifierConfig::default(),
            staging: StagingConfig::default(),
            polling: PollingConfig::default(),
            plan: PlanConfig::default(),
            api: ApiConfig::default(),
            observability: ObservabilityConfig::default(),
            stations: default_stations(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: AUTOTEST_, separator: __)
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file path, if None use default paths
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults =
            ConfigBuilder::try_from(&AppConfig::default()).context("构建默认配置失败")?;
        let mut builder = ConfigBuilder::builder().add_source(defaults);

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/autotest.toml", "autotest.toml"];
            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("AUTOTEST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    pub fn validate(&self) -> Result<()> {
        self.remote.validate().context("远程服务配置验证失败")?;
        self.notifier.validate().context("通知配置验证失败")?;
        self.staging.validate().context("数据集目录配置验证失败")?;
        self.polling.validate().context("轮询配置验证失败")?;
        self.plan.validate().context("计划参数配置验证失败")?;
        self.api.validate().context("API配置验证失败")?;
        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        if self.stations.is_empty() {
            return Err(anyhow::anyhow!("至少需要配置一个站点"));
        }
        for (id, station) in &self.stations {
            station
                .validate()
                .with_context(|| format!("站点配置验证失败: {id}"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanType;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stations.len(), 5);
        assert_eq!(config.polling.progress_interval_seconds, 60);
        assert!(config.polling.busy_gate_fail_open);
    }

    #[test]
    fn test_from_toml_overrides_sections() {
        let config = AppConfig::from_toml(
            r#"
            [remote]
            base_url = "http://aps.test:9000"
            request_timeout_seconds = 10

            [polling]
            busy_gate_interval_seconds = 5
            progress_interval_seconds = 5
            busy_gate_fail_open = false

            [stations.order_plan]
            plan_type = "order_plan"
            station_code = "Order"
            endpoint = "/orderPlan"
            allow_multi_threads = false
            recipients = ["13800000000"]
            "#,
        )
        .unwrap();

        assert_eq!(config.remote.base_url, "http://aps.test:9000");
        assert!(!config.polling.busy_gate_fail_open);
        assert_eq!(config.stations.len(), 1);
        assert_eq!(config.stations["order_plan"].plan_type, PlanType::OrderPlan);
        assert_eq!(config.stations["order_plan"].recipients, vec!["13800000000"]);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.polling.progress_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut config = AppConfig::default();
        config.plan.min_schedule_minutes = 40;
        config.plan.max_schedule_minutes = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_merges_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [remote]
            base_url = "http://aps.file:8080"

            [staging]
            staging_root = "/srv/autotest/staging"
            "#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.remote.base_url, "http://aps.file:8080");
        assert_eq!(
            config.staging.staging_root,
            std::path::PathBuf::from("/srv/autotest/staging")
        );
        // 未覆盖的部分保留默认值
        assert_eq!(config.stations.len(), 5);
        assert_eq!(config.plan.max_schedule_minutes, 30);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/autotest.toml")).is_err());
    }

    #[test]
    fn test_toml_roundtrip_keeps_stations() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.stations, config.stations);
    }
}
