use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use autotest::{Application, ShutdownManager};
use autotest_core::config::{AppConfig, ObservabilityConfig};
use autotest_core::logging::{init_tracing, LogConfig};
use clap::{Arg, Command};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::{error, info, warn};

/// 关闭时等待站点任务结束的最长时间
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("autotest")
        .version(env!("CARGO_PKG_VERSION"))
        .about("排程服务自动化回归测试编排系统")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，默认查找 config/autotest.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .subcommand(
            Command::new("stage")
                .about("发布已解压的数据集批次到暂存目录")
                .arg(
                    Arg::new("station")
                        .short('s')
                        .long("station")
                        .value_name("STATION_ID")
                        .required(true)
                        .help("站点ID，例如 s1_plan"),
                )
                .arg(
                    Arg::new("batch-dir")
                        .value_name("DIR")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("批次目录，每个子目录为一次运行"),
                ),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let log_level = matches.get_one::<String>("log-level").map(String::as_str);
    let log_format = matches.get_one::<String>("log-format").map(String::as_str);

    // 加载配置
    let config = AppConfig::load(config_path)
        .with_context(|| format!("加载配置失败: {}", config_path.unwrap_or("默认路径")))?;

    // 初始化日志系统
    let log_config = LogConfig::from_observability(&config.observability)?
        .with_overrides(log_level, log_format)?;
    init_tracing(&log_config)?;

    if let Some(stage_matches) = matches.subcommand_matches("stage") {
        return publish_batch(config, stage_matches).await;
    }

    info!("启动自动化回归测试编排系统");
    info!("远程排程服务: {}", config.remote.base_url);
    info!("数据集暂存目录: {}", config.staging.staging_root.display());

    install_metrics_exporter(&config.observability)?;

    let app = Arc::new(Application::new(config)?);
    let shutdown_manager = ShutdownManager::new();

    // 启动应用
    let app_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&app);

        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!("应用运行失败: {e:#}");
            }
        })
    };

    // 等待关闭信号
    wait_for_shutdown_signal().await;

    info!("收到关闭信号，开始优雅关闭...");
    shutdown_manager.shutdown().await;

    // 等待进行中的站点任务，设置超时
    match tokio::time::timeout(SHUTDOWN_GRACE, app_handle).await {
        Ok(Ok(())) => info!("应用已优雅关闭"),
        Ok(Err(e)) => error!("应用关闭时发生错误: {e}"),
        Err(_) => warn!("等待站点任务超时，强制退出"),
    }

    info!("自动化回归测试编排系统已退出");
    Ok(())
}

/// 执行 `stage` 子命令
async fn publish_batch(config: AppConfig, matches: &clap::ArgMatches) -> Result<()> {
    let station_id = matches
        .get_one::<String>("station")
        .context("缺少站点ID")?;
    let batch_dir = matches
        .get_one::<PathBuf>("batch-dir")
        .context("缺少批次目录")?;

    let app = Application::new(config)?;
    let runs = app.publish_dataset(station_id, batch_dir).await?;
    info!("站点 {} 的数据集已发布，共{}个运行", station_id, runs);
    Ok(())
}

/// 启用Prometheus指标导出
fn install_metrics_exporter(config: &ObservabilityConfig) -> Result<()> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let address: SocketAddr = config
        .metrics_bind_address
        .parse()
        .with_context(|| format!("指标监听地址无效: {}", config.metrics_bind_address))?;
    PrometheusBuilder::new()
        .with_http_listener(address)
        .install()
        .context("启动Prometheus指标导出失败")?;

    info!("Prometheus指标导出启动在 http://{}/metrics", address);
    Ok(())
}

/// 等待关闭信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("安装Ctrl+C信号处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("安装SIGTERM信号处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
