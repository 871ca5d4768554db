//! 数据集落地
//!
//! 上传的数据集批次解压后是一个目录，每个子目录是一次运行，必须恰好包含
//! 一个配置文件和一个快照文件。批次要么整体发布到 `staging_root/<station_id>`，
//! 要么整体删除，站点执行器永远看不到不完整的目录。

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info, warn};

use autotest_core::config::StagingConfig;
use autotest_core::{AutotestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFileKind {
    Config,
    Snapshot,
}

#[derive(Debug, Clone)]
pub struct DatasetStager {
    staging_root: PathBuf,
    config_extensions: Vec<String>,
    snapshot_extensions: Vec<String>,
}

impl DatasetStager {
    pub fn new(config: &StagingConfig) -> Self {
        Self {
            staging_root: config.staging_root.clone(),
            config_extensions: config.config_extensions.clone(),
            snapshot_extensions: config.snapshot_extensions.clone(),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// 按扩展名判断文件类型，扩展名不区分大小写
    pub fn classify(&self, path: &Path) -> Option<DatasetFileKind> {
        let ext = path.extension()?.to_str()?;
        if self.config_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            Some(DatasetFileKind::Config)
        } else if self.snapshot_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            Some(DatasetFileKind::Snapshot)
        } else {
            None
        }
    }

    /// 校验批次目录，返回运行目录数量
    pub async fn validate(&self, batch_dir: &Path) -> Result<usize> {
        let mut entries = fs::read_dir(batch_dir).await?;
        let mut runs = 0;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            self.validate_run(&entry.path()).await?;
            runs += 1;
        }

        if runs == 0 {
            return Err(AutotestError::StagingIncomplete {
                path: batch_dir.display().to_string(),
                reason: "没有可运行的数据集目录".to_string(),
            });
        }

        Ok(runs)
    }

    async fn validate_run(&self, run_dir: &Path) -> Result<()> {
        let mut entries = fs::read_dir(run_dir).await?;
        let mut config_files = 0;
        let mut snapshot_files = 0;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match self.classify(&entry.path()) {
                Some(DatasetFileKind::Config) => config_files += 1,
                Some(DatasetFileKind::Snapshot) => snapshot_files += 1,
                None => {}
            }
        }

        let reason = match (config_files, snapshot_files) {
            (1, 1) => return Ok(()),
            (0, _) => "缺少配置文件".to_string(),
            (_, 0) => "缺少快照文件".to_string(),
            (c, s) => format!("文件数量不唯一: 配置文件{c}个, 快照文件{s}个"),
        };

        Err(AutotestError::StagingIncomplete {
            path: run_dir.display().to_string(),
            reason,
        })
    }

    /// 校验并发布批次
    ///
    /// 校验失败时删除整个批次目录；成功时替换该站点已有的数据集。
    /// 批次目录和 `staging_root` 必须位于同一文件系统。
    pub async fn publish(&self, batch_dir: &Path, station_id: &str) -> Result<usize> {
        let runs = match self.validate(batch_dir).await {
            Ok(runs) => runs,
            Err(e) => {
                warn!("数据集批次校验失败，丢弃整个批次: {}", e);
                if let Err(remove_err) = fs::remove_dir_all(batch_dir).await {
                    error!(
                        "删除数据集批次失败: path={}, error={}",
                        batch_dir.display(),
                        remove_err
                    );
                }
                return Err(e);
            }
        };

        fs::create_dir_all(&self.staging_root).await?;
        let target = self.staging_root.join(station_id);
        if fs::try_exists(&target).await? {
            fs::remove_dir_all(&target).await?;
        }
        fs::rename(batch_dir, &target).await?;

        info!(
            "数据集批次已发布: station={}, runs={}, path={}",
            station_id,
            runs,
            target.display()
        );
        Ok(runs)
    }
}
