//! Test data builders
//!
//! Builders for station profiles and a temporary staging tree with sensible
//! defaults.

use std::path::{Path, PathBuf};

use autotest_core::config::default_stations;
use autotest_core::{PlanType, StationProfile, StationRegistry};
use tempfile::TempDir;

/// Builder for creating test [`StationProfile`]s
pub struct StationProfileBuilder {
    profile: StationProfile,
}

impl StationProfileBuilder {
    pub fn new(station_id: &str, station_code: &str) -> Self {
        Self {
            profile: StationProfile {
                station_id: station_id.to_string(),
                plan_type: PlanType::JobPlan,
                station_code: station_code.to_string(),
                endpoint: "/jobPlan".to_string(),
                allow_multi_threads: true,
                recipients: vec!["13800000000".to_string()],
            },
        }
    }

    pub fn order_plan() -> Self {
        Self::new("order_plan", "Order")
            .with_plan_type(PlanType::OrderPlan)
            .with_endpoint("/orderPlan")
            .with_multi_threads(false)
    }

    pub fn with_plan_type(mut self, plan_type: PlanType) -> Self {
        self.profile.plan_type = plan_type;
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.profile.endpoint = endpoint.to_string();
        self
    }

    pub fn with_multi_threads(mut self, allow: bool) -> Self {
        self.profile.allow_multi_threads = allow;
        self
    }

    pub fn with_recipients(mut self, recipients: &[&str]) -> Self {
        self.profile.recipients = recipients.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn build(self) -> StationProfile {
        self.profile
    }
}

/// Registry with the five built-in stations
pub fn default_registry() -> StationRegistry {
    StationRegistry::from_config(&default_stations())
}

/// Temporary staging and workspace tree
///
/// Layout: `<tmp>/staging/<station_id>/<run>/{config.json, snapshot.h5}` and
/// `<tmp>/workspace`.
pub struct StagingFixture {
    dir: TempDir,
}

impl StagingFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("staging")).expect("failed to create staging");
        std::fs::create_dir_all(dir.path().join("workspace"))
            .expect("failed to create workspace");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn staging_root(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.dir.path().join("workspace")
    }

    /// Stage one complete run for a station; file contents name the run
    pub fn add_run(&self, station_id: &str, run: &str) -> PathBuf {
        let run_dir = self.staging_root().join(station_id).join(run);
        std::fs::create_dir_all(&run_dir).expect("failed to create run dir");
        std::fs::write(run_dir.join("config.json"), format!("{{\"run\":\"{run}\"}}"))
            .expect("failed to write config");
        std::fs::write(run_dir.join("snapshot.h5"), run.as_bytes())
            .expect("failed to write snapshot");
        run_dir
    }

    /// Stray file at the staging root, not a station directory
    pub fn add_file(&self, name: &str) -> PathBuf {
        let path = self.staging_root().join(name);
        std::fs::write(&path, b"stray").expect("failed to write file");
        path
    }

    pub fn workspace_file(&self, station_id: &str, file: &str) -> PathBuf {
        self.workspace_root().join(station_id).join(file)
    }
}

impl Default for StagingFixture {
    fn default() -> Self {
        Self::new()
    }
}
