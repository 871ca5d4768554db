use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{PlanType, StationProfile};

/// 单个站点的路由配置，键为站点标识
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    pub plan_type: PlanType,
    pub station_code: String,
    pub endpoint: String,
    #[serde(default)]
    pub allow_multi_threads: bool,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl StationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.station_code.is_empty() {
            return Err(anyhow::anyhow!("站点代码不能为空"));
        }
        if !self.endpoint.starts_with('/') {
            return Err(anyhow::anyhow!("接口路径必须以/开头: {}", self.endpoint));
        }
        Ok(())
    }

    pub fn to_profile(&self, station_id: &str) -> StationProfile {
        StationProfile {
            station_id: station_id.to_string(),
            plan_type: self.plan_type,
            station_code: self.station_code.clone(),
            endpoint: self.endpoint.clone(),
            allow_multi_threads: self.allow_multi_threads,
            recipients: self.recipients.clone(),
        }
    }
}

/// 内置站点表
pub fn default_stations() -> BTreeMap<String, StationConfig> {
    let job_station = |code: &str| StationConfig {
        plan_type: PlanType::JobPlan,
        station_code: code.to_string(),
        endpoint: "/jobPlan".to_string(),
        allow_multi_threads: true,
        recipients: Vec::new(),
    };

    let mut stations = BTreeMap::new();
    stations.insert(
        "order_plan".to_string(),
        StationConfig {
            plan_type: PlanType::OrderPlan,
            station_code: "Order".to_string(),
            endpoint: "/orderPlan".to_string(),
            allow_multi_threads: false,
            recipients: Vec::new(),
        },
    );
    stations.insert("s1_plan".to_string(), job_station("S1"));
    stations.insert("d1_plan".to_string(), job_station("D1"));
    stations.insert("d2_plan".to_string(), job_station("D2"));
    stations.insert("t1_plan".to_string(), job_station("T1"));
    stations
}
