use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::StationConfig;
use crate::models::{PlanType, StationProfile};
use crate::{AutotestError, Result};

/// 站点路由表
///
/// 启动时从配置构建一次，以 `Arc<StationRegistry>` 传给所有站点执行器。
/// 构建完成后不可修改。
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: BTreeMap<String, Arc<StationProfile>>,
}

impl StationRegistry {
    pub fn from_config(stations: &BTreeMap<String, StationConfig>) -> Self {
        let stations = stations
            .iter()
            .map(|(id, config)| (id.clone(), Arc::new(config.to_profile(id))))
            .collect();
        Self { stations }
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = StationProfile>) -> Self {
        let stations = profiles
            .into_iter()
            .map(|profile| (profile.station_id.clone(), Arc::new(profile)))
            .collect();
        Self { stations }
    }

    pub fn get(&self, station_id: &str) -> Option<Arc<StationProfile>> {
        self.stations.get(station_id).cloned()
    }

    pub fn resolve(&self, station_id: &str) -> Result<Arc<StationProfile>> {
        self.get(station_id)
            .ok_or_else(|| AutotestError::StationNotFound {
                id: station_id.to_string(),
            })
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.stations.contains_key(station_id)
    }

    pub fn station_ids(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn by_plan_type(&self, plan_type: PlanType) -> Vec<Arc<StationProfile>> {
        self.stations
            .values()
            .filter(|profile| profile.plan_type == plan_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_stations;

    #[test]
    fn test_registry_from_default_config() {
        let registry = StationRegistry::from_config(&default_stations());
        assert_eq!(registry.len(), 5);

        let order = registry.resolve("order_plan").unwrap();
        assert_eq!(order.station_code, "Order");
        assert_eq!(order.plan_type, PlanType::OrderPlan);

        assert_eq!(registry.by_plan_type(PlanType::JobPlan).len(), 4);
    }

    #[test]
    fn test_registry_unknown_station() {
        let registry = StationRegistry::from_config(&default_stations());
        assert!(!registry.contains("x1_plan"));
        assert!(matches!(
            registry.resolve("x1_plan"),
            Err(AutotestError::StationNotFound { .. })
        ));
    }

    #[test]
    fn test_profiles_are_shared() {
        let registry = StationRegistry::from_config(&default_stations());
        let a = registry.get("s1_plan").unwrap();
        let b = registry.get("s1_plan").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
