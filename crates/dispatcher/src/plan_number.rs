use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// 计划编号生成器
///
/// 编号格式为 `{prefix}{stationCode}{UTC %Y%m%d%H%M%S}`。同一站点在同一秒内
/// 再次生成时追加 `-N` 后缀。
#[derive(Debug)]
pub struct PlanNumberGenerator {
    prefix: String,
    last: Mutex<HashMap<String, (String, u32)>>,
}

impl PlanNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last: Mutex::new(HashMap::new()),
        }
    }

    pub fn next(&self, station_code: &str) -> String {
        self.next_at(station_code, Utc::now())
    }

    pub fn next_at(&self, station_code: &str, now: DateTime<Utc>) -> String {
        let base = format!(
            "{}{}{}",
            self.prefix,
            station_code,
            now.format("%Y%m%d%H%M%S")
        );

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match last.get_mut(station_code) {
            Some((previous, repeats)) if *previous == base => {
                *repeats += 1;
                format!("{base}-{repeats}")
            }
            _ => {
                last.insert(station_code.to_string(), (base.clone(), 0));
                base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format() {
        let generator = PlanNumberGenerator::new("Test");
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(generator.next_at("S1", now), "TestS120260305070809");
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let generator = PlanNumberGenerator::new("Test");
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(generator.next_at("D1", now), "TestD120260305070809");
        assert_eq!(generator.next_at("D1", now), "TestD120260305070809-1");
        assert_eq!(generator.next_at("D1", now), "TestD120260305070809-2");

        let later = now + chrono::Duration::seconds(1);
        assert_eq!(generator.next_at("D1", later), "TestD120260305070810");
    }

    #[test]
    fn test_stations_are_independent() {
        let generator = PlanNumberGenerator::new("Test");
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(generator.next_at("Order", now), "TestOrder20260305070809");
        assert_eq!(generator.next_at("S1", now), "TestS120260305070809");
    }
}
