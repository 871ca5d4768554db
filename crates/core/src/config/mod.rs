//! 配置管理
//!
//! 配置按以下顺序叠加，后者覆盖前者：
//!
//! 1. 内置默认值（包括五个默认站点）
//! 2. TOML配置文件
//! 3. 环境变量（前缀 `AUTOTEST_`，层级分隔符 `__`）
//!
//! ```toml
//! [remote]
//! base_url = "http://aps.internal:8080"
//!
//! [stations.s1_plan]
//! plan_type = "job_plan"
//! station_code = "S1"
//! endpoint = "/jobPlan"
//! allow_multi_threads = true
//! recipients = ["13800000000"]
//! ```

pub mod models;

pub use models::*;
