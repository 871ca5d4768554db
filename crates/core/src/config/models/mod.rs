pub mod api_observability;
pub mod app_config;
pub mod remote;
pub mod staging;
pub mod stations;

pub use api_observability::{ApiConfig, ObservabilityConfig};
pub use app_config::AppConfig;
pub use remote::{NotifierConfig, RemoteConfig};
pub use staging::{PlanConfig, PollingConfig, StagingConfig};
pub use stations::{default_stations, StationConfig};
