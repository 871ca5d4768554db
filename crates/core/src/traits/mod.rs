pub mod notifier;
pub mod plan_service;

pub use notifier::Notifier;
pub use plan_service::PlanService;
