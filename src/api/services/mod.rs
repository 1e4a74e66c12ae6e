pub mod dashboard;
pub mod health;
pub mod visitor;

pub use dashboard::{DashboardService, render_dashboard};
pub use health::{AppStartTime, HealthService, health_routes};
pub use visitor::{LogAck, VisitorApi, visitor_routes};
