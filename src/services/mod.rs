pub mod dashboard_session;
pub mod dispatch_service;
pub mod projection;

pub use dashboard_session::DashboardSession;
pub use dispatch_service::{utc_day_bounds, ContainerLog, DispatchService};
pub use projection::{
    build_snapshot, DashboardSnapshot, RunGroup, RunRow, TruckFilter,
};
