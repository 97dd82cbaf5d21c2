pub mod container_count;
pub mod delivery_run;
pub mod store;
pub mod supply_need;

// Re-export core models for easy access
pub use container_count::{ContainerCount, ContainerLogEntry, NewContainerCount};
pub use delivery_run::{DeliveryRun, NewDeliveryRun, RunPatch};
pub use store::Store;
pub use supply_need::SupplyNeed;
