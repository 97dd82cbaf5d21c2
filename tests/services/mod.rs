//! Service Tests Module
//!
//! Full command and query flows through [`DispatchService`], plus the
//! feed-driven [`DashboardSession`] lifecycle.
//!
//! [`DispatchService`]: dispatch_core::services::DispatchService
//! [`DashboardSession`]: dispatch_core::services::DashboardSession

pub mod dispatch_flow;
