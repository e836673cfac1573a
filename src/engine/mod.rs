//! Notification decision engine.

pub mod controller;
pub mod policy;
pub mod state_store;

pub use controller::GeofenceNotificationController;
pub use policy::{AlwaysAllowPolicy, FullThrottlePolicy, NotificationPolicy, PolicyKind};
pub use state_store::{LoadReport, NotificationStateStore};
