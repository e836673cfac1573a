//! Data models shared across the crate.

pub mod decision;
pub mod location;
pub mod notification_state;

pub use decision::{AllowReason, Decision, SuppressReason};
pub use location::{CooldownMode, GeofenceEvent, LocationConfig, LocationId};
pub use notification_state::{NotificationState, NotificationStats};
