//! Per-location throttling state and its transitions.

use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::location::GeofenceEvent;

/// Silence after which the rolling notification counter starts over.
pub const ROLLING_COUNT_RESET_WINDOW: Duration = Duration::from_secs(86400);

/// Throttling bookkeeping for a single location.
///
/// A default record has no timestamps and zero counters; it is what the store
/// hands out for a location it has never seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NotificationState {
    /// When a notification was last actually sent.
    pub last_notification_time: Option<DateTime<Utc>>,
    /// When the last entry was observed, notified or not.
    pub last_entry_time: Option<DateTime<Utc>>,
    /// When the last exit was observed, notified or not.
    pub last_exit_time: Option<DateTime<Utc>>,
    /// Notifications sent since the rolling counter was last reset.
    pub notification_count: u32,
    /// Notifications sent on the current local calendar day.
    pub daily_notification_count: u32,
    /// When the daily counter was last reset.
    pub last_reset_date: DateTime<Utc>,
}

impl NotificationState {
    /// Rolls the daily and rolling counters over if their windows have passed.
    ///
    /// Must run before any counter is compared against a limit.
    pub fn update_counters(&mut self, now: DateTime<Utc>) {
        if !is_same_local_day(self.last_reset_date, now) {
            self.daily_notification_count = 0;
            self.last_reset_date = now;
        }

        let window = to_time_delta(ROLLING_COUNT_RESET_WINDOW);
        if self.time_since_last_notification(now).is_some_and(|elapsed| elapsed > window) {
            self.notification_count = 0;
        }
    }

    /// Records that the device entered the region.
    pub fn record_entry(&mut self, now: DateTime<Utc>) {
        self.last_entry_time = Some(now);
    }

    /// Records that the device left the region.
    pub fn record_exit(&mut self, now: DateTime<Utc>) {
        self.last_exit_time = Some(now);
    }

    /// Records an observed event of either kind.
    pub fn record_event(&mut self, event: GeofenceEvent, now: DateTime<Utc>) {
        match event {
            GeofenceEvent::Entry => self.record_entry(now),
            GeofenceEvent::Exit => self.record_exit(now),
        }
    }

    /// Records that a notification was actually delivered.
    pub fn record_notification(&mut self, now: DateTime<Utc>) {
        self.update_counters(now);
        self.last_notification_time = Some(now);
        self.notification_count += 1;
        self.daily_notification_count += 1;
    }

    /// Time elapsed since the last sent notification, if any.
    pub fn time_since_last_notification(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_notification_time.map(|t| now.signed_duration_since(t))
    }

    /// Time elapsed since the last observed exit, if any.
    pub fn time_since_last_exit(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_exit_time.map(|t| now.signed_duration_since(t))
    }
}

/// Converts a configured limit into a signed chrono delta, saturating.
pub(crate) fn to_time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

fn is_same_local_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.with_timezone(&Local).date_naive() == b.with_timezone(&Local).date_naive()
}

/// Read-only counters exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationStats {
    /// Notifications sent today.
    pub daily_count: u32,
    /// Notifications in the current rolling window.
    pub total_count: u32,
    /// When the last notification was sent.
    pub last_notification_time: Option<DateTime<Utc>>,
}

impl From<&NotificationState> for NotificationStats {
    fn from(state: &NotificationState) -> Self {
        Self {
            daily_count: state.daily_notification_count,
            total_count: state.notification_count,
            last_notification_time: state.last_notification_time,
        }
    }
}
