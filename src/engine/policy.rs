//! Notification policies deciding whether a geofence event may notify.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::ThrottleLimits,
    models::{
        AllowReason, CooldownMode, Decision, GeofenceEvent, LocationConfig, NotificationState,
        SuppressReason, notification_state::to_time_delta,
    },
};

/// Decides whether an event for a location may produce a notification.
///
/// Implementations are pure: they read the state (with counters already
/// rolled over for `now`) and never mutate it.
pub trait NotificationPolicy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Evaluates the event against the current state of the location.
    fn decide(
        &self,
        state: &NotificationState,
        location: &LocationConfig,
        event: GeofenceEvent,
        now: DateTime<Utc>,
    ) -> Decision;
}

/// Selects which policy the controller applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Daily cap, safety net, cooldown, away-time and once-daily rules.
    #[default]
    Full,
    /// Every enabled event notifies.
    AlwaysAllow,
}

impl PolicyKind {
    /// Builds the policy this kind names.
    pub fn build(self, limits: ThrottleLimits) -> Arc<dyn NotificationPolicy> {
        match self {
            PolicyKind::Full => Arc::new(FullThrottlePolicy::new(limits)),
            PolicyKind::AlwaysAllow => Arc::new(AlwaysAllowPolicy),
        }
    }
}

/// The complete throttling rule cascade.
///
/// Rules are checked in order and the first that matches decides:
/// daily cap, first notification, safety net, cooldown, short absence,
/// once-daily.
#[derive(Debug, Clone, Default)]
pub struct FullThrottlePolicy {
    limits: ThrottleLimits,
}

impl FullThrottlePolicy {
    /// Creates the policy with the given limits.
    pub fn new(limits: ThrottleLimits) -> Self {
        Self { limits }
    }
}

impl NotificationPolicy for FullThrottlePolicy {
    fn name(&self) -> &'static str {
        "full"
    }

    fn decide(
        &self,
        state: &NotificationState,
        location: &LocationConfig,
        event: GeofenceEvent,
        now: DateTime<Utc>,
    ) -> Decision {
        if state.daily_notification_count >= self.limits.max_daily_notifications {
            return Decision::Suppress(SuppressReason::DailyCapReached);
        }

        let Some(since_last) = state.time_since_last_notification(now) else {
            return Decision::Allow(AllowReason::FirstNotification);
        };

        if since_last > to_time_delta(self.limits.safety_net_interval) {
            return Decision::Allow(AllowReason::SafetyNet);
        }

        let cooldown = to_time_delta(location.cooldown_mode.cooldown());
        if since_last < cooldown {
            return Decision::Suppress(SuppressReason::Cooldown { remaining: cooldown - since_last });
        }

        if event == GeofenceEvent::Entry
            && state
                .time_since_last_exit(now)
                .is_some_and(|away| away < to_time_delta(self.limits.min_away_time))
        {
            return Decision::Suppress(SuppressReason::ShortAbsence);
        }

        if location.cooldown_mode == CooldownMode::OnceDaily && state.daily_notification_count > 0 {
            return Decision::Suppress(SuppressReason::AlreadyNotifiedToday);
        }

        Decision::Allow(AllowReason::RulesPassed)
    }
}

/// Allows every event that passes the location's own enable flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllowPolicy;

impl NotificationPolicy for AlwaysAllowPolicy {
    fn name(&self) -> &'static str {
        "always_allow"
    }

    fn decide(
        &self,
        _state: &NotificationState,
        _location: &LocationConfig,
        _event: GeofenceEvent,
        _now: DateTime<Utc>,
    ) -> Decision {
        Decision::Allow(AllowReason::Unthrottled)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::test_helpers::LocationBuilder;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn state_notified_ago(seconds: i64) -> NotificationState {
        NotificationState {
            last_notification_time: Some(now() - TimeDelta::seconds(seconds)),
            notification_count: 1,
            daily_notification_count: 1,
            last_reset_date: now(),
            ..Default::default()
        }
    }

    fn decide(state: &NotificationState, location: &LocationConfig, event: GeofenceEvent) -> Decision {
        FullThrottlePolicy::default().decide(state, location, event, now())
    }

    #[test]
    fn test_first_notification_is_allowed() {
        let location = LocationBuilder::new("home").build();
        let state = NotificationState { last_reset_date: now(), ..Default::default() };

        assert_eq!(
            decide(&state, &location, GeofenceEvent::Entry),
            Decision::Allow(AllowReason::FirstNotification)
        );
    }

    #[test]
    fn test_cooldown_suppresses() {
        let location = LocationBuilder::new("home").cooldown_mode(CooldownMode::Normal).build();
        let state = state_notified_ago(1);

        assert_eq!(
            decide(&state, &location, GeofenceEvent::Entry),
            Decision::Suppress(SuppressReason::Cooldown { remaining: TimeDelta::seconds(1799) })
        );
    }

    #[test]
    fn test_cooldown_depends_on_mode() {
        let frequent = LocationBuilder::new("gym").cooldown_mode(CooldownMode::Frequent).build();
        let quiet = LocationBuilder::new("office").cooldown_mode(CooldownMode::Quiet).build();
        let state = state_notified_ago(1000);

        assert!(decide(&state, &frequent, GeofenceEvent::Entry).is_allowed());
        assert!(!decide(&state, &quiet, GeofenceEvent::Entry).is_allowed());
    }

    #[test]
    fn test_safety_net_overrides_cooldown() {
        let location = LocationBuilder::new("home").cooldown_mode(CooldownMode::OnceDaily).build();
        let state = state_notified_ago(14401);

        assert_eq!(
            decide(&state, &location, GeofenceEvent::Entry),
            Decision::Allow(AllowReason::SafetyNet)
        );
    }

    #[test]
    fn test_safety_net_boundary_is_exclusive() {
        let location = LocationBuilder::new("home").cooldown_mode(CooldownMode::OnceDaily).build();
        let state = state_notified_ago(14400);

        assert!(!decide(&state, &location, GeofenceEvent::Entry).is_allowed());
    }

    #[test]
    fn test_daily_cap_beats_safety_net() {
        let location = LocationBuilder::new("home").build();
        let mut state = state_notified_ago(20000);
        state.daily_notification_count = 10;

        assert_eq!(
            decide(&state, &location, GeofenceEvent::Entry),
            Decision::Suppress(SuppressReason::DailyCapReached)
        );
    }

    #[test]
    fn test_short_absence_suppresses_entry_only() {
        let location = LocationBuilder::new("home").notify_on_exit(true).build();
        let mut state = state_notified_ago(7200);
        state.last_exit_time = Some(now() - TimeDelta::seconds(60));

        assert_eq!(
            decide(&state, &location, GeofenceEvent::Entry),
            Decision::Suppress(SuppressReason::ShortAbsence)
        );
        assert!(decide(&state, &location, GeofenceEvent::Exit).is_allowed());
    }

    #[test]
    fn test_long_absence_allows_entry() {
        let location = LocationBuilder::new("home").build();
        let mut state = state_notified_ago(7200);
        state.last_exit_time = Some(now() - TimeDelta::seconds(700));

        assert_eq!(
            decide(&state, &location, GeofenceEvent::Entry),
            Decision::Allow(AllowReason::RulesPassed)
        );
    }

    #[test]
    fn test_once_daily_suppresses_after_first_notification_today() {
        let location = LocationBuilder::new("pharmacy").cooldown_mode(CooldownMode::OnceDaily).build();
        let mut state = state_notified_ago(90000);
        state.daily_notification_count = 1;
        let policy = FullThrottlePolicy::new(ThrottleLimits {
            safety_net_interval: std::time::Duration::from_secs(100_000),
            ..Default::default()
        });

        assert_eq!(
            policy.decide(&state, &location, GeofenceEvent::Entry, now()),
            Decision::Suppress(SuppressReason::AlreadyNotifiedToday)
        );

        state.daily_notification_count = 0;
        assert!(policy.decide(&state, &location, GeofenceEvent::Entry, now()).is_allowed());
    }

    #[test]
    fn test_custom_daily_cap() {
        let location = LocationBuilder::new("home").build();
        let mut state = state_notified_ago(20000);
        state.daily_notification_count = 2;
        let policy = FullThrottlePolicy::new(ThrottleLimits {
            max_daily_notifications: 2,
            ..Default::default()
        });

        assert!(!policy.decide(&state, &location, GeofenceEvent::Entry, now()).is_allowed());
    }

    #[test]
    fn test_always_allow_ignores_state() {
        let location = LocationBuilder::new("home").build();
        let mut state = state_notified_ago(1);
        state.daily_notification_count = 50;

        assert_eq!(
            AlwaysAllowPolicy.decide(&state, &location, GeofenceEvent::Entry, now()),
            Decision::Allow(AllowReason::Unthrottled)
        );
    }

    #[test]
    fn test_policy_kind_build_and_serde() {
        assert_eq!(PolicyKind::Full.build(ThrottleLimits::default()).name(), "full");
        assert_eq!(PolicyKind::AlwaysAllow.build(ThrottleLimits::default()).name(), "always_allow");

        let kind: PolicyKind = serde_json::from_str(r#""always_allow""#).unwrap();
        assert_eq!(kind, PolicyKind::AlwaysAllow);
    }
}
