//! Outcome of evaluating a geofence event against a notification policy.

use std::fmt;

use chrono::TimeDelta;

/// Why a notification was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// No notification has ever been sent for the location.
    FirstNotification,
    /// The silence since the last notification exceeded the safety net.
    SafetyNet,
    /// No suppression rule matched.
    RulesPassed,
    /// The policy does not throttle.
    Unthrottled,
}

/// Why a notification was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The location is disabled.
    LocationDisabled,
    /// The location does not notify for this event type.
    EventDisabled,
    /// The daily cap has been reached.
    DailyCapReached,
    /// The cooldown since the last notification has not elapsed.
    Cooldown {
        /// Time left until the cooldown expires.
        remaining: TimeDelta,
    },
    /// The device re-entered too soon after leaving.
    ShortAbsence,
    /// The once-daily mode already notified today.
    AlreadyNotifiedToday,
}

/// The engine's answer for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A notification may be sent.
    Allow(AllowReason),
    /// The notification must be suppressed.
    Suppress(SuppressReason),
}

impl Decision {
    /// Whether the caller may send a notification.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow(AllowReason::FirstNotification) => write!(f, "allow (first notification)"),
            Decision::Allow(AllowReason::SafetyNet) => write!(f, "allow (safety net)"),
            Decision::Allow(AllowReason::RulesPassed) => write!(f, "allow"),
            Decision::Allow(AllowReason::Unthrottled) => write!(f, "allow (unthrottled)"),
            Decision::Suppress(SuppressReason::LocationDisabled) => {
                write!(f, "suppress (location disabled)")
            }
            Decision::Suppress(SuppressReason::EventDisabled) => write!(f, "suppress (event disabled)"),
            Decision::Suppress(SuppressReason::DailyCapReached) => {
                write!(f, "suppress (daily cap reached)")
            }
            Decision::Suppress(SuppressReason::Cooldown { remaining }) => {
                write!(f, "suppress (cooldown, {}s remaining)", remaining.num_seconds())
            }
            Decision::Suppress(SuppressReason::ShortAbsence) => write!(f, "suppress (short absence)"),
            Decision::Suppress(SuppressReason::AlreadyNotifiedToday) => {
                write!(f, "suppress (already notified today)")
            }
        }
    }
}
