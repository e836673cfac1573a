//! Caller-facing entry point for geofence notification decisions.

use std::{fmt::Write as _, future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{
    clock::{Clock, SystemClock},
    config::AppConfig,
    engine::{
        policy::NotificationPolicy,
        state_store::{LoadReport, NotificationStateStore},
    },
    models::{
        Decision, GeofenceEvent, LocationConfig, LocationId, NotificationState, NotificationStats,
        SuppressReason,
    },
    persistence::{error::PersistenceError, traits::KeyValueStore},
};

/// Applies a [`NotificationPolicy`] to geofence events and keeps each
/// location's throttling state up to date.
///
/// Deciding and recording are two separate steps: [`evaluate`] only says
/// whether a notification may be sent, and the caller must call
/// [`record_sent`] once it has actually delivered one. Callers that deliver
/// inline can use [`evaluate_and_dispatch`] to do both under one lock.
///
/// [`evaluate`]: Self::evaluate
/// [`record_sent`]: Self::record_sent
/// [`evaluate_and_dispatch`]: Self::evaluate_and_dispatch
pub struct GeofenceNotificationController<T: KeyValueStore> {
    /// Persistent per-location state.
    store: NotificationStateStore<T>,

    /// The policy deciding allow/suppress.
    policy: Arc<dyn NotificationPolicy>,

    /// Source of the current time.
    clock: Arc<dyn Clock>,

    /// A map of location ids to their locks, serializing read-modify-write
    /// cycles on the same location.
    location_locks: DashMap<LocationId, Arc<Mutex<()>>>,
}

impl<T: KeyValueStore> GeofenceNotificationController<T> {
    /// Creates a controller from its parts.
    pub fn new(
        store: NotificationStateStore<T>,
        policy: Arc<dyn NotificationPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, policy, clock, location_locks: DashMap::new() }
    }

    /// Loads the state store from `backend` and builds the configured policy.
    pub async fn from_config(backend: Arc<T>, config: &AppConfig) -> Self {
        let store = NotificationStateStore::load(backend, &config.state_key).await;
        let policy = config.policy.build(config.throttle.clone());
        tracing::info!(policy = policy.name(), "Notification controller initialized.");
        Self::new(store, policy, Arc::new(SystemClock))
    }

    /// Name of the active policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// What happened when the state store was loaded.
    pub fn load_report(&self) -> LoadReport {
        self.store.load_report()
    }

    /// Decides whether `event` at `location` may produce a notification.
    ///
    /// Does not record a notification; see [`Self::record_sent`].
    pub async fn evaluate(&self, location: &LocationConfig, event: GeofenceEvent) -> bool {
        self.evaluate_with_decision(location, event).await.is_allowed()
    }

    /// Like [`Self::evaluate`], but returns the reason for the decision.
    pub async fn evaluate_with_decision(
        &self,
        location: &LocationConfig,
        event: GeofenceEvent,
    ) -> Decision {
        if let Some(decision) = check_preconditions(location, event) {
            tracing::debug!(location = %location.id, %event, %decision, "Event short-circuited.");
            return decision;
        }

        let lock = self.get_location_lock(&location.id);
        let _guard = lock.lock().await;
        let now = self.clock.now();
        let (decision, _) = self.evaluate_locked(location, event, now).await;
        decision
    }

    /// Records that a notification for `id` was actually delivered.
    pub async fn record_sent(&self, id: &LocationId) {
        let lock = self.get_location_lock(id);
        let _guard = lock.lock().await;
        let now = self.clock.now();

        let mut state = self.store.get(id).await;
        state.record_notification(now);
        tracing::debug!(
            location = %id,
            daily_count = state.daily_notification_count,
            total_count = state.notification_count,
            "Recorded sent notification."
        );
        self.store.put(id, state).await;
    }

    /// Evaluates the event and, if allowed, runs `deliver` and records the
    /// notification when it reports success.
    ///
    /// The location stays locked for the whole sequence, so no other
    /// evaluation for it can interleave. Returns whether a notification was
    /// delivered and recorded.
    pub async fn evaluate_and_dispatch<F, Fut>(
        &self,
        location: &LocationConfig,
        event: GeofenceEvent,
        deliver: F,
    ) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if let Some(decision) = check_preconditions(location, event) {
            tracing::debug!(location = %location.id, %event, %decision, "Event short-circuited.");
            return false;
        }

        let lock = self.get_location_lock(&location.id);
        let _guard = lock.lock().await;
        let now = self.clock.now();
        let (decision, mut state) = self.evaluate_locked(location, event, now).await;
        if !decision.is_allowed() {
            return false;
        }

        if !deliver().await {
            tracing::warn!(
                location = %location.id,
                %event,
                "Notification delivery failed, not recording."
            );
            return false;
        }

        state.record_notification(self.clock.now());
        self.store.put(&location.id, state).await;
        true
    }

    /// Counters for `id`. Unknown locations report zeroes.
    pub async fn get_stats(&self, id: &LocationId) -> NotificationStats {
        NotificationStats::from(&self.store.get(id).await)
    }

    /// Clears all throttling history for `id`.
    pub async fn reset(&self, id: &LocationId) {
        let lock = self.get_location_lock(id);
        let _guard = lock.lock().await;
        tracing::info!(location = %id, "Resetting notification state.");
        self.store.reset(id).await;
    }

    /// Writes the whole state store to the backend.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        self.store.flush().await
    }

    /// Human-readable dump of every tracked location, for diagnostics.
    pub async fn debug_summary(&self) -> String {
        let records = self.store.snapshot().await;
        let mut out = format!(
            "Notification states ({} locations, policy: {})\n",
            records.len(),
            self.policy.name()
        );
        for (id, state) in &records {
            let _ = writeln!(
                out,
                "  {}: daily={} total={} last_notification={} last_entry={} last_exit={} reset_date={}",
                id,
                state.daily_notification_count,
                state.notification_count,
                format_time(state.last_notification_time),
                format_time(state.last_entry_time),
                format_time(state.last_exit_time),
                state.last_reset_date.to_rfc3339(),
            );
        }
        out
    }

    /// Runs the policy on the stored state and persists the updated record.
    /// The caller must hold the location lock.
    async fn evaluate_locked(
        &self,
        location: &LocationConfig,
        event: GeofenceEvent,
        now: DateTime<Utc>,
    ) -> (Decision, NotificationState) {
        let mut state = self.store.get(&location.id).await;
        state.update_counters(now);

        let decision = self.policy.decide(&state, location, event, now);
        if decision != Decision::Suppress(SuppressReason::DailyCapReached) {
            state.record_event(event, now);
        }

        tracing::debug!(
            location = %location.id,
            %event,
            %decision,
            daily_count = state.daily_notification_count,
            "Evaluated geofence event."
        );

        self.store.put(&location.id, state.clone()).await;
        (decision, state)
    }

    /// Gets or creates the lock for a location.
    fn get_location_lock(&self, id: &LocationId) -> Arc<Mutex<()>> {
        self.location_locks.entry(id.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

/// Checks the location's own enable flags; these never touch state.
fn check_preconditions(location: &LocationConfig, event: GeofenceEvent) -> Option<Decision> {
    if !location.enabled {
        return Some(Decision::Suppress(SuppressReason::LocationDisabled));
    }
    if !location.notifies_on(event) {
        return Some(Decision::Suppress(SuppressReason::EventDisabled));
    }
    None
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".to_string())
}
