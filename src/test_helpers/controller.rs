use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::ManualClock;
use crate::{
    engine::{
        controller::GeofenceNotificationController,
        policy::{AlwaysAllowPolicy, FullThrottlePolicy, NotificationPolicy},
        state_store::NotificationStateStore,
    },
    persistence::{InMemoryKeyValueStore, sqlite::SqliteStateRepository, traits::KeyValueStore},
};

/// Key used by the test controllers.
pub const TEST_STATE_KEY: &str = "notification_states";

/// A generic helper to create a controller over the provided backend, driven
/// by a manual clock starting at `start`.
pub async fn create_test_controller_with_backend<T: KeyValueStore>(
    backend: Arc<T>,
    policy: Arc<dyn NotificationPolicy>,
    start: DateTime<Utc>,
) -> (GeofenceNotificationController<T>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let store = NotificationStateStore::load(backend, TEST_STATE_KEY).await;
    (GeofenceNotificationController::new(store, policy, clock.clone()), clock)
}

/// A controller applying the full throttling policy over an in-memory store.
pub async fn create_test_controller(
    start: DateTime<Utc>,
) -> (GeofenceNotificationController<InMemoryKeyValueStore>, Arc<ManualClock>) {
    create_test_controller_with_backend(
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(FullThrottlePolicy::default()),
        start,
    )
    .await
}

/// A controller applying the always-allow policy over an in-memory store.
pub async fn create_always_allow_controller(
    start: DateTime<Utc>,
) -> (GeofenceNotificationController<InMemoryKeyValueStore>, Arc<ManualClock>) {
    create_test_controller_with_backend(
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(AlwaysAllowPolicy),
        start,
    )
    .await
}

/// An in-memory SQLite repository with migrations applied.
pub async fn create_test_sqlite_repository() -> SqliteStateRepository {
    let repo = SqliteStateRepository::new("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");
    repo.run_migrations().await.expect("Failed to run migrations");
    repo
}
