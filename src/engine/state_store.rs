//! Durable mapping from location to notification state.
//!
//! All records live in a single JSON document stored under one key of a
//! [`KeyValueStore`]. The document is read once when the store is loaded and
//! rewritten in full after every mutation.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    models::{LocationId, NotificationState},
    persistence::{error::PersistenceError, traits::KeyValueStore},
};

/// Version written into the persisted document.
pub const STATE_DOCUMENT_VERSION: u64 = 1;

/// Outcome of loading the persisted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records decoded successfully.
    pub loaded: usize,
    /// Records that could not be decoded and were discarded.
    pub dropped: usize,
}

#[derive(Serialize)]
struct StateDocument<'a> {
    version: u64,
    states: BTreeMap<&'a str, &'a NotificationState>,
}

/// Owns every location's [`NotificationState`].
///
/// Callers only ever receive copies of records. Persistence failures are
/// logged and never surfaced from `put`/`reset`.
pub struct NotificationStateStore<T: KeyValueStore> {
    backend: Arc<T>,
    key: String,
    states: Mutex<HashMap<LocationId, NotificationState>>,
    load_report: LoadReport,
}

impl<T: KeyValueStore> NotificationStateStore<T> {
    /// Loads the document stored under `key`.
    ///
    /// A missing, unreadable or undecodable document yields an empty store.
    /// Individual records that fail to decode are dropped and counted.
    #[tracing::instrument(skip(backend), level = "info")]
    pub async fn load(backend: Arc<T>, key: &str) -> Self {
        let (states, load_report) = match backend.get(key).await {
            Ok(Some(raw)) => match decode_document(&raw) {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::error!(key, error = %e, "Failed to decode notification states, starting empty.");
                    (HashMap::new(), LoadReport::default())
                }
            },
            Ok(None) => {
                tracing::debug!(key, "No persisted notification states found.");
                (HashMap::new(), LoadReport::default())
            }
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to read notification states, starting empty.");
                (HashMap::new(), LoadReport::default())
            }
        };

        if load_report.dropped > 0 {
            tracing::warn!(
                key,
                loaded = load_report.loaded,
                dropped = load_report.dropped,
                "Some notification states could not be decoded and were discarded."
            );
        } else {
            tracing::info!(key, loaded = load_report.loaded, "Notification states loaded.");
        }

        Self { backend, key: key.to_string(), states: Mutex::new(states), load_report }
    }

    /// What happened when the document was loaded.
    pub fn load_report(&self) -> LoadReport {
        self.load_report
    }

    /// Returns a copy of the record for `id`, or a default record if the
    /// location is unknown. Unknown locations are not persisted.
    pub async fn get(&self, id: &LocationId) -> NotificationState {
        self.states.lock().await.get(id).cloned().unwrap_or_default()
    }

    /// Whether a record exists for `id`.
    pub async fn contains(&self, id: &LocationId) -> bool {
        self.states.lock().await.contains_key(id)
    }

    /// Inserts or replaces the record for `id` and persists the store.
    #[tracing::instrument(skip(self, state), level = "debug")]
    pub async fn put(&self, id: &LocationId, state: NotificationState) {
        let mut states = self.states.lock().await;
        states.insert(id.clone(), state);
        if let Err(e) = self.persist(&states).await {
            tracing::error!(location = %id, error = %e, "Failed to persist notification states.");
        }
    }

    /// Replaces the record for `id` with a default record and persists.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn reset(&self, id: &LocationId) {
        self.put(id, NotificationState::default()).await;
    }

    /// All records, ordered by location id.
    pub async fn snapshot(&self) -> Vec<(LocationId, NotificationState)> {
        let states = self.states.lock().await;
        let mut records: Vec<_> =
            states.iter().map(|(id, state)| (id.clone(), state.clone())).collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    /// Whether no location is tracked.
    pub async fn is_empty(&self) -> bool {
        self.states.lock().await.is_empty()
    }

    /// Writes the whole store to the backend, returning any error.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        let states = self.states.lock().await;
        self.persist(&states).await
    }

    async fn persist(
        &self,
        states: &HashMap<LocationId, NotificationState>,
    ) -> Result<(), PersistenceError> {
        let raw = encode_document(states)?;
        self.backend.set(&self.key, &raw).await
    }
}

fn encode_document(
    states: &HashMap<LocationId, NotificationState>,
) -> Result<String, PersistenceError> {
    let document = StateDocument {
        version: STATE_DOCUMENT_VERSION,
        states: states.iter().map(|(id, state)| (id.as_str(), state)).collect(),
    };
    Ok(serde_json::to_string(&document)?)
}

/// Decodes either the versioned envelope or a bare legacy map of records.
fn decode_document(
    raw: &str,
) -> Result<(HashMap<LocationId, NotificationState>, LoadReport), PersistenceError> {
    let Value::Object(mut document) = serde_json::from_str::<Value>(raw)? else {
        return Err(PersistenceError::SerializationError(
            "notification state document is not a JSON object".to_string(),
        ));
    };

    let is_envelope = document.get("version").is_some_and(Value::is_u64)
        && document.get("states").is_some_and(Value::is_object);

    let entries = if is_envelope {
        let version = document.get("version").and_then(Value::as_u64).unwrap_or_default();
        if version > STATE_DOCUMENT_VERSION {
            return Err(PersistenceError::SerializationError(format!(
                "unsupported notification state document version {}",
                version
            )));
        }
        match document.remove("states") {
            Some(Value::Object(states)) => states,
            _ => serde_json::Map::new(),
        }
    } else {
        document
    };

    let mut states = HashMap::with_capacity(entries.len());
    let mut report = LoadReport::default();
    for (key, value) in entries {
        match serde_json::from_value::<NotificationState>(value) {
            Ok(state) => {
                states.insert(LocationId::from(key), state);
                report.loaded += 1;
            }
            Err(e) => {
                tracing::warn!(location = %key, error = %e, "Dropping undecodable notification state.");
                report.dropped += 1;
            }
        }
    }

    Ok((states, report))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::persistence::{InMemoryKeyValueStore, traits::MockKeyValueStore};

    const KEY: &str = "notification_states";

    fn sample_state() -> NotificationState {
        let t = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        NotificationState {
            last_notification_time: Some(t),
            last_entry_time: Some(t),
            last_exit_time: None,
            notification_count: 3,
            daily_notification_count: 2,
            last_reset_date: t,
        }
    }

    #[tokio::test]
    async fn test_get_unknown_location_returns_default_without_persisting() {
        let mut backend = MockKeyValueStore::new();
        backend.expect_get().times(1).returning(|_| Ok(None));
        backend.expect_set().times(0);

        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;
        let state = store.get(&LocationId::from("home")).await;

        assert_eq!(state, NotificationState::default());
        assert!(!store.contains(&LocationId::from("home")).await);
    }

    #[tokio::test]
    async fn test_put_persists_versioned_document() {
        let mut backend = MockKeyValueStore::new();
        backend.expect_get().returning(|_| Ok(None));
        backend
            .expect_set()
            .withf(|key, value| {
                let doc: Value = serde_json::from_str(value).unwrap();
                key == KEY
                    && doc["version"] == 1
                    && doc["states"]["home"]["daily_notification_count"] == 2
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;
        store.put(&LocationId::from("home"), sample_state()).await;
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed_and_memory_state_kept() {
        let mut backend = MockKeyValueStore::new();
        backend.expect_get().returning(|_| Ok(None));
        backend
            .expect_set()
            .times(1)
            .returning(|_, _| Err(PersistenceError::OperationFailed("disk full".into())));

        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;
        store.put(&LocationId::from("home"), sample_state()).await;

        assert_eq!(store.get(&LocationId::from("home")).await, sample_state());
    }

    #[tokio::test]
    async fn test_flush_surfaces_save_failure() {
        let mut backend = MockKeyValueStore::new();
        backend.expect_get().returning(|_| Ok(None));
        backend
            .expect_set()
            .times(1)
            .returning(|_, _| Err(PersistenceError::OperationFailed("disk full".into())));

        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;

        assert!(matches!(store.flush().await, Err(PersistenceError::OperationFailed(_))));
    }

    #[tokio::test]
    async fn test_read_failure_starts_empty() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_get()
            .times(1)
            .returning(|_| Err(PersistenceError::OperationFailed("locked".into())));

        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;

        assert!(store.is_empty().await);
        assert_eq!(store.load_report(), LoadReport::default());
    }

    #[tokio::test]
    async fn test_malformed_document_starts_empty() {
        let backend = InMemoryKeyValueStore::with_entry(KEY, "{not json");
        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_object_document_starts_empty() {
        let backend = InMemoryKeyValueStore::with_entry(KEY, "[1, 2, 3]");
        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_future_version_starts_empty() {
        let backend =
            InMemoryKeyValueStore::with_entry(KEY, r#"{"version": 99, "states": {"home": {}}}"#);
        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_undecodable_record_is_dropped_and_reported() {
        let good = serde_json::to_value(sample_state()).unwrap();
        let raw = serde_json::json!({
            "version": 1,
            "states": {
                "home": good,
                "broken": {"notification_count": "many"},
            }
        })
        .to_string();
        let backend = InMemoryKeyValueStore::with_entry(KEY, &raw);

        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;

        assert_eq!(store.load_report(), LoadReport { loaded: 1, dropped: 1 });
        assert_eq!(store.get(&LocationId::from("home")).await, sample_state());
        assert!(!store.contains(&LocationId::from("broken")).await);
    }

    #[tokio::test]
    async fn test_legacy_bare_map_is_accepted() {
        let raw = serde_json::json!({ "home": serde_json::to_value(sample_state()).unwrap() })
            .to_string();
        let backend = InMemoryKeyValueStore::with_entry(KEY, &raw);

        let store = NotificationStateStore::load(Arc::new(backend), KEY).await;

        assert_eq!(store.load_report(), LoadReport { loaded: 1, dropped: 0 });
        assert_eq!(store.get(&LocationId::from("home")).await, sample_state());
    }

    #[tokio::test]
    async fn test_round_trip_through_backend() {
        let backend = Arc::new(InMemoryKeyValueStore::new());
        let store = NotificationStateStore::load(backend.clone(), KEY).await;
        store.put(&LocationId::from("home"), sample_state()).await;
        store.reset(&LocationId::from("gym")).await;

        let reloaded = NotificationStateStore::load(backend, KEY).await;

        assert_eq!(reloaded.snapshot().await, store.snapshot().await);
        assert_eq!(reloaded.load_report(), LoadReport { loaded: 2, dropped: 0 });
    }

    #[tokio::test]
    async fn test_snapshot_is_sorted() {
        let backend = Arc::new(InMemoryKeyValueStore::new());
        let store = NotificationStateStore::load(backend, KEY).await;
        store.reset(&LocationId::from("b")).await;
        store.reset(&LocationId::from("a")).await;

        let ids: Vec<_> = store.snapshot().await.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![LocationId::from("a"), LocationId::from("b")]);
    }
}
