use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::directory::repository::{CacheError, MemoryNavigator, Navigator, StateRepository};
use crate::directory::store::FilterStateStore;
use crate::directory::{FilterState, QueryParams, SortOrder};

/// Cache that records every read and write it receives.
#[derive(Default)]
pub(super) struct RecordingRepository {
    entry: Mutex<Option<String>>,
    reads: AtomicUsize,
    writes: Mutex<Vec<String>>,
}

impl RecordingRepository {
    pub(super) fn with_blob(blob: &str) -> Self {
        Self {
            entry: Mutex::new(Some(blob.to_string())),
            ..Self::default()
        }
    }

    pub(super) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(super) fn writes(&self) -> Vec<String> {
        self.writes.lock().expect("writes mutex poisoned").clone()
    }

    pub(super) fn current(&self) -> Option<String> {
        self.entry.lock().expect("entry mutex poisoned").clone()
    }
}

impl StateRepository for RecordingRepository {
    fn read(&self) -> Result<Option<String>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.entry.lock().expect("entry mutex poisoned").clone())
    }

    fn write(&self, blob: &str) -> Result<(), CacheError> {
        *self.entry.lock().expect("entry mutex poisoned") = Some(blob.to_string());
        self.writes
            .lock()
            .expect("writes mutex poisoned")
            .push(blob.to_string());
        Ok(())
    }
}

/// Cache standing in for disabled browser storage.
pub(super) struct UnavailableRepository;

impl StateRepository for UnavailableRepository {
    fn read(&self) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("storage disabled".to_string()))
    }

    fn write(&self, _blob: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("storage disabled".to_string()))
    }
}

pub(super) fn build_store<R: StateRepository + 'static>(
    repository: R,
    location: &str,
) -> (
    FilterStateStore<R, MemoryNavigator>,
    Arc<R>,
    Arc<MemoryNavigator>,
) {
    let repository = Arc::new(repository);
    let navigator = Arc::new(MemoryNavigator::from_query_string(location));
    let store = FilterStateStore::new(repository.clone(), navigator.clone());
    (store, repository, navigator)
}

pub(super) fn location_string(navigator: &MemoryNavigator) -> String {
    navigator.query().to_query_string()
}

pub(super) fn price_band(min: f64, max: f64) -> FilterState {
    FilterState {
        min_price: Some(min),
        max_price: Some(max),
        ..FilterState::default()
    }
}

pub(super) fn full_state() -> FilterState {
    FilterState {
        search: Some("Grace & co".to_string()),
        min_price: Some(250.0),
        max_price: Some(1800.5),
        language: Some("Tagalog".to_string()),
        sort: Some(SortOrder::Rating),
    }
}

pub(super) fn query(raw: &str) -> QueryParams {
    QueryParams::parse(raw)
}
