//! Reconciles the filter selection between the location and the durable cache.
//!
//! A session calls [`FilterStateStore::initialize`] once, then reports every
//! change through [`FilterStateStore::on_state_changed`] (user edits) or
//! [`FilterStateStore::on_location_changed`] (navigation the store did not make).

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::filters::{has_filter_keys, FilterState};
use super::repository::{Navigator, StateRepository};

/// Which source the initial filter state was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSource {
    Location,
    Cache,
    Empty,
}

/// Outcome of a persistence attempt. Failures are absorbed, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written,
    /// The cache could not be written; the session continues location-only.
    Skipped,
    /// Persistence was requested before the session was initialized.
    NotInitialized,
}

pub struct FilterStateStore<R, N> {
    repository: Arc<R>,
    navigator: Arc<N>,
    state: FilterState,
    source: Option<InitSource>,
    last_persist: Option<PersistOutcome>,
}

impl<R, N> FilterStateStore<R, N>
where
    R: StateRepository + 'static,
    N: Navigator + 'static,
{
    pub fn new(repository: Arc<R>, navigator: Arc<N>) -> Self {
        Self {
            repository,
            navigator,
            state: FilterState::default(),
            source: None,
            last_persist: None,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn source(&self) -> Option<InitSource> {
        self.source
    }

    pub fn is_initialized(&self) -> bool {
        self.source.is_some()
    }

    /// Outcome of the most recent cache write attempt, if any.
    pub fn last_persist(&self) -> Option<PersistOutcome> {
        self.last_persist
    }

    /// Pick the session's starting state.
    ///
    /// A location carrying any filter key wins and the cache is not read.
    /// Otherwise a cached state is copied into the location with a
    /// non-navigating replace. Either way a non-empty adopted state is
    /// persisted. Only the first call has any effect.
    pub fn initialize(&mut self) -> &FilterState {
        if let Some(source) = self.source {
            debug!(?source, "filter store already initialized");
            return &self.state;
        }

        let location = self.navigator.query();
        let source = if has_filter_keys(&location) {
            self.state = FilterState::from_query(&location);
            InitSource::Location
        } else {
            match self.read_cached() {
                Some(cached) if !cached.is_empty() => {
                    self.navigator.replace_query(cached.to_query());
                    self.state = cached;
                    InitSource::Cache
                }
                _ => {
                    self.state = FilterState::default();
                    InitSource::Empty
                }
            }
        };

        self.source = Some(source);
        info!(?source, filters = ?self.state, "filter state initialized");

        // Mount never caches an empty selection.
        if source != InitSource::Empty && !self.state.is_empty() {
            self.persist_location();
        }

        &self.state
    }

    /// Apply a new selection: write it into the location, keeping unrelated
    /// query parameters, then persist.
    pub fn on_state_changed(&mut self, state: FilterState) -> PersistOutcome {
        if !self.is_initialized() {
            warn!("filter change reported before initialization; ignoring");
            return PersistOutcome::NotInitialized;
        }

        let mut location = self.navigator.query();
        state.write_into(&mut location);
        self.navigator.replace_query(location);
        self.persist_location()
    }

    /// Persist after the location changed without going through the store.
    pub fn on_location_changed(&mut self) -> PersistOutcome {
        if !self.is_initialized() {
            warn!("location change observed before initialization; cache left untouched");
            return PersistOutcome::NotInitialized;
        }

        self.persist_location()
    }

    fn persist_location(&mut self) -> PersistOutcome {
        let outcome = self.write_location();
        self.last_persist = Some(outcome);
        outcome
    }

    fn write_location(&mut self) -> PersistOutcome {
        self.state = FilterState::from_query(&self.navigator.query());

        let blob = match self.state.to_json() {
            Ok(blob) => blob,
            Err(err) => {
                warn!(error = %err, "failed to serialize filter state");
                return PersistOutcome::Skipped;
            }
        };

        match self.repository.write(&blob) {
            Ok(()) => {
                debug!(%blob, "filter state cached");
                PersistOutcome::Written
            }
            Err(err) => {
                warn!(error = %err, "filter cache write failed; continuing without persistence");
                PersistOutcome::Skipped
            }
        }
    }

    fn read_cached(&self) -> Option<FilterState> {
        let blob = match self.repository.read() {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "filter cache unavailable; starting empty");
                return None;
            }
        };

        match FilterState::from_json(&blob) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!(error = %err, "discarding malformed cached filter state");
                None
            }
        }
    }
}
