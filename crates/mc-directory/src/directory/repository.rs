use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::query::QueryParams;

/// Durable client-side cache holding the serialized filter blob.
pub trait StateRepository: Send + Sync {
    fn read(&self) -> Result<Option<String>, CacheError>;
    fn write(&self, blob: &str) -> Result<(), CacheError>;
}

/// Access to the shareable location descriptor's query.
pub trait Navigator: Send + Sync {
    fn query(&self) -> QueryParams;
    /// Replace the query without adding a history entry or reloading.
    fn replace_query(&self, query: QueryParams);
}

/// Error enumeration for cache failures.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("filter cache unavailable: {0}")]
    Unavailable(String),
    #[error("filter cache io failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Cache kept in process memory, e.g. for a single CLI session or tests.
#[derive(Debug, Default)]
pub struct MemoryStateRepository {
    entry: Mutex<Option<String>>,
}

impl MemoryStateRepository {
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            entry: Mutex::new(Some(blob.into())),
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.entry.lock().expect("cache mutex poisoned").clone()
    }
}

impl StateRepository for MemoryStateRepository {
    fn read(&self) -> Result<Option<String>, CacheError> {
        let guard = self
            .entry
            .lock()
            .map_err(|_| CacheError::Unavailable("cache mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn write(&self, blob: &str) -> Result<(), CacheError> {
        let mut guard = self
            .entry
            .lock()
            .map_err(|_| CacheError::Unavailable("cache mutex poisoned".to_string()))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}

/// Cache persisted as a single file on disk; the file path is the fixed cache key.
/// A missing file means nothing is cached.
#[derive(Debug, Clone)]
pub struct FileStateRepository {
    path: PathBuf,
}

impl FileStateRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateRepository for FileStateRepository {
    fn read(&self) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn write(&self, blob: &str) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        fs::write(&self.path, blob).map_err(|err| self.io_error(err))
    }
}

/// Location held in memory. Tracks how many replacements were made.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    state: Mutex<NavigatorState>,
}

#[derive(Debug, Default)]
struct NavigatorState {
    query: QueryParams,
    replacements: usize,
}

impl MemoryNavigator {
    pub fn new(query: QueryParams) -> Self {
        Self {
            state: Mutex::new(NavigatorState {
                query,
                replacements: 0,
            }),
        }
    }

    pub fn from_query_string(raw: &str) -> Self {
        Self::new(QueryParams::parse(raw))
    }

    pub fn replacements(&self) -> usize {
        self.state
            .lock()
            .expect("navigator mutex poisoned")
            .replacements
    }

    /// Simulate a navigation the store did not initiate (typing a URL, back button).
    pub fn navigate(&self, query: QueryParams) {
        self.state.lock().expect("navigator mutex poisoned").query = query;
    }
}

impl Navigator for MemoryNavigator {
    fn query(&self) -> QueryParams {
        self.state
            .lock()
            .expect("navigator mutex poisoned")
            .query
            .clone()
    }

    fn replace_query(&self, query: QueryParams) {
        let mut guard = self.state.lock().expect("navigator mutex poisoned");
        guard.query = query;
        guard.replacements += 1;
    }
}
