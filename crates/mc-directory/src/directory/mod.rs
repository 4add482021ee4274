//! Directory browsing: filter state reconciliation and listing ranking.

pub mod engine;
pub mod filters;
pub mod import;
pub mod listing;
pub mod query;
pub mod repository;
pub mod store;

#[cfg(test)]
mod tests;

pub use engine::apply;
pub use filters::{has_filter_keys, FilterState, SortOrder, UnknownSortOrder, FILTER_KEYS};
pub use import::{
    CsvListingImporter, CsvListingProvider, ListingImportError, ListingProvider,
    StaticListingProvider,
};
pub use listing::{DirectoryFacets, ListingId, ListingRecord, ReviewSummary, SortOption};
pub use query::QueryParams;
pub use repository::{
    CacheError, FileStateRepository, MemoryNavigator, MemoryStateRepository, Navigator,
    StateRepository,
};
pub use store::{FilterStateStore, InitSource, PersistOutcome};
