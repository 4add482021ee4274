mod parser;

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::info;

use super::listing::ListingRecord;

/// Error raised while materializing the listing collection.
#[derive(Debug, thiserror::Error)]
pub enum ListingImportError {
    #[error("failed to read listings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid listings CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: invalid {field} '{value}'")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// Source of the listing collection the directory ranks.
pub trait ListingProvider: Send + Sync {
    fn listings(&self) -> Result<Vec<ListingRecord>, ListingImportError>;
}

pub struct CsvListingImporter;

impl CsvListingImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ListingRecord>, ListingImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ListingRecord>, ListingImportError> {
        parser::parse_listings(reader)
    }
}

/// Provider re-reading a CSV export on every call.
#[derive(Debug, Clone)]
pub struct CsvListingProvider {
    path: PathBuf,
}

impl CsvListingProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ListingProvider for CsvListingProvider {
    fn listings(&self) -> Result<Vec<ListingRecord>, ListingImportError> {
        let listings = CsvListingImporter::from_path(&self.path)?;
        info!(path = %self.path.display(), count = listings.len(), "loaded listings");
        Ok(listings)
    }
}

/// Provider over an already-loaded collection.
#[derive(Debug, Clone, Default)]
pub struct StaticListingProvider {
    listings: Vec<ListingRecord>,
}

impl StaticListingProvider {
    pub fn new(listings: Vec<ListingRecord>) -> Self {
        Self { listings }
    }
}

impl ListingProvider for StaticListingProvider {
    fn listings(&self) -> Result<Vec<ListingRecord>, ListingImportError> {
        Ok(self.listings.clone())
    }
}
