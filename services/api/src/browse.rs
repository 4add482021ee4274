use crate::infra::{parse_price, parse_sort};
use clap::Args;
use mc_directory::config::AppConfig;
use mc_directory::directory::{
    apply, CsvListingProvider, FileStateRepository, FilterState, FilterStateStore, InitSource,
    ListingProvider, ListingRecord, MemoryNavigator, Navigator, PersistOutcome, SortOrder,
    StateRepository,
};
use mc_directory::error::AppError;
use mc_directory::telemetry::{self, LogSink};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct BrowseArgs {
    /// Location query to start from, e.g. "language=French&sort=rating"
    #[arg(long, default_value = "")]
    pub(crate) query: String,
    /// Case-insensitive text to find in names and bios
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Lowest acceptable price (inclusive)
    #[arg(long, value_parser = parse_price)]
    pub(crate) min_price: Option<f64>,
    /// Highest acceptable price (inclusive)
    #[arg(long, value_parser = parse_price)]
    pub(crate) max_price: Option<f64>,
    /// Language the MC must speak (exact match)
    #[arg(long)]
    pub(crate) language: Option<String>,
    /// One of featured, price-low, price-high, rating, name, newest
    #[arg(long, value_parser = parse_sort)]
    pub(crate) sort: Option<SortOrder>,
    /// Drop every remembered filter before applying overrides
    #[arg(long)]
    pub(crate) reset: bool,
    /// Listings CSV export (defaults to DIRECTORY_LISTINGS_PATH)
    #[arg(long)]
    pub(crate) listings: Option<PathBuf>,
    /// Filter cache file (defaults to DIRECTORY_CACHE_PATH)
    #[arg(long)]
    pub(crate) cache: Option<PathBuf>,
}

impl BrowseArgs {
    fn has_overrides(&self) -> bool {
        self.reset
            || self.search.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.language.is_some()
            || self.sort.is_some()
    }

    /// Selection after layering the flags over `current`.
    fn merged(&self, current: &FilterState) -> FilterState {
        let mut next = if self.reset {
            FilterState::default()
        } else {
            current.clone()
        };

        if let Some(search) = &self.search {
            next.search = Some(search.clone()).filter(|value| !value.trim().is_empty());
        }
        if let Some(min) = self.min_price {
            next.min_price = Some(min);
        }
        if let Some(max) = self.max_price {
            next.max_price = Some(max);
        }
        if let Some(language) = &self.language {
            next.language = Some(language.clone()).filter(|value| !value.trim().is_empty());
        }
        if let Some(sort) = self.sort {
            next.sort = Some(sort);
        }

        next
    }
}

pub(crate) fn run_browse(args: BrowseArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    let cache_path = args
        .cache
        .clone()
        .unwrap_or_else(|| config.directory.cache_path.clone());
    let listings_path = args
        .listings
        .clone()
        .unwrap_or_else(|| config.directory.listings_path.clone());

    let repository = Arc::new(FileStateRepository::new(cache_path));
    let navigator = Arc::new(MemoryNavigator::from_query_string(&args.query));
    let provider = CsvListingProvider::new(listings_path);

    let session = browse_session(&args, repository, navigator.clone());
    let listings = provider.listings()?;
    let view = apply(&session.filters, &listings);

    render_browse(&session, &navigator.query().to_query_string(), &view);
    Ok(())
}

pub(crate) struct BrowseSession {
    pub(crate) source: InitSource,
    pub(crate) persisted: Option<PersistOutcome>,
    pub(crate) filters: FilterState,
}

/// One store lifecycle: initialize, then report the flag overrides as a change.
pub(crate) fn browse_session<R, N>(
    args: &BrowseArgs,
    repository: Arc<R>,
    navigator: Arc<N>,
) -> BrowseSession
where
    R: StateRepository + 'static,
    N: Navigator + 'static,
{
    let mut store = FilterStateStore::new(repository, navigator);
    let initial = store.initialize().clone();
    let source = store.source().unwrap_or(InitSource::Empty);

    if args.has_overrides() {
        store.on_state_changed(args.merged(&initial));
    }

    BrowseSession {
        source,
        persisted: store.last_persist(),
        filters: store.state().clone(),
    }
}

fn render_browse(session: &BrowseSession, location: &str, view: &[&ListingRecord]) {
    println!("MC directory");

    let source_label = match session.source {
        InitSource::Location => "query string",
        InitSource::Cache => "remembered filters",
        InitSource::Empty => "no filters",
    };
    println!("Started from: {source_label}");

    if location.is_empty() {
        println!("Location: (none)");
    } else {
        println!("Location: ?{location}");
    }

    match session.persisted {
        Some(PersistOutcome::Written) => println!("Filters saved for next time"),
        Some(PersistOutcome::Skipped) => println!("Filters could not be saved (cache unavailable)"),
        Some(PersistOutcome::NotInitialized) | None => {}
    }

    let sort = session.filters.effective_sort();
    println!("Sorted by: {}", sort.label());

    if view.is_empty() {
        println!("\nNo MCs match these filters");
        return;
    }

    println!("\n{} MC(s) found", view.len());
    for (position, listing) in view.iter().enumerate() {
        let featured = if listing.featured { " [featured]" } else { "" };
        let rating = if listing.review_count == 0 {
            "no reviews".to_string()
        } else {
            format!("{:.1} from {} reviews", listing.rating, listing.review_count)
        };
        println!(
            "{}. {}{} | ${:.0} | {} | {}",
            position + 1,
            listing.name,
            featured,
            listing.price,
            listing.languages.join(", "),
            rating
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_directory::directory::MemoryStateRepository;

    fn args(query: &str) -> BrowseArgs {
        BrowseArgs {
            query: query.to_string(),
            ..BrowseArgs::default()
        }
    }

    #[test]
    fn shared_link_is_persisted_without_overrides() {
        let repository = Arc::new(MemoryStateRepository::default());
        let navigator = Arc::new(MemoryNavigator::from_query_string("sort=name"));

        let session = browse_session(&args("sort=name"), repository.clone(), navigator);

        assert_eq!(session.source, InitSource::Location);
        assert_eq!(session.persisted, Some(PersistOutcome::Written));
        assert_eq!(repository.snapshot().as_deref(), Some(r#"{"sort":"name"}"#));
    }

    #[test]
    fn overrides_layer_over_remembered_filters() {
        let repository = Arc::new(MemoryStateRepository::with_blob(
            r#"{"language":"Greek","sort":"rating"}"#,
        ));
        let navigator = Arc::new(MemoryNavigator::from_query_string(""));
        let browse = BrowseArgs {
            max_price: Some(1000.0),
            ..args("")
        };

        let session = browse_session(&browse, repository.clone(), navigator.clone());

        assert_eq!(session.source, InitSource::Cache);
        assert_eq!(session.filters.language.as_deref(), Some("Greek"));
        assert_eq!(session.filters.max_price, Some(1000.0));
        assert_eq!(
            navigator.query().to_query_string(),
            "maxPrice=1000&language=Greek&sort=rating"
        );
    }

    #[test]
    fn reset_clears_remembered_filters() {
        let repository = Arc::new(MemoryStateRepository::with_blob(r#"{"search":"jazz"}"#));
        let navigator = Arc::new(MemoryNavigator::from_query_string(""));
        let browse = BrowseArgs {
            reset: true,
            ..args("")
        };

        let session = browse_session(&browse, repository.clone(), navigator.clone());

        assert!(session.filters.is_empty());
        assert!(navigator.query().is_empty());
        assert_eq!(repository.snapshot().as_deref(), Some("{}"));
    }
}
