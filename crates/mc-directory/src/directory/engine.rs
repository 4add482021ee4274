use std::cmp::Ordering;

use super::filters::{FilterState, SortOrder};
use super::listing::ListingRecord;

/// Narrow and rank `listings` according to `state`.
///
/// Pure: the input slice is left untouched and the returned vector borrows
/// from it. Records with equal sort keys keep their input order.
pub fn apply<'a>(state: &FilterState, listings: &'a [ListingRecord]) -> Vec<&'a ListingRecord> {
    let needle = state.search.as_deref().map(str::to_lowercase);

    let mut view: Vec<&ListingRecord> = listings
        .iter()
        .filter(|listing| matches(state, needle.as_deref(), listing))
        .collect();

    sort(&mut view, state.effective_sort());
    view
}

/// Whether a single record passes every defined filter.
pub fn retains(state: &FilterState, listing: &ListingRecord) -> bool {
    let needle = state.search.as_deref().map(str::to_lowercase);
    matches(state, needle.as_deref(), listing)
}

fn matches(state: &FilterState, needle: Option<&str>, listing: &ListingRecord) -> bool {
    if let Some(needle) = needle {
        let in_name = listing.name.to_lowercase().contains(needle);
        if !in_name && !listing.bio.to_lowercase().contains(needle) {
            return false;
        }
    }

    if let Some(min) = state.min_price {
        if listing.price < min {
            return false;
        }
    }

    if let Some(max) = state.max_price {
        if listing.price > max {
            return false;
        }
    }

    match state.language.as_deref() {
        Some(language) => listing.speaks(language),
        None => true,
    }
}

fn sort(view: &mut [&ListingRecord], order: SortOrder) {
    // `sort_by` is stable, which keeps ties in input order.
    match order {
        SortOrder::Featured => view.sort_by_key(|listing| !listing.featured),
        SortOrder::PriceLow => view.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::PriceHigh => view.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortOrder::Rating => view.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortOrder::Name => view.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortOrder::Newest => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
