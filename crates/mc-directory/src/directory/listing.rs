use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filters::SortOrder;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One MC profile as materialized by the listing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: ListingId,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    pub price: f64,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    /// Mean review score, 0.0 when the listing has no reviews.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
}

impl ListingRecord {
    pub fn speaks(&self, language: &str) -> bool {
        self.languages.iter().any(|candidate| candidate == language)
    }
}

/// Aggregate of a listing's review scores.
///
/// Listing exports already carry `rating` and `review_count`. Callers that hold
/// raw review scores instead use [`ReviewSummary::from_ratings`] and
/// [`ReviewSummary::apply_to`] to fill those fields before ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub average: f64,
    pub count: u32,
}

impl ReviewSummary {
    pub const MIN_STARS: u8 = 1;
    pub const MAX_STARS: u8 = 5;

    /// Average of star ratings; scores outside 1..=5 are skipped.
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (total, count) = ratings
            .into_iter()
            .filter(|stars| (Self::MIN_STARS..=Self::MAX_STARS).contains(stars))
            .fold((0u64, 0u32), |(total, count), stars| {
                (total + u64::from(stars), count + 1)
            });

        if count == 0 {
            return Self::default();
        }

        Self {
            average: total as f64 / f64::from(count),
            count,
        }
    }

    pub fn apply_to(&self, listing: &mut ListingRecord) {
        listing.rating = self.average;
        listing.review_count = self.count;
    }
}

/// Options for the language picker and sort selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryFacets {
    pub languages: Vec<String>,
    pub sort_options: Vec<SortOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOption {
    pub value: SortOrder,
    pub label: &'static str,
}

impl DirectoryFacets {
    pub fn from_listings(listings: &[ListingRecord]) -> Self {
        let languages: BTreeSet<&str> = listings
            .iter()
            .flat_map(|listing| listing.languages.iter().map(String::as_str))
            .collect();

        Self {
            languages: languages.into_iter().map(str::to_string).collect(),
            sort_options: SortOrder::ordered()
                .into_iter()
                .map(|value| SortOption {
                    value,
                    label: value.label(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn listing(name: &str, languages: &[&str]) -> ListingRecord {
        ListingRecord {
            id: ListingId(name.to_lowercase()),
            name: name.to_string(),
            bio: String::new(),
            price: 800.0,
            languages: languages.iter().map(|lang| lang.to_string()).collect(),
            featured: false,
            created_at: Utc
                .with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
            rating: 0.0,
            review_count: 0,
        }
    }

    #[test]
    fn review_summary_averages_valid_scores_only() {
        let summary = ReviewSummary::from_ratings([5, 4, 0, 9, 3]);
        assert_eq!(summary.count, 3);
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn review_summary_without_reviews_is_zero() {
        let mut record = listing("Alex", &["English"]);
        ReviewSummary::from_ratings(Vec::new()).apply_to(&mut record);
        assert_eq!(record.rating, 0.0);
        assert_eq!(record.review_count, 0);
    }

    #[test]
    fn facets_list_distinct_languages_alphabetically() {
        let listings = vec![
            listing("Alex", &["English", "Spanish"]),
            listing("Beth", &["Mandarin", "English"]),
        ];
        let facets = DirectoryFacets::from_listings(&listings);
        assert_eq!(facets.languages, vec!["English", "Mandarin", "Spanish"]);
        assert_eq!(facets.sort_options.len(), 6);
        assert_eq!(facets.sort_options[0].value, SortOrder::Featured);
    }

    #[test]
    fn language_match_is_case_sensitive() {
        let record = listing("Alex", &["English"]);
        assert!(record.speaks("English"));
        assert!(!record.speaks("english"));
    }
}
