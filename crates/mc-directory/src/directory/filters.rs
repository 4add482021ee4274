use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::query::QueryParams;

pub const SEARCH_KEY: &str = "search";
pub const MIN_PRICE_KEY: &str = "minPrice";
pub const MAX_PRICE_KEY: &str = "maxPrice";
pub const LANGUAGE_KEY: &str = "language";
pub const SORT_KEY: &str = "sort";

/// Query keys the directory understands, in the order they are written.
pub const FILTER_KEYS: [&str; 5] = [
    SEARCH_KEY,
    MIN_PRICE_KEY,
    MAX_PRICE_KEY,
    LANGUAGE_KEY,
    SORT_KEY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Rating,
    Name,
    Newest,
}

impl SortOrder {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Featured,
            Self::PriceLow,
            Self::PriceHigh,
            Self::Rating,
            Self::Name,
            Self::Newest,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating",
            Self::Name => "name",
            Self::Newest => "newest",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceLow => "Price: Low to High",
            Self::PriceHigh => "Price: High to Low",
            Self::Rating => "Highest Rated",
            Self::Name => "Name (A-Z)",
            Self::Newest => "Newest",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort order '{0}'")]
pub struct UnknownSortOrder(pub String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|order| order.as_str() == value.trim())
            .ok_or_else(|| UnknownSortOrder(value.to_string()))
    }
}

/// The user's active filter and sort selection.
///
/// `None` always means "no constraint". Absent fields are skipped when the
/// state is written to the location or the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_price"
    )]
    pub min_price: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_price"
    )]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.language.is_none()
            && self.sort.is_none()
    }

    /// Sort order to apply, falling back to featured-first.
    pub fn effective_sort(&self) -> SortOrder {
        self.sort.unwrap_or_default()
    }

    /// Read the recognized filter keys out of the location's query.
    ///
    /// Blank values count as absent; other text is kept as given. Prices that
    /// are not finite, non-negative numbers and unknown sort keys are dropped
    /// with a warning.
    pub fn from_query(params: &QueryParams) -> Self {
        let text = |key: &str| params.get(key).and_then(non_blank);

        let price = |key: &str| {
            let raw = text(key)?;
            match parse_price(&raw) {
                Some(value) => Some(value),
                None => {
                    warn!(key, value = %raw, "ignoring invalid price filter");
                    None
                }
            }
        };

        let sort = text(SORT_KEY).and_then(|raw| match raw.trim().parse::<SortOrder>() {
            Ok(order) => Some(order),
            Err(err) => {
                warn!(error = %err, "ignoring sort filter");
                None
            }
        });

        Self {
            search: text(SEARCH_KEY),
            min_price: price(MIN_PRICE_KEY),
            max_price: price(MAX_PRICE_KEY),
            language: text(LANGUAGE_KEY),
            sort,
        }
    }

    /// Query containing only the defined fields, in `FILTER_KEYS` order.
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        self.write_into(&mut params);
        params
    }

    /// Rewrite the filter keys of `params`. Unrelated keys keep their place;
    /// filter keys follow them in `FILTER_KEYS` order.
    pub fn write_into(&self, params: &mut QueryParams) {
        for key in FILTER_KEYS {
            params.remove(key);
        }

        let fields = [
            (SEARCH_KEY, self.search.clone()),
            (MIN_PRICE_KEY, self.min_price.map(|price| price.to_string())),
            (MAX_PRICE_KEY, self.max_price.map(|price| price.to_string())),
            (LANGUAGE_KEY, self.language.clone()),
            (SORT_KEY, self.sort.map(|order| order.as_str().to_string())),
        ];

        for (key, value) in fields {
            if let Some(value) = value {
                params.append(key, value);
            }
        }
    }

    /// Serialized cache blob.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a cache blob. Blank text fields count as absent, as in the query.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut state: Self = serde_json::from_str(raw)?;
        state.search = state.search.as_deref().and_then(non_blank);
        state.language = state.language.as_deref().and_then(non_blank);
        Ok(state)
    }
}

fn non_blank(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Whether the location carries any filter key at all.
pub fn has_filter_keys(params: &QueryParams) -> bool {
    FILTER_KEYS.iter().any(|key| {
        params
            .get(key)
            .is_some_and(|value| !value.trim().is_empty())
    })
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| valid_price(*value))
}

fn valid_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPrice>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawPrice::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawPrice::Number(value)) if valid_price(value) => Ok(Some(value)),
        Some(RawPrice::Number(value)) => Err(serde::de::Error::custom(format!(
            "invalid price {value}"
        ))),
        Some(RawPrice::Text(text)) => parse_price(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price '{text}'"))),
    }
}
