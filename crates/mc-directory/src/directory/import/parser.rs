use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::ListingImportError;
use crate::directory::listing::{ListingId, ListingRecord};

const LANGUAGE_SEPARATOR: char = ';';

pub(crate) fn parse_listings<R: Read>(reader: R) -> Result<Vec<ListingRecord>, ListingImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut listings = Vec::new();

    for (index, record) in csv_reader.deserialize::<ListingRow>().enumerate() {
        // Header is line 1, so data rows start at 2.
        let row_number = index + 2;
        let row = record?;
        listings.push(row.into_record(row_number)?);
    }

    Ok(listings)
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    id: String,
    name: String,
    #[serde(default)]
    bio: String,
    price: String,
    #[serde(default)]
    languages: String,
    #[serde(default, deserialize_with = "flag")]
    featured: bool,
    created_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    review_count: Option<String>,
}

impl ListingRow {
    fn into_record(self, row: usize) -> Result<ListingRecord, ListingImportError> {
        let price = self
            .price
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| invalid(row, "price", &self.price))?;

        let created_at = parse_timestamp(&self.created_at)
            .ok_or_else(|| invalid(row, "created_at", &self.created_at))?;

        let rating = match self.rating.as_deref() {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|value| (0.0..=5.0).contains(value))
                .ok_or_else(|| invalid(row, "rating", raw))?,
            None => 0.0,
        };

        let review_count = match self.review_count.as_deref() {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| invalid(row, "review_count", raw))?,
            None => 0,
        };

        let mut languages: Vec<String> = Vec::new();
        for language in self
            .languages
            .split(LANGUAGE_SEPARATOR)
            .map(str::trim)
            .filter(|language| !language.is_empty())
        {
            if !languages.iter().any(|known| known == language) {
                languages.push(language.to_string());
            }
        }

        Ok(ListingRecord {
            id: ListingId(self.id),
            name: self.name,
            bio: self.bio,
            price,
            languages,
            featured: self.featured,
            created_at,
            rating,
            review_count,
        })
    }
}

fn invalid(row: usize, field: &'static str, value: &str) -> ListingImportError {
    ListingImportError::InvalidField {
        row,
        field,
        value: value.to_string(),
    }
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "0" => Ok(false),
        "true" | "yes" | "1" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean flag, got '{other}'"
        ))),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "id,name,bio,price,languages,featured,created_at,rating,review_count\n";

    fn parse(rows: &str) -> Result<Vec<ListingRecord>, ListingImportError> {
        parse_listings(Cursor::new(format!("{HEADER}{rows}")))
    }

    #[test]
    fn parses_languages_flags_and_optional_columns() {
        let listings = parse(
            "mc-1,Alex Rivera,Bilingual host,1500,English; Spanish;English,yes,2024-02-10,,\n",
        )
        .expect("row parses");

        let alex = &listings[0];
        assert_eq!(alex.id, ListingId("mc-1".to_string()));
        assert_eq!(alex.languages, vec!["English", "Spanish"]);
        assert!(alex.featured);
        assert_eq!(alex.rating, 0.0);
        assert_eq!(alex.review_count, 0);
        assert_eq!(alex.created_at.to_rfc3339(), "2024-02-10T00:00:00+00:00");
    }

    #[test]
    fn accepts_rfc3339_timestamps() {
        let listings = parse("mc-2,Beth,,300,English,false,2024-05-01T18:30:00+10:00,4.8,12\n")
            .expect("row parses");
        assert_eq!(
            listings[0].created_at.to_rfc3339(),
            "2024-05-01T08:30:00+00:00"
        );
        assert_eq!(listings[0].review_count, 12);
    }

    #[test]
    fn rejects_non_numeric_price_with_row_number() {
        let err = parse(
            "mc-1,Alex,,500,English,false,2024-01-01,,\nmc-2,Beth,,call us,English,false,2024-01-01,,\n",
        )
        .expect_err("price is invalid");

        match err {
            ListingImportError::InvalidField { row, field, value } => {
                assert_eq!(row, 3);
                assert_eq!(field, "price");
                assert_eq!(value, "call us");
            }
            other => panic!("expected invalid field, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unparsable_creation_dates() {
        let err = parse("mc-1,Alex,,500,English,false,last spring,,\n").expect_err("bad date");
        assert!(matches!(
            err,
            ListingImportError::InvalidField {
                field: "created_at",
                ..
            }
        ));
    }
}
