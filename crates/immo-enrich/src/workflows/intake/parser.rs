use super::{IntakeError, ListingFormat};
use crate::workflows::enrichment::domain::{
    parse_date, parse_price_text, RawImages, RawListing, DEFAULT_SOURCE,
};
use chrono::Local;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::io::{BufRead, BufReader, Read};
use tracing::warn;

pub(crate) fn parse_listings<R: Read>(
    reader: R,
    format: ListingFormat,
) -> Result<Vec<RawListing>, IntakeError> {
    match format {
        ListingFormat::Json => parse_json_array(reader),
        ListingFormat::JsonLines => parse_json_lines(reader),
        ListingFormat::Csv => parse_csv(reader),
    }
}

fn parse_json_array<R: Read>(reader: R) -> Result<Vec<RawListing>, IntakeError> {
    let items: Vec<Value> = serde_json::from_reader(reader).map_err(IntakeError::Json)?;
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| decode_value(item, index + 1))
        .collect())
}

fn parse_json_lines<R: Read>(reader: R) -> Result<Vec<RawListing>, IntakeError> {
    let mut listings = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(&line) {
            Ok(value) => listings.extend(decode_value(value, index + 1)),
            Err(err) => warn!(line = index + 1, error = %err, "skipping unreadable listing line"),
        }
    }
    Ok(listings)
}

fn decode_value(value: Value, position: usize) -> Option<RawListing> {
    match serde_json::from_value::<RawListing>(value) {
        Ok(listing) => Some(listing),
        Err(err) => {
            warn!(position, error = %err, "skipping malformed listing");
            None
        }
    }
}

fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawListing>, IntakeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);
    let mut listings = Vec::new();

    for (index, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        match record {
            Ok(row) => listings.push(row.into_listing()),
            Err(err) if err.is_io_error() => return Err(IntakeError::Csv(err)),
            Err(err) => warn!(row = index + 1, error = %err, "skipping malformed csv row"),
        }
    }

    Ok(listings)
}

/// Flat-file row. Extra columns (such as those written by the CSV export)
/// are ignored, so an exported file can be fed back in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    price: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    images: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    source_url: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    source: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    listed_date: Option<String>,
}

impl CsvRow {
    fn into_listing(self) -> RawListing {
        RawListing {
            description: self.description,
            price: self.price.as_deref().and_then(parse_price_text).unwrap_or(0),
            address: self.address,
            images: self.images.map(RawImages::Joined).unwrap_or_default(),
            source_url: self.source_url,
            source: self.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            listed_date: self
                .listed_date
                .as_deref()
                .and_then(parse_date)
                .unwrap_or_else(|| Local::now().date_naive()),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
