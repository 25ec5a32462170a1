use super::domain::{RawImages, RawListing};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashSet;

/// Listing that survived deduplication and field normalization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CleanListing {
    pub(crate) description: String,
    pub(crate) price: i64,
    pub(crate) address: String,
    pub(crate) images: Vec<String>,
    pub(crate) source_url: Option<String>,
    pub(crate) source: String,
    pub(crate) listed_date: NaiveDate,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CleaningTally {
    pub(crate) duplicates: usize,
    pub(crate) below_price_floor: usize,
    pub(crate) missing_fields: usize,
}

type DedupKey = (Option<String>, i64, Option<String>);

pub(crate) fn clean_batch(
    raw: Vec<RawListing>,
    price_floor: i64,
) -> (Vec<CleanListing>, CleaningTally) {
    let mut tally = CleaningTally::default();
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(raw.len());
    let mut cleaned = Vec::with_capacity(raw.len());

    for listing in raw {
        let key = (
            listing.description.clone(),
            listing.price,
            listing.source_url.clone(),
        );
        if !seen.insert(key) {
            tally.duplicates += 1;
            continue;
        }

        if listing.price <= price_floor {
            tally.below_price_floor += 1;
            continue;
        }

        match normalize(listing) {
            Some(listing) => cleaned.push(listing),
            None => tally.missing_fields += 1,
        }
    }

    (cleaned, tally)
}

fn normalize(listing: RawListing) -> Option<CleanListing> {
    let description = listing.description?.trim().to_string();
    let address = collapse_whitespace(&listing.address?);
    if description.is_empty() || address.is_empty() {
        return None;
    }

    Some(CleanListing {
        description,
        price: listing.price,
        address,
        images: repair_images(listing.images),
        source_url: listing.source_url,
        source: listing.source,
        listed_date: listing.listed_date,
    })
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn repair_images(images: RawImages) -> Vec<String> {
    let candidates: Vec<String> = match images {
        RawImages::List(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(url) => Some(url),
                _ => None,
            })
            .collect(),
        RawImages::Joined(joined) => joined
            .split(',')
            .map(|part| part.trim().to_string())
            .collect(),
        RawImages::Missing => Vec::new(),
    };

    candidates
        .into_iter()
        .filter(|url| url.starts_with("http"))
        .collect()
}
