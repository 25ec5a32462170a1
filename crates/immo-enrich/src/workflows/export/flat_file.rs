use super::ExportError;
use crate::workflows::enrichment::{EnrichedListing, Governorate, PropertyType, Zoning};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const IMAGE_SEPARATOR: &str = ", ";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlatRow<'a> {
    description: &'a str,
    price: i64,
    address: &'a str,
    images: String,
    source_url: Option<&'a str>,
    source: &'a str,
    listed_date: NaiveDate,
    governorate: Governorate,
    coordinates: String,
    original_area: Option<u32>,
    area: Option<u32>,
    price_per_sq_ft: Option<f64>,
    property_type: PropertyType,
    zoning: Zoning,
    original_price: &'a str,
    price_usd: f64,
    area_in_sq_meters: Option<f64>,
    area_in_hectares: Option<f64>,
    near_water: bool,
    road_access: bool,
    utilities: bool,
}

impl<'a> From<&'a EnrichedListing> for FlatRow<'a> {
    fn from(listing: &'a EnrichedListing) -> Self {
        Self {
            description: &listing.description,
            price: listing.price,
            address: &listing.address,
            images: listing.images.join(IMAGE_SEPARATOR),
            source_url: listing.source_url.as_deref(),
            source: &listing.source,
            listed_date: listing.listed_date,
            governorate: listing.governorate,
            coordinates: format!(
                "[{}, {}]",
                listing.coordinates.longitude, listing.coordinates.latitude
            ),
            original_area: listing.original_area,
            area: listing.area,
            price_per_sq_ft: listing.price_per_sq_ft,
            property_type: listing.property_type,
            zoning: listing.zoning,
            original_price: &listing.original_price,
            price_usd: listing.price_usd,
            area_in_sq_meters: listing.area_in_sq_meters,
            area_in_hectares: listing.area_in_hectares,
            near_water: listing.near_water,
            road_access: listing.road_access,
            utilities: listing.utilities,
        }
    }
}

/// Writes one CSV row per listing, with a header row. Returns the row count.
pub fn write_csv<W: Write>(writer: W, listings: &[EnrichedListing]) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for listing in listings {
        csv_writer.serialize(FlatRow::from(listing))?;
    }
    csv_writer.flush()?;
    Ok(listings.len())
}

pub fn write_csv_path<P: AsRef<Path>>(
    path: P,
    listings: &[EnrichedListing],
) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let written = write_csv(file, listings)?;
    info!(path = %path.display(), rows = written, "wrote flat-file export");
    Ok(written)
}
