//! Cleaning and enrichment of scraped listings.
//!
//! Stages run strictly in sequence and each one sees the whole batch before
//! the next starts: deduplication and normalization, region lookup,
//! area/price-rate derivation with its quality filter, then categorical
//! inference and formatting. Nothing in here fails; bad input turns into
//! dropped records or absent fields, counted in the [`EnrichmentReport`].

mod area;
mod classify;
mod cleaning;
pub mod domain;
mod pricing;
mod region;
pub mod report;

pub use area::{extract_area_m2, square_meters_to_feet, SQ_FT_PER_SQ_M};
pub use classify::{infer_property_type, infer_zoning, mentions_water};
pub use domain::{
    Coordinates, EnrichedListing, Governorate, PropertyType, RawImages, RawListing, Zoning,
};
pub use pricing::{format_price, price_in_usd, square_feet_to_hectares, square_feet_to_meters};
pub use region::{governorate_for, DEFAULT_CENTROID, DEFAULT_JITTER, GOVERNORATE_JITTER};
pub use report::{EnrichmentReport, EnrichmentSummary, TallyEntry};

use area::AreaMeasure;
use cleaning::CleanListing;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use region::Placement;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Numeric policy applied by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    /// Listings priced at or below this many dinars are placeholders.
    pub price_floor: i64,
    pub min_price_per_sq_ft: f64,
    pub max_price_per_sq_ft: f64,
    pub usd_rate: f64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            price_floor: 10,
            min_price_per_sq_ft: 1.0,
            max_price_per_sq_ft: 5000.0,
            usd_rate: 0.32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub listings: Vec<EnrichedListing>,
    pub report: EnrichmentReport,
}

impl EnrichmentOutcome {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Batch pipeline. The random source only feeds coordinate jitter, so a
/// seeded generator makes the whole run reproducible.
pub struct EnrichmentPipeline<R: Rng = StdRng> {
    settings: EnrichmentSettings,
    rng: R,
}

impl EnrichmentPipeline<StdRng> {
    pub fn seeded(settings: EnrichmentSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(settings: EnrichmentSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }
}

impl<R: Rng> EnrichmentPipeline<R> {
    pub fn with_rng(settings: EnrichmentSettings, rng: R) -> Self {
        Self { settings, rng }
    }

    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    pub fn run(&mut self, raw: Vec<RawListing>) -> EnrichmentOutcome {
        let mut report = EnrichmentReport {
            received: raw.len(),
            ..EnrichmentReport::default()
        };

        if raw.is_empty() {
            info!("no raw listings received, skipping enrichment");
            return EnrichmentOutcome {
                listings: Vec::new(),
                report,
            };
        }

        let (cleaned, tally) = cleaning::clean_batch(raw, self.settings.price_floor);
        report.duplicates = tally.duplicates;
        report.below_price_floor = tally.below_price_floor;
        report.missing_fields = tally.missing_fields;
        debug!(
            kept = cleaned.len(),
            duplicates = tally.duplicates,
            below_price_floor = tally.below_price_floor,
            missing_fields = tally.missing_fields,
            "cleaning stage finished"
        );

        if cleaned.is_empty() {
            info!(received = report.received, "no listings survived cleaning");
            return EnrichmentOutcome {
                listings: Vec::new(),
                report,
            };
        }

        let placed: Vec<(CleanListing, Placement)> = cleaned
            .into_iter()
            .map(|listing| {
                let placement = region::locate(&listing.address, &mut self.rng);
                (listing, placement)
            })
            .collect();

        let measured: Vec<(CleanListing, Placement, AreaMeasure)> = placed
            .into_iter()
            .map(|(listing, placement)| {
                let measure = area::measure(&listing.description, listing.price);
                (listing, placement, measure)
            })
            .collect();

        let before_rate_filter = measured.len();
        let (min_rate, max_rate) = (
            self.settings.min_price_per_sq_ft,
            self.settings.max_price_per_sq_ft,
        );
        let in_range: Vec<_> = measured
            .into_iter()
            .filter(|(_, _, measure)| measure.rate_within(min_rate, max_rate))
            .collect();
        report.rate_out_of_range = before_rate_filter - in_range.len();
        debug!(
            kept = in_range.len(),
            dropped = report.rate_out_of_range,
            "price-per-area filter finished"
        );

        let listings: Vec<EnrichedListing> = in_range
            .into_iter()
            .map(|(listing, placement, measure)| {
                finish(listing, placement, measure, &self.settings)
            })
            .collect();

        report.tally(&listings);
        info!(
            received = report.received,
            retained = report.retained,
            "enrichment finished"
        );

        EnrichmentOutcome { listings, report }
    }
}

fn finish(
    listing: CleanListing,
    placement: Placement,
    measure: AreaMeasure,
    settings: &EnrichmentSettings,
) -> EnrichedListing {
    let description = Some(listing.description.as_str());
    let property_type = classify::infer_property_type(description);
    let zoning = classify::infer_zoning(description);
    let near_water = classify::mentions_water(description);

    EnrichedListing {
        original_price: pricing::format_price(listing.price),
        price_usd: pricing::price_in_usd(listing.price, settings.usd_rate),
        area_in_sq_meters: measure.area.map(pricing::square_feet_to_meters),
        area_in_hectares: measure.area.map(pricing::square_feet_to_hectares),
        description: listing.description,
        price: listing.price,
        address: listing.address,
        images: listing.images,
        source_url: listing.source_url,
        source: listing.source,
        listed_date: listing.listed_date,
        governorate: placement.governorate,
        coordinates: placement.coordinates,
        original_area: measure.original_area,
        area: measure.area,
        price_per_sq_ft: measure.price_per_sq_ft,
        property_type,
        zoning,
        near_water,
        road_access: true,
        utilities: true,
    }
}
