use super::domain::{EnrichedListing, Governorate, PropertyType, Zoning};
use serde::Serialize;
use std::collections::HashMap;

/// Counters collected over one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct EnrichmentReport {
    pub received: usize,
    pub duplicates: usize,
    pub below_price_floor: usize,
    pub missing_fields: usize,
    pub rate_out_of_range: usize,
    pub retained: usize,
    pub by_governorate: HashMap<Governorate, usize>,
    pub by_property_type: HashMap<PropertyType, usize>,
    pub by_zoning: HashMap<Zoning, usize>,
}

impl EnrichmentReport {
    pub fn dropped(&self) -> usize {
        self.received - self.retained
    }

    pub(crate) fn tally(&mut self, listings: &[EnrichedListing]) {
        self.retained = listings.len();
        for listing in listings {
            *self.by_governorate.entry(listing.governorate).or_default() += 1;
            *self.by_property_type.entry(listing.property_type).or_default() += 1;
            *self.by_zoning.entry(listing.zoning).or_default() += 1;
        }
    }

    pub fn summary(&self) -> EnrichmentSummary {
        let by_governorate = Governorate::ordered()
            .into_iter()
            .chain([Governorate::Unknown])
            .filter_map(|governorate| {
                self.by_governorate
                    .get(&governorate)
                    .map(|count| TallyEntry {
                        label: governorate.label(),
                        count: *count,
                    })
            })
            .collect();

        let by_property_type = PropertyType::ordered()
            .into_iter()
            .filter_map(|kind| {
                self.by_property_type.get(&kind).map(|count| TallyEntry {
                    label: kind.tag(),
                    count: *count,
                })
            })
            .collect();

        let by_zoning = Zoning::ordered()
            .into_iter()
            .filter_map(|zoning| {
                self.by_zoning.get(&zoning).map(|count| TallyEntry {
                    label: zoning.tag(),
                    count: *count,
                })
            })
            .collect();

        EnrichmentSummary {
            received: self.received,
            duplicates: self.duplicates,
            below_price_floor: self.below_price_floor,
            missing_fields: self.missing_fields,
            rate_out_of_range: self.rate_out_of_range,
            retained: self.retained,
            by_governorate,
            by_property_type,
            by_zoning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSummary {
    pub received: usize,
    pub duplicates: usize,
    pub below_price_floor: usize,
    pub missing_fields: usize,
    pub rate_out_of_range: usize,
    pub retained: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_governorate: Vec<TallyEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_property_type: Vec<TallyEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_zoning: Vec<TallyEntry>,
}
