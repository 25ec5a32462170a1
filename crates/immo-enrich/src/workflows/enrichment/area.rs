use regex::Regex;
use std::sync::OnceLock;

pub const SQ_FT_PER_SQ_M: f64 = 10.7639;

/// Integer followed by a surface unit. A bare `" m"` is accepted as a unit,
/// so `"3 ch 20 m de la plage"` reads as 20 m².
static AREA_PATTERN: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct AreaMeasure {
    pub(crate) original_area: Option<u32>,
    pub(crate) area: Option<u32>,
    pub(crate) price_per_sq_ft: Option<f64>,
}

impl AreaMeasure {
    pub(crate) fn rate_within(&self, min: f64, max: f64) -> bool {
        self.price_per_sq_ft
            .map(|rate| (min..=max).contains(&rate))
            .unwrap_or(true)
    }
}

pub(crate) fn measure(description: &str, price: i64) -> AreaMeasure {
    let original_area = extract_area_m2(description);
    let area = original_area.map(square_meters_to_feet);
    let price_per_sq_ft = area
        .filter(|sq_ft| *sq_ft > 0)
        .map(|sq_ft| round_to(price as f64 / f64::from(sq_ft), 2));

    AreaMeasure {
        original_area,
        area,
        price_per_sq_ft,
    }
}

pub fn extract_area_m2(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();
    area_pattern()
        .captures(&lowered)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Exact halves round to even, so 15000 m² (161458.5 sq ft) gives 161458.
pub fn square_meters_to_feet(square_meters: u32) -> u32 {
    (f64::from(square_meters) * SQ_FT_PER_SQ_M).round_ties_even() as u32
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn area_pattern() -> &'static Regex {
    AREA_PATTERN.get_or_init(|| {
        Regex::new(r"([0-9]{1,5})\s*(m²|m2| m)").expect("area pattern compiles")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_area_chain_from_description() {
        let measure = measure("Terrain agricole 500 m2 pas cher", 20_000);
        assert_eq!(measure.original_area, Some(500));
        assert_eq!(measure.area, Some(5382));
        assert_eq!(measure.price_per_sq_ft, Some(3.72));
    }

    #[test]
    fn half_square_feet_round_to_even() {
        assert_eq!(square_meters_to_feet(15_000), 161_458);
        assert_eq!(square_meters_to_feet(35_000), 376_736);
        assert_eq!(square_meters_to_feet(25_000), 269_098);
        assert_eq!(square_meters_to_feet(500), 5382);
    }

    #[test]
    fn recognizes_each_unit_marker() {
        assert_eq!(extract_area_m2("Appartement 120m² haut standing"), Some(120));
        assert_eq!(extract_area_m2("Villa 350 M2"), Some(350));
        assert_eq!(extract_area_m2("Lot de 1200 m au bord"), Some(1200));
        assert_eq!(extract_area_m2("Duplex 7 m²"), Some(7));
        assert_eq!(extract_area_m2("Studio meublé"), None);
        assert_eq!(extract_area_m2("S+2 au 3ème étage"), None);
    }

    #[test]
    fn first_marker_in_text_wins() {
        assert_eq!(
            extract_area_m2("Maison 180 m2 sur terrain 400 m2"),
            Some(180)
        );
    }

    #[test]
    fn bare_m_marker_is_a_known_false_positive() {
        // "500 mètres de la plage" is a distance, not a surface.
        assert_eq!(
            extract_area_m2("Villa à 500 mètres de la plage"),
            Some(500)
        );
    }

    #[test]
    fn long_digit_runs_keep_only_trailing_five() {
        assert_eq!(extract_area_m2("Réf 1234567 m2"), Some(34567));
    }

    #[test]
    fn missing_area_leaves_chain_absent() {
        let measure = measure("Studio à Sousse", 90_000);
        assert_eq!(measure, AreaMeasure::default());
        assert!(measure.rate_within(1.0, 5000.0));
    }

    #[test]
    fn zero_area_has_no_rate() {
        let measure = measure("Parking 0 m2", 5_000);
        assert_eq!(measure.original_area, Some(0));
        assert_eq!(measure.area, Some(0));
        assert_eq!(measure.price_per_sq_ft, None);
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        // 10 m² -> 108 sq ft.
        assert_eq!(measure("Local 10 m2", 540_000).price_per_sq_ft, Some(5000.0));
        assert!(measure("Local 10 m2", 540_000).rate_within(1.0, 5000.0));

        assert_eq!(measure("Local 10 m2", 540_001).price_per_sq_ft, Some(5000.01));
        assert!(!measure("Local 10 m2", 540_001).rate_within(1.0, 5000.0));

        // 1 m² -> 11 sq ft.
        assert_eq!(measure("Case 1 m2", 11).price_per_sq_ft, Some(1.0));
        assert!(measure("Case 1 m2", 11).rate_within(1.0, 5000.0));
        assert!(!measure("Local 10 m2", 107).rate_within(1.0, 5000.0));
    }
}
