use super::area::round_to;

/// Narrow no-break space, the French thousands separator.
pub const THOUSANDS_SEPARATOR: char = '\u{202f}';
pub const CURRENCY_SUFFIX: &str = "DT";
pub const SQ_M_PER_SQ_FT: f64 = 0.092903;
pub const SQ_FT_PER_HECTARE: f64 = 107_639.0;

pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if price < 0 {
        grouped.push('-');
    }

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(digit);
    }

    format!("{grouped} {CURRENCY_SUFFIX}")
}

pub fn price_in_usd(price: i64, usd_rate: f64) -> f64 {
    round_to(price as f64 * usd_rate, 2)
}

pub fn square_feet_to_meters(square_feet: u32) -> f64 {
    round_to(f64::from(square_feet) * SQ_M_PER_SQ_FT, 2)
}

pub fn square_feet_to_hectares(square_feet: u32) -> f64 {
    round_to(f64::from(square_feet) / SQ_FT_PER_HECTARE, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_narrow_space() {
        assert_eq!(format_price(20_000), "20\u{202f}000 DT");
        assert_eq!(format_price(1_250_000), "1\u{202f}250\u{202f}000 DT");
        assert_eq!(format_price(950), "950 DT");
        assert_eq!(format_price(11), "11 DT");
        assert_eq!(format_price(-4_500), "-4\u{202f}500 DT");
    }

    #[test]
    fn converts_dinars_to_dollars() {
        assert_eq!(price_in_usd(20_000, 0.32), 6400.0);
        assert_eq!(price_in_usd(333, 0.32), 106.56);
    }

    #[test]
    fn converts_square_feet_back_to_metric() {
        assert_eq!(square_feet_to_meters(5382), 500.0);
        assert_eq!(square_feet_to_hectares(5382), 0.05);
        assert_eq!(square_feet_to_hectares(107_639), 1.0);
    }
}
