use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_SOURCE: &str = "tayara.tn";

/// Unvalidated listing as captured from the classifieds site.
///
/// Every field is decoded leniently: a value of the wrong shape becomes the
/// field's default rather than rejecting the record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_images")]
    pub images: RawImages,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source_url: Option<String>,
    #[serde(default = "default_source", deserialize_with = "lenient_source")]
    pub source: String,
    #[serde(default = "today", deserialize_with = "lenient_date")]
    pub listed_date: NaiveDate,
}

impl RawListing {
    pub fn new(description: &str, price: i64, address: &str, source_url: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            price,
            address: Some(address.to_string()),
            images: RawImages::Missing,
            source_url: Some(source_url.to_string()),
            source: default_source(),
            listed_date: today(),
        }
    }

    pub fn with_images(mut self, images: RawImages) -> Self {
        self.images = images;
        self
    }

    pub fn with_listed_date(mut self, listed_date: NaiveDate) -> Self {
        self.listed_date = listed_date;
        self
    }
}

/// Image attribute exactly as the source delivered it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawImages {
    List(Vec<Value>),
    Joined(String),
    #[default]
    Missing,
}

/// Regional bucket resolved from the free-text address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Governorate {
    Tunis,
    Ariana,
    #[serde(rename = "Ben Arous")]
    BenArous,
    Manouba,
    Nabeul,
    Bizerte,
    Zaghouan,
    Beja,
    Jendouba,
    Kef,
    Siliana,
    Sousse,
    Monastir,
    Mahdia,
    Kairouan,
    Kasserine,
    #[serde(rename = "Sidi Bouzid")]
    SidiBouzid,
    Sfax,
    Gabes,
    Medenine,
    Tataouine,
    Tozeur,
    Kebili,
    Gafsa,
    Unknown,
}

impl Governorate {
    /// Lookup order. An address naming several regions resolves to the
    /// earliest one listed here.
    pub const fn ordered() -> [Self; 24] {
        [
            Self::Tunis,
            Self::Ariana,
            Self::BenArous,
            Self::Manouba,
            Self::Nabeul,
            Self::Bizerte,
            Self::Zaghouan,
            Self::Beja,
            Self::Jendouba,
            Self::Kef,
            Self::Siliana,
            Self::Sousse,
            Self::Monastir,
            Self::Mahdia,
            Self::Kairouan,
            Self::Kasserine,
            Self::SidiBouzid,
            Self::Sfax,
            Self::Gabes,
            Self::Medenine,
            Self::Tataouine,
            Self::Tozeur,
            Self::Kebili,
            Self::Gafsa,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Tunis => "Tunis",
            Self::Ariana => "Ariana",
            Self::BenArous => "Ben Arous",
            Self::Manouba => "Manouba",
            Self::Nabeul => "Nabeul",
            Self::Bizerte => "Bizerte",
            Self::Zaghouan => "Zaghouan",
            Self::Beja => "Beja",
            Self::Jendouba => "Jendouba",
            Self::Kef => "Kef",
            Self::Siliana => "Siliana",
            Self::Sousse => "Sousse",
            Self::Monastir => "Monastir",
            Self::Mahdia => "Mahdia",
            Self::Kairouan => "Kairouan",
            Self::Kasserine => "Kasserine",
            Self::SidiBouzid => "Sidi Bouzid",
            Self::Sfax => "Sfax",
            Self::Gabes => "Gabes",
            Self::Medenine => "Medenine",
            Self::Tataouine => "Tataouine",
            Self::Tozeur => "Tozeur",
            Self::Kebili => "Kebili",
            Self::Gafsa => "Gafsa",
            Self::Unknown => "Unknown",
        }
    }

    /// Approximate centroid (the regional capital) as `(longitude, latitude)`.
    pub const fn centroid(self) -> Option<(f64, f64)> {
        let point = match self {
            Self::Tunis => (10.1815, 36.8065),
            Self::Ariana => (10.1939, 36.8625),
            Self::BenArous => (10.2181, 36.7531),
            Self::Manouba => (10.0972, 36.8081),
            Self::Nabeul => (10.7376, 36.4561),
            Self::Bizerte => (9.8739, 37.2744),
            Self::Zaghouan => (10.1429, 36.4029),
            Self::Beja => (9.1817, 36.7256),
            Self::Jendouba => (8.7802, 36.5011),
            Self::Kef => (8.7049, 36.1742),
            Self::Siliana => (9.3708, 36.0849),
            Self::Sousse => (10.6369, 35.8256),
            Self::Monastir => (10.8113, 35.7643),
            Self::Mahdia => (11.0457, 35.5047),
            Self::Kairouan => (10.0963, 35.6781),
            Self::Kasserine => (8.8365, 35.1676),
            Self::SidiBouzid => (9.4849, 35.0382),
            Self::Sfax => (10.7600, 34.7406),
            Self::Gabes => (10.0982, 33.8815),
            Self::Medenine => (10.5055, 33.3549),
            Self::Tataouine => (10.4518, 32.9297),
            Self::Tozeur => (8.1335, 33.9197),
            Self::Kebili => (8.9690, 33.7044),
            Self::Gafsa => (8.7842, 34.4250),
            Self::Unknown => return None,
        };
        Some(point)
    }
}

/// Longitude/latitude pair, serialized as a two-element `[lon, lat]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.longitude, value.latitude]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    TerrainAgricole,
    TerrainIndustriel,
    TerrainCommercial,
    TerrainConstruction,
    Autre,
}

impl PropertyType {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::TerrainAgricole,
            Self::TerrainIndustriel,
            Self::TerrainCommercial,
            Self::TerrainConstruction,
            Self::Autre,
        ]
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::TerrainAgricole => "terrain_agricole",
            Self::TerrainIndustriel => "terrain_industriel",
            Self::TerrainCommercial => "terrain_commercial",
            Self::TerrainConstruction => "terrain_construction",
            Self::Autre => "autre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zoning {
    Residential,
    Industrial,
    Commercial,
    Agricultural,
    Unknown,
}

impl Zoning {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Residential,
            Self::Industrial,
            Self::Commercial,
            Self::Agricultural,
            Self::Unknown,
        ]
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Industrial => "industrial",
            Self::Commercial => "commercial",
            Self::Agricultural => "agricultural",
            Self::Unknown => "unknown",
        }
    }
}

/// Cleaned, geo-tagged listing handed to the sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedListing {
    pub description: String,
    pub price: i64,
    pub address: String,
    pub images: Vec<String>,
    pub source_url: Option<String>,
    pub source: String,
    pub listed_date: NaiveDate,
    pub governorate: Governorate,
    pub coordinates: Coordinates,
    /// Floor area in square meters as written in the listing.
    pub original_area: Option<u32>,
    /// Floor area in square feet.
    pub area: Option<u32>,
    pub price_per_sq_ft: Option<f64>,
    pub property_type: PropertyType,
    pub zoning: Zoning,
    pub original_price: String,
    pub price_usd: f64,
    pub area_in_sq_meters: Option<f64>,
    pub area_in_hectares: Option<f64>,
    pub near_water: bool,
    pub road_access: bool,
    pub utilities: bool,
}

impl EnrichedListing {
    /// Strips every derived field, yielding the listing as a source would
    /// have delivered it.
    pub fn to_raw(&self) -> RawListing {
        RawListing {
            description: Some(self.description.clone()),
            price: self.price,
            address: Some(self.address.clone()),
            images: RawImages::List(
                self.images
                    .iter()
                    .map(|url| Value::String(url.clone()))
                    .collect(),
            ),
            source_url: self.source_url.clone(),
            source: self.source.clone(),
            listed_date: self.listed_date,
        }
    }
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn lenient_source<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?
        .filter(|source| !source.trim().is_empty())
        .unwrap_or_else(default_source))
}

fn lenient_price<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let price = match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Some(Value::String(text)) => parse_price_text(&text),
        _ => None,
    };
    Ok(price.unwrap_or(0))
}

fn lenient_images<'de, D>(deserializer: D) -> Result<RawImages, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => RawImages::List(items),
        Some(Value::String(joined)) => RawImages::Joined(joined),
        _ => RawImages::Missing,
    })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_text(deserializer)?;
    Ok(value.as_deref().and_then(parse_date).unwrap_or_else(today))
}

/// Reduces display text such as `"120 000 DT"` to its digits.
pub(crate) fn parse_price_text(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}
