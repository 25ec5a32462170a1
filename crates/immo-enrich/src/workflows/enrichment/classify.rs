use super::domain::{PropertyType, Zoning};

/// Refinements applied once a description mentions `"terrain"`, highest
/// priority first.
const TERRAIN_RULES: &[(&str, PropertyType)] = &[
    ("agricole", PropertyType::TerrainAgricole),
    ("industriel", PropertyType::TerrainIndustriel),
    ("commercial", PropertyType::TerrainCommercial),
];

const ZONING_RULES: &[(&[&str], Zoning)] = &[
    (
        &["villa", "appartement", "studio", "immeuble", "résidence"],
        Zoning::Residential,
    ),
    (&["dépôt", "industriel", "usine"], Zoning::Industrial),
    (&["commercial", "magasin"], Zoning::Commercial),
    (&["agricole", "ferme"], Zoning::Agricultural),
];

const WATER_KEYWORDS: &[&str] = &["mer", "lac"];

pub fn infer_property_type(description: Option<&str>) -> PropertyType {
    let Some(text) = description.map(str::to_lowercase) else {
        return PropertyType::Autre;
    };

    if !text.contains("terrain") {
        return PropertyType::Autre;
    }

    TERRAIN_RULES
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, kind)| *kind)
        .unwrap_or(PropertyType::TerrainConstruction)
}

pub fn infer_zoning(description: Option<&str>) -> Zoning {
    let Some(text) = description.map(str::to_lowercase) else {
        return Zoning::Unknown;
    };

    ZONING_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(_, zoning)| *zoning)
        .unwrap_or(Zoning::Unknown)
}

/// Substring match, so `"mer"` also fires inside words such as `"Mercure"`.
pub fn mentions_water(description: Option<&str>) -> bool {
    description
        .map(str::to_lowercase)
        .map(|text| WATER_KEYWORDS.iter().any(|keyword| text.contains(keyword)))
        .unwrap_or(false)
}
