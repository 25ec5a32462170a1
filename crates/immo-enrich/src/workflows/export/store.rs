use crate::workflows::enrichment::{EnrichedListing, Governorate, PropertyType, Zoning};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Listing as persisted in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    pub description: String,
    pub price: i64,
    pub address: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    pub source: String,
    pub listed_date: NaiveDate,
    pub governorate: Governorate,
    pub location: GeoPoint,
    pub original_area: Option<u32>,
    pub area: Option<u32>,
    pub price_per_sq_ft: Option<f64>,
    pub property_type: PropertyType,
    pub zoning: Zoning,
    pub original_price: String,
    pub price_usd: f64,
    pub area_in_sq_meters: Option<f64>,
    pub area_in_hectares: Option<f64>,
    pub features: PropertyFeatures,
}

impl PropertyDocument {
    pub fn key(&self) -> DocumentKey {
        match self.source_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => DocumentKey::Url(url.to_string()),
            _ => DocumentKey::AddressPrice(self.address.clone(), self.price),
        }
    }
}

impl From<&EnrichedListing> for PropertyDocument {
    fn from(listing: &EnrichedListing) -> Self {
        Self {
            description: listing.description.clone(),
            price: listing.price,
            address: listing.address.clone(),
            images: listing.images.clone(),
            source_url: listing.source_url.clone(),
            source: listing.source.clone(),
            listed_date: listing.listed_date,
            governorate: listing.governorate,
            location: GeoPoint::point(
                listing.coordinates.longitude,
                listing.coordinates.latitude,
            ),
            original_area: listing.original_area,
            area: listing.area,
            price_per_sq_ft: listing.price_per_sq_ft,
            property_type: listing.property_type,
            zoning: listing.zoning,
            original_price: listing.original_price.clone(),
            price_usd: listing.price_usd,
            area_in_sq_meters: listing.area_in_sq_meters,
            area_in_hectares: listing.area_in_hectares,
            features: PropertyFeatures {
                near_water: listing.near_water,
                road_access: listing.road_access,
                utilities: listing.utilities,
            },
        }
    }
}

/// GeoJSON point, `coordinates` ordered `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: GeoKind,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: GeoKind::Point,
            coordinates: [longitude, latitude],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoKind {
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFeatures {
    pub near_water: bool,
    pub road_access: bool,
    pub utilities: bool,
}

/// Natural key used to decide whether a listing is already stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Url(String),
    AddressPrice(String, i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Storage abstraction. Implementations never overwrite an existing document.
pub trait DocumentStore: Send + Sync {
    fn insert_if_absent(&self, document: PropertyDocument) -> Result<UpsertOutcome, StoreError>;
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("corrupt document on line {line} of {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Upserts every listing, keyed by source URL (or address and price).
pub fn persist<S: DocumentStore + ?Sized>(
    store: &S,
    listings: &[EnrichedListing],
) -> Result<PersistSummary, StoreError> {
    let mut summary = PersistSummary::default();
    for listing in listings {
        match store.insert_if_absent(PropertyDocument::from(listing))? {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::AlreadyPresent => {
                debug!(source_url = ?listing.source_url, "listing already stored");
                summary.skipped += 1;
            }
        }
    }
    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "persisted listings"
    );
    Ok(summary)
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<HashMap<DocumentKey, PropertyDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn get(&self, key: &DocumentKey) -> Result<Option<PropertyDocument>, StoreError> {
        let guard = self
            .documents
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert_if_absent(&self, document: PropertyDocument) -> Result<UpsertOutcome, StoreError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        let key = document.key();
        if guard.contains_key(&key) {
            return Ok(UpsertOutcome::AlreadyPresent);
        }
        guard.insert(key, document);
        Ok(UpsertOutcome::Inserted)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let guard = self
            .documents
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        Ok(guard.len())
    }
}

/// Append-only JSON-lines file, one document per line.
#[derive(Debug)]
pub struct JsonLinesDocumentStore {
    path: PathBuf,
    state: Mutex<JsonLinesState>,
}

#[derive(Debug)]
struct JsonLinesState {
    keys: HashSet<DocumentKey>,
    file: File,
}

impl JsonLinesDocumentStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let keys = load_keys(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), existing = keys.len(), "opened document store");

        Ok(Self {
            path,
            state: Mutex::new(JsonLinesState { keys, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonLinesDocumentStore {
    fn insert_if_absent(&self, document: PropertyDocument) -> Result<UpsertOutcome, StoreError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        let key = document.key();
        if guard.keys.contains(&key) {
            return Ok(UpsertOutcome::AlreadyPresent);
        }

        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');
        guard.file.write_all(&line)?;
        guard.file.flush()?;
        guard.keys.insert(key);
        Ok(UpsertOutcome::Inserted)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        Ok(guard.keys.len())
    }
}

/// Reads the keys already stored. A trailing line without its newline is
/// what an interrupted append leaves behind: it is kept when it still decodes
/// and cut off otherwise, so the next append starts on a fresh line.
fn load_keys(path: &Path) -> Result<HashSet<DocumentKey>, StoreError> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(err) => return Err(err.into()),
    };

    let complete_len = contents
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |index| index + 1);
    let (complete, tail) = contents.split_at(complete_len);

    let mut keys = HashSet::new();
    let mut line_count = 0;
    for (index, line) in complete.split(|byte| *byte == b'\n').enumerate() {
        line_count = index + 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let document: PropertyDocument =
            serde_json::from_slice(line).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
        keys.insert(document.key());
    }

    if tail.iter().all(u8::is_ascii_whitespace) {
        return Ok(keys);
    }

    match serde_json::from_slice::<PropertyDocument>(tail) {
        Ok(document) => {
            keys.insert(document.key());
            OpenOptions::new().append(true).open(path)?.write_all(b"\n")?;
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                line = line_count,
                error = %err,
                "dropping partially written document"
            );
            OpenOptions::new()
                .write(true)
                .open(path)?
                .set_len(complete_len as u64)?;
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::enrichment::{EnrichmentPipeline, EnrichmentSettings, RawListing};
    use serde_json::{json, Value};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn listings() -> Vec<EnrichedListing> {
        EnrichmentPipeline::seeded(EnrichmentSettings::default(), 21)
            .run(vec![
                RawListing::new(
                    "Villa pieds dans l'eau, vue mer",
                    1_200_000,
                    "Ariana, proche de la mer",
                    "https://www.tayara.tn/item/7",
                ),
                RawListing::new("Terrain 400 m2", 80_000, "Bizerte", "https://www.tayara.tn/item/8"),
            ])
            .listings
    }

    fn temp_store_path(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "immo_store_{label}_{}_{nanos}.jsonl",
            std::process::id()
        ))
    }

    #[test]
    fn document_nests_location_and_features() {
        let listing = &listings()[0];
        let document = serde_json::to_value(PropertyDocument::from(listing)).expect("serialize");

        assert_eq!(document["location"]["type"], "Point");
        assert_eq!(
            document["location"]["coordinates"],
            json!([listing.coordinates.longitude, listing.coordinates.latitude])
        );
        assert_eq!(
            document["features"],
            json!({ "nearWater": true, "roadAccess": true, "utilities": true })
        );
        assert_eq!(document.get("coordinates"), None);
        assert_eq!(document.get("nearWater"), None);
        assert_eq!(document["governorate"], Value::from("Ariana"));
    }

    #[test]
    fn key_falls_back_to_address_and_price() {
        let mut document = PropertyDocument::from(&listings()[1]);
        assert_eq!(
            document.key(),
            DocumentKey::Url("https://www.tayara.tn/item/8".to_string())
        );

        document.source_url = Some("  ".to_string());
        assert_eq!(
            document.key(),
            DocumentKey::AddressPrice("Bizerte".to_string(), 80_000)
        );
        document.source_url = None;
        assert_eq!(
            document.key(),
            DocumentKey::AddressPrice("Bizerte".to_string(), 80_000)
        );
    }

    #[test]
    fn in_memory_store_never_overwrites() {
        let store = InMemoryDocumentStore::default();
        let listings = listings();
        let first = persist(&store, &listings).expect("first persist");
        assert_eq!(first, PersistSummary { inserted: 2, skipped: 0 });

        let mut changed = listings.clone();
        changed[0].price = 999;
        let second = persist(&store, &changed).expect("second persist");
        assert_eq!(second, PersistSummary { inserted: 0, skipped: 2 });

        let stored = store
            .get(&DocumentKey::Url("https://www.tayara.tn/item/7".to_string()))
            .expect("lookup")
            .expect("document present");
        assert_eq!(stored.price, 1_200_000);
        assert_eq!(store.len().expect("len"), 2);
    }

    #[test]
    fn json_lines_store_remembers_keys_across_reopen() {
        let path = temp_store_path("reopen");
        let listings = listings();

        {
            let store = JsonLinesDocumentStore::open(&path).expect("open store");
            assert!(store.is_empty().expect("empty"));
            let summary = persist(&store, &listings[..1]).expect("persist");
            assert_eq!(summary.inserted, 1);
        }

        let store = JsonLinesDocumentStore::open(&path).expect("reopen store");
        assert_eq!(store.len().expect("len"), 1);
        let summary = persist(&store, &listings).expect("persist again");
        assert_eq!(summary, PersistSummary { inserted: 1, skipped: 1 });

        let contents = std::fs::read_to_string(&path).expect("read store");
        assert_eq!(contents.lines().count(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupt_store_line_is_reported() {
        let path = temp_store_path("corrupt");
        std::fs::write(&path, "{\"not\": \"a document\"}\n").expect("seed file");

        match JsonLinesDocumentStore::open(&path) {
            Err(StoreError::Corrupt { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected corrupt store error, got {other:?}"),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn interrupted_append_is_cut_off_on_open() {
        let path = temp_store_path("partial");
        let listings = listings();
        let mut first =
            serde_json::to_string(&PropertyDocument::from(&listings[0])).expect("serialize");
        first.push('\n');
        std::fs::write(&path, format!("{first}{{\"description\": \"Terr")).expect("seed file");

        let store = JsonLinesDocumentStore::open(&path).expect("partial tail tolerated");
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.len().expect("len"), 1);
        assert_eq!(std::fs::read_to_string(&path).expect("read store"), first);

        let summary = persist(&store, &listings).expect("persist");
        assert_eq!(summary, PersistSummary { inserted: 1, skipped: 1 });
        drop(store);

        let reopened = JsonLinesDocumentStore::open(&path).expect("reopen store");
        assert_eq!(reopened.len().expect("len"), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unterminated_document_is_kept_and_terminated() {
        let path = temp_store_path("unterminated");
        let listings = listings();
        let document =
            serde_json::to_string(&PropertyDocument::from(&listings[0])).expect("serialize");
        std::fs::write(&path, &document).expect("seed file");

        let store = JsonLinesDocumentStore::open(&path).expect("open store");
        assert_eq!(store.len().expect("len"), 1);
        let summary = persist(&store, &listings).expect("persist");
        assert_eq!(summary, PersistSummary { inserted: 1, skipped: 1 });

        let contents = std::fs::read_to_string(&path).expect("read store");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with(&format!("{document}\n")));
        std::fs::remove_file(&path).ok();
    }
}
