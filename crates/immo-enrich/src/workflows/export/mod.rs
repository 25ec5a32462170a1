pub mod documents;
pub mod flat_file;
pub mod store;

pub use documents::{write_json, write_json_path};
pub use flat_file::{write_csv, write_csv_path, IMAGE_SEPARATOR};
pub use store::{
    persist, DocumentKey, DocumentStore, GeoPoint, InMemoryDocumentStore, JsonLinesDocumentStore,
    PersistSummary, PropertyDocument, PropertyFeatures, StoreError, UpsertOutcome,
};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unable to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to encode csv row: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to encode json document: {0}")]
    Json(#[from] serde_json::Error),
}
