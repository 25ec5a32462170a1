mod parser;

use crate::workflows::enrichment::RawListing;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Anything able to hand the pipeline a finite batch of raw listings.
pub trait ListingSource {
    fn fetch(&mut self) -> Result<Vec<RawListing>, IntakeError>;
}

/// A batch already held in memory, e.g. a test fixture.
impl ListingSource for Vec<RawListing> {
    fn fetch(&mut self) -> Result<Vec<RawListing>, IntakeError> {
        Ok(std::mem::take(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    /// A single JSON array of listing objects.
    Json,
    /// One JSON object per line.
    JsonLines,
    Csv,
}

impl ListingFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" => Some(Self::JsonLines),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Pre-recorded scrape stored on disk.
#[derive(Debug, Clone)]
pub struct FileListingSource {
    path: PathBuf,
    format: ListingFormat,
}

impl FileListingSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IntakeError> {
        let path = path.as_ref().to_path_buf();
        let format = ListingFormat::from_path(&path)
            .ok_or_else(|| IntakeError::UnsupportedFormat(path.clone()))?;
        Ok(Self { path, format })
    }

    pub fn with_format<P: AsRef<Path>>(path: P, format: ListingFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ListingFormat {
        self.format
    }
}

impl ListingSource for FileListingSource {
    fn fetch(&mut self) -> Result<Vec<RawListing>, IntakeError> {
        let file = std::fs::File::open(&self.path)?;
        let listings = read_listings(file, self.format)?;
        info!(
            path = %self.path.display(),
            count = listings.len(),
            "loaded raw listings"
        );
        Ok(listings)
    }
}

pub fn read_listings<R: Read>(
    reader: R,
    format: ListingFormat,
) -> Result<Vec<RawListing>, IntakeError> {
    parser::parse_listings(reader, format)
}

#[derive(Debug)]
pub enum IntakeError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    UnsupportedFormat(PathBuf),
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::Io(err) => write!(f, "failed to read listing export: {}", err),
            IntakeError::Json(err) => write!(f, "invalid listing JSON: {}", err),
            IntakeError::Csv(err) => write!(f, "invalid listing CSV: {}", err),
            IntakeError::UnsupportedFormat(path) => write!(
                f,
                "cannot infer listing format of {} (expected .json, .jsonl, .ndjson or .csv)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Io(err) => Some(err),
            IntakeError::Json(err) => Some(err),
            IntakeError::Csv(err) => Some(err),
            IntakeError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for IntakeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}
