use super::ExportError;
use crate::workflows::enrichment::EnrichedListing;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Pretty-printed JSON array; absent optional fields are written as `null`.
pub fn write_json<W: Write>(
    mut writer: W,
    listings: &[EnrichedListing],
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(&mut writer, listings)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(listings.len())
}

pub fn write_json_path<P: AsRef<Path>>(
    path: P,
    listings: &[EnrichedListing],
) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    let written = write_json(file, listings)?;
    info!(path = %path.display(), documents = written, "wrote json export");
    Ok(written)
}
