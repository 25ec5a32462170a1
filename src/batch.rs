use clap::Args;
use immo_enrich::config::{parse_usd_rate, AppConfig, OutputConfig};
use immo_enrich::error::AppError;
use immo_enrich::telemetry;
use immo_enrich::workflows::enrichment::{
    EnrichedListing, EnrichmentOutcome, EnrichmentPipeline, EnrichmentReport, EnrichmentSettings,
    EnrichmentSummary,
};
use immo_enrich::workflows::export::{
    persist, write_csv_path, write_json_path, ExportError, JsonLinesDocumentStore, PersistSummary,
};
use immo_enrich::workflows::intake::{FileListingSource, ListingSource};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct EnrichArgs {
    /// Raw listings file (.json array, .jsonl/.ndjson or .csv)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Write the flat-file export here
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Write the JSON document export here
    #[arg(long)]
    pub(crate) json: Option<PathBuf>,
    /// Append new listings to this JSON-lines document store
    #[arg(long)]
    pub(crate) store: Option<PathBuf>,
    /// Seed for coordinate jitter (overrides APP_JITTER_SEED)
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Dinar to dollar conversion rate (overrides APP_USD_RATE)
    #[arg(long, value_parser = parse_usd_rate_arg)]
    pub(crate) usd_rate: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
    /// Raw listings file (.json array, .jsonl/.ndjson or .csv)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Seed for coordinate jitter (overrides APP_JITTER_SEED)
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Dinar to dollar conversion rate (overrides APP_USD_RATE)
    #[arg(long, value_parser = parse_usd_rate_arg)]
    pub(crate) usd_rate: Option<f64>,
}

fn parse_usd_rate_arg(raw: &str) -> Result<f64, String> {
    parse_usd_rate(raw).map_err(|_| format!("'{raw}' is not a positive conversion rate"))
}

pub(crate) fn run_enrich(args: EnrichArgs) -> Result<(), AppError> {
    let EnrichArgs {
        input,
        csv,
        json,
        store,
        seed,
        usd_rate,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let settings = resolve_settings(&config, usd_rate);
    let seed = seed.or(config.enrichment.jitter_seed);
    let mut source = FileListingSource::from_path(&input)?;
    let outcome = enrich_from(&mut source, settings, seed)?;

    if outcome.is_empty() {
        info!(
            input = %source.path().display(),
            received = outcome.report.received,
            dropped = outcome.report.dropped(),
            "nothing to export"
        );
        println!("No listings to enrich");
        return Ok(());
    }

    let targets = OutputTargets::resolve(csv, json, store, &config.output);
    let exports = write_outputs(&outcome.listings, &targets)?;
    render_report(&outcome.report, &exports);
    Ok(())
}

pub(crate) fn run_inspect(args: InspectArgs) -> Result<(), AppError> {
    let InspectArgs {
        input,
        seed,
        usd_rate,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let settings = resolve_settings(&config, usd_rate);
    let seed = seed.or(config.enrichment.jitter_seed);
    let mut source = FileListingSource::from_path(&input)?;
    let outcome = enrich_from(&mut source, settings.clone(), seed)?;

    let view = InspectView {
        input: input.display().to_string(),
        settings: &settings,
        report: outcome.report.summary(),
    };
    let body = serde_json::to_string_pretty(&view).map_err(ExportError::from)?;
    println!("{body}");
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectView<'a> {
    input: String,
    settings: &'a EnrichmentSettings,
    report: EnrichmentSummary,
}

fn resolve_settings(config: &AppConfig, usd_rate: Option<f64>) -> EnrichmentSettings {
    let mut settings = config.enrichment.settings();
    if let Some(rate) = usd_rate {
        settings.usd_rate = rate;
    }
    settings
}

pub(crate) fn enrich_from<S: ListingSource>(
    source: &mut S,
    settings: EnrichmentSettings,
    seed: Option<u64>,
) -> Result<EnrichmentOutcome, AppError> {
    let raw = source.fetch()?;
    let mut pipeline = match seed {
        Some(seed) => EnrichmentPipeline::seeded(settings, seed),
        None => EnrichmentPipeline::from_entropy(settings),
    };
    Ok(pipeline.run(raw))
}

/// Where a run writes its results. Without any explicit target the flat
/// file lands in the configured output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutputTargets {
    pub(crate) csv: Option<PathBuf>,
    pub(crate) json: Option<PathBuf>,
    pub(crate) store: Option<PathBuf>,
}

impl OutputTargets {
    pub(crate) fn resolve(
        csv: Option<PathBuf>,
        json: Option<PathBuf>,
        store: Option<PathBuf>,
        output: &OutputConfig,
    ) -> Self {
        if csv.is_none() && json.is_none() && store.is_none() {
            return Self {
                csv: Some(output.default_csv_path()),
                json: None,
                store: None,
            };
        }
        Self { csv, json, store }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ExportSummary {
    pub(crate) csv: Option<(PathBuf, usize)>,
    pub(crate) json: Option<(PathBuf, usize)>,
    pub(crate) store: Option<(PathBuf, PersistSummary)>,
}

pub(crate) fn write_outputs(
    listings: &[EnrichedListing],
    targets: &OutputTargets,
) -> Result<ExportSummary, AppError> {
    let mut summary = ExportSummary::default();

    if let Some(path) = &targets.csv {
        let rows = write_csv_path(path, listings)?;
        summary.csv = Some((path.clone(), rows));
    }

    if let Some(path) = &targets.json {
        let documents = write_json_path(path, listings)?;
        summary.json = Some((path.clone(), documents));
    }

    if let Some(path) = &targets.store {
        let store = JsonLinesDocumentStore::open(path)?;
        let persisted = persist(&store, listings)?;
        summary.store = Some((store.path().to_path_buf(), persisted));
    }

    Ok(summary)
}

fn render_report(report: &EnrichmentReport, exports: &ExportSummary) {
    println!("Enhanced data saved with {} entries.", report.retained);

    let summary = report.summary();
    println!(
        "Received {} listings, dropped {} (duplicates {}, price at or below floor {}, \
         missing fields {}, price per sq ft out of range {})",
        summary.received,
        report.dropped(),
        summary.duplicates,
        summary.below_price_floor,
        summary.missing_fields,
        summary.rate_out_of_range
    );

    println!("\nBy governorate");
    for entry in &summary.by_governorate {
        println!("- {}: {}", entry.label, entry.count);
    }

    println!("\nBy property type");
    for entry in &summary.by_property_type {
        println!("- {}: {}", entry.label, entry.count);
    }

    println!("\nBy zoning");
    for entry in &summary.by_zoning {
        println!("- {}: {}", entry.label, entry.count);
    }

    println!("\nOutputs");
    if let Some((path, rows)) = &exports.csv {
        println!("- CSV {} ({} rows)", display(path), rows);
    }
    if let Some((path, documents)) = &exports.json {
        println!("- JSON {} ({} documents)", display(path), documents);
    }
    if let Some((path, persisted)) = &exports.store {
        println!(
            "- Store {} ({} inserted, {} already present)",
            display(path),
            persisted.inserted,
            persisted.skipped
        );
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use immo_enrich::config::{AppEnvironment, EnrichmentConfig, TelemetryConfig};
    use immo_enrich::workflows::enrichment::RawListing;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "immo-batch-{label}-{}-{nanos}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("scratch dir created");
        dir
    }

    fn sample_batch() -> Vec<RawListing> {
        vec![
            RawListing::new(
                "Terrain agricole 500 m2 pas cher",
                20_000,
                "Zaghouan",
                "https://www.tayara.tn/item/1",
            ),
            RawListing::new(
                "Villa vue sur mer",
                1_250_000,
                "Ariana, proche de la mer",
                "https://www.tayara.tn/item/2",
            ),
            RawListing::new("Garage", 3, "Tunis", "https://www.tayara.tn/item/3"),
        ]
    }

    #[test]
    fn default_target_is_csv_in_output_directory() {
        let output = OutputConfig {
            directory: PathBuf::from("/srv/exports"),
        };
        let targets = OutputTargets::resolve(None, None, None, &output);
        assert_eq!(
            targets.csv,
            Some(PathBuf::from("/srv/exports/properties_enhanced.csv"))
        );
        assert!(targets.json.is_none() && targets.store.is_none());

        let explicit =
            OutputTargets::resolve(None, Some(PathBuf::from("out.json")), None, &output);
        assert!(explicit.csv.is_none());
        assert_eq!(explicit.json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn cli_rate_overrides_configured_rate() {
        let config = AppConfig {
            environment: AppEnvironment::Test,
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            enrichment: EnrichmentConfig {
                usd_rate: 0.32,
                jitter_seed: None,
            },
            output: OutputConfig {
                directory: PathBuf::from("."),
            },
        };
        assert_eq!(resolve_settings(&config, None).usd_rate, 0.32);
        assert_eq!(resolve_settings(&config, Some(0.5)).usd_rate, 0.5);
    }

    #[test]
    fn writes_every_requested_output() {
        let dir = scratch_dir("outputs");
        let mut source = sample_batch();
        let outcome = enrich_from(&mut source, EnrichmentSettings::default(), Some(3))
            .expect("batch enriches");
        assert_eq!(outcome.report.retained, 2);

        let targets = OutputTargets {
            csv: Some(dir.join("properties_enhanced.csv")),
            json: Some(dir.join("properties_enhanced.json")),
            store: Some(dir.join("properties.jsonl")),
        };
        let exports = write_outputs(&outcome.listings, &targets).expect("outputs written");
        assert_eq!(exports.csv.as_ref().map(|(_, rows)| *rows), Some(2));
        assert_eq!(exports.json.as_ref().map(|(_, documents)| *documents), Some(2));
        assert_eq!(
            exports.store.as_ref().map(|(_, persisted)| persisted.inserted),
            Some(2)
        );

        let rerun = write_outputs(&outcome.listings, &targets).expect("outputs rewritten");
        let persisted = rerun.store.map(|(_, persisted)| persisted).expect("store summary");
        assert_eq!(persisted.inserted, 0);
        assert_eq!(persisted.skipped, 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_source_produces_empty_outcome() {
        let mut source: Vec<RawListing> = Vec::new();
        let outcome = enrich_from(&mut source, EnrichmentSettings::default(), None)
            .expect("empty batch is not an error");
        assert!(outcome.is_empty());
        assert_eq!(outcome.report.received, 0);
    }
}
