use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use shutter_cache::{AssetRecord, CacheConfig, PhotoCache};
use shutter_capture::{FileCaptureSource, FileFetcher};
use shutter_meta::FileMetadataStore;
use shutter_store::FsBlobStore;
use shutter_types::StorageKey;
use tracing::debug;

use crate::cli::*;

const CONFIG_FILE: &str = "shutter.toml";
const BLOB_DIR: &str = "data";
const METADATA_FILE: &str = "preferences.json";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.data_dir, cli.config.as_deref())?;
    let data_dir = cli.data_dir.as_path();
    match cli.command {
        Command::Capture(args) => cmd_capture(data_dir, config, args, &cli.format).await,
        Command::List(args) => cmd_list(data_dir, config, args, &cli.format).await,
        Command::Show(args) => cmd_show(data_dir, config, args, &cli.format).await,
        Command::Remove(args) => cmd_remove(data_dir, config, args, &cli.format).await,
        Command::Config(_) => cmd_config(&config, &cli.format),
    }
}

/// Load the configuration from `explicit`, or from `<data-dir>/shutter.toml`
/// when it exists, or fall back to the defaults.
fn load_config(data_dir: &Path, explicit: Option<&Path>) -> anyhow::Result<CacheConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = data_dir.join(CONFIG_FILE);
            if !path.is_file() {
                return Ok(CacheConfig::default());
            }
            path
        }
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let config = CacheConfig::from_toml_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

async fn open_cache(
    data_dir: &Path,
    config: CacheConfig,
    image: Option<&Path>,
) -> anyhow::Result<PhotoCache> {
    let blob_root = data_dir.join(BLOB_DIR);
    let blobs = FsBlobStore::open(&blob_root)
        .await
        .with_context(|| format!("cannot open blob store {}", blob_root.display()))?;
    let meta_path = data_dir.join(METADATA_FILE);
    let meta = FileMetadataStore::open(&meta_path)
        .await
        .with_context(|| format!("cannot open metadata {}", meta_path.display()))?;

    let mut builder = PhotoCache::builder(Arc::new(blobs), Arc::new(meta)).config(config);
    if let Some(image) = image {
        builder = builder.capture_source(Arc::new(FileCaptureSource::new(image)), Arc::new(FileFetcher));
    }
    let cache = builder.build()?;

    let report = cache.restore().await.context("cannot restore photo index")?;
    for key in &report.skipped {
        eprintln!("{} skipped unreadable photo {}", "warning:".yellow().bold(), key);
    }
    Ok(cache)
}

fn record_summary(record: &AssetRecord) -> serde_json::Value {
    json!({
        "storageKey": record.storage_key,
        "capturedAt": record.storage_key.captured_at().map(|t| t.to_rfc3339()),
        "renderable": record.is_renderable(),
    })
}

async fn cmd_capture(
    data_dir: &Path,
    mut config: CacheConfig,
    args: CaptureArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if let Some(quality) = args.quality {
        config.capture.quality = quality;
    }
    let cache = open_cache(data_dir, config, Some(&args.from)).await?;
    let record = cache
        .capture()
        .await
        .with_context(|| format!("cannot capture {}", args.from.display()))?;
    cache.flush().await;

    match format {
        OutputFormat::Json => println!("{}", record_summary(&record)),
        OutputFormat::Text => {
            println!("{} Captured {}", "✓".green().bold(), record.storage_key.to_string().yellow());
            println!("  From: {}", args.from.display());
        }
    }
    Ok(())
}

async fn cmd_list(
    data_dir: &Path,
    config: CacheConfig,
    args: ListArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let cache = open_cache(data_dir, config, None).await?;
    if args.orphans {
        return list_orphans(&cache, format).await;
    }
    let records = cache.records();
    let shown = args.limit.unwrap_or(records.len()).min(records.len());

    match format {
        OutputFormat::Json => {
            let list: Vec<_> = records[..shown].iter().map(record_summary).collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No photos cached.");
                return Ok(());
            }
            for record in &records[..shown] {
                let taken = record
                    .storage_key
                    .captured_at()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "-".into());
                println!("{}  {}", record.storage_key.to_string().yellow(), taken.dimmed());
            }
            if shown < records.len() {
                println!("... {} more", records.len() - shown);
            }
        }
    }
    Ok(())
}

async fn list_orphans(cache: &PhotoCache, format: &OutputFormat) -> anyhow::Result<()> {
    let orphans = cache.orphans().await.context("cannot list blob store")?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&orphans)?),
        OutputFormat::Text if orphans.is_empty() => println!("No orphaned blobs."),
        OutputFormat::Text => {
            for name in &orphans {
                println!("{}", name.red());
            }
        }
    }
    Ok(())
}

async fn cmd_show(
    data_dir: &Path,
    config: CacheConfig,
    args: ShowArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let key = StorageKey::parse(&args.key)?;
    let cache = open_cache(data_dir, config, None).await?;
    let Some(record) = cache.get(&key) else {
        bail!("no photo with key {key}");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => match &record.display_reference {
            Some(reference) => println!("{reference}"),
            None => println!("{} has no display reference", key.to_string().yellow()),
        },
    }
    Ok(())
}

async fn cmd_remove(
    data_dir: &Path,
    config: CacheConfig,
    args: RemoveArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let key = StorageKey::parse(&args.key)?;
    let cache = open_cache(data_dir, config, None).await?;
    let removed = cache.remove_key(&key).await;
    cache.flush().await;

    match format {
        OutputFormat::Json => println!("{}", json!({ "storageKey": key, "removed": removed })),
        OutputFormat::Text if removed => println!("{} Removed {}", "✓".green().bold(), key.to_string().yellow()),
        OutputFormat::Text => println!("No photo with key {}", key.to_string().yellow()),
    }
    Ok(())
}

fn cmd_config(config: &CacheConfig, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}
