use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use url::Url;

use product_parser::{
    ExtractError, ExtractorConfig, MarkupSnapshot, PageFetcher, ProductExtractor, Result,
    SnapshotProvider, StaticSnapshotProvider,
};

#[derive(Parser)]
#[command(name = "product-parser", about = "Extract a structured product record from a product page")]
struct Cli {
    /// Saved page HTML, or a product page URL
    source: String,
    /// Page HTML captured after the bank offers panel was opened
    #[arg(long)]
    panel: Option<PathBuf>,
    /// JSON file overriding selectors, tables and timeouts
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL for resolving relative image links in saved HTML
    #[arg(long)]
    base_url: Option<Url>,
    /// Write the record here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Deadline for all field extractors, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

/// Initialize tracing according to RUST_LOG and PRODUCT_PARSER_LOG_FORMAT.
/// Logs always go to stderr; stdout carries only the record.
fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let builder = tracing_subscriber::registry().with(filter);

    match std::env::var("PRODUCT_PARSER_LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = builder.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            let _ = builder.with(fmt_layer.compact()).try_init();
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "extraction failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ExtractorConfig::from_path(path)?,
        None => ExtractorConfig::default(),
    };
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }

    let snapshot = load_page(&cli, &config)?;
    let extractor = ProductExtractor::new(config)?;

    let provider: Option<Arc<dyn SnapshotProvider>> = match &cli.panel {
        Some(path) => {
            let mut provider = StaticSnapshotProvider::new(snapshot.markup())
                .with_revealed(std::fs::read_to_string(path)?);
            if let Some(base) = snapshot.base_url() {
                provider = provider.with_base_url(base.clone());
            }
            Some(Arc::new(provider) as Arc<dyn SnapshotProvider>)
        }
        None => None,
    };

    let record = extractor.extract(&snapshot, provider);

    match &cli.out {
        Some(path) => {
            record.save_json(path)?;
            info!(path = %path.display(), "record saved");
        }
        None => println!("{}", record.to_json_pretty()?),
    }
    Ok(())
}

fn load_page(cli: &Cli, config: &ExtractorConfig) -> Result<MarkupSnapshot> {
    if cli.source.starts_with("http://") || cli.source.starts_with("https://") {
        return PageFetcher::new(&config.fetch)?.fetch(&cli.source);
    }

    let markup = std::fs::read_to_string(&cli.source)
        .map_err(|e| ExtractError::unavailable(format!("cannot read {}: {e}", cli.source)))?;
    let snapshot = MarkupSnapshot::new(markup)?;
    Ok(match &cli.base_url {
        Some(base) => snapshot.with_base_url(base.clone()),
        None => snapshot,
    })
}
