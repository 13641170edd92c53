// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! Ferro Locus command line
//!
//! Runs the viewer core from a terminal:
//! - validate a coordinate range
//! - score a single-nucleotide substitution
//! - view a gene: details, first sequence window and ClinVar variants

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::util::SubscriberInitExt;

use ferro_locus::analysis::{
    scorer_from_config, AnalysisState, VariantAnalysisRequest, VariantScorer,
};
use ferro_locus::clinvar::ClinvarView;
use ferro_locus::genome::HttpGenomeProvider;
use ferro_locus::{validate_range, GeneBounds, ViewerConfig, ViewerOrchestrator};

#[derive(Parser)]
#[command(name = "ferro-locus")]
#[command(about = "Gene locus viewer: ranges, sequence windows, ClinVar and SNV scoring")]
#[command(version)]
struct Cli {
    /// Configuration file (default: .ferro-locus.toml, then ~/.config/ferro-locus/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a coordinate range
    Range {
        /// Start coordinate (commas allowed)
        #[arg(long, allow_hyphen_values = true)]
        start: String,

        /// End coordinate (commas allowed)
        #[arg(long, allow_hyphen_values = true)]
        end: String,

        /// Lower gene bound
        #[arg(long, requires = "max")]
        min: Option<u64>,

        /// Upper gene bound
        #[arg(long, requires = "min")]
        max: Option<u64>,

        /// Override the maximum window span
        #[arg(long)]
        max_span: Option<u64>,
    },

    /// Score a single-nucleotide substitution
    Score {
        /// Genomic position (commas allowed)
        #[arg(long)]
        position: String,

        /// Reference base
        #[arg(long)]
        reference: String,

        /// Alternate base
        #[arg(long)]
        alternate: String,
    },

    /// Look up a gene and show its first sequence window and ClinVar variants
    View {
        /// Gene symbol (e.g., BRCA1)
        symbol: String,

        /// Genome assembly
        #[arg(long)]
        assembly: Option<String>,

        /// Window start (commas allowed)
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Window end (commas allowed)
        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Generate a sample configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = ".ferro-locus.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Range {
            start,
            end,
            min,
            max,
            max_span,
        } => {
            let config = load_config(cli.config.as_deref())?;
            range_command(&config, &start, &end, min.zip(max), max_span, cli.format)
        }
        Commands::Score {
            position,
            reference,
            alternate,
        } => {
            let config = load_config(cli.config.as_deref())?;
            score_command(&config, &position, &reference, &alternate, cli.format).await
        }
        Commands::View {
            symbol,
            assembly,
            start,
            end,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let range = start.zip(end);
            view_command(&config, &symbol, assembly, range, cli.format).await
        }
        Commands::Config { output, force } => config_command(output, force),
    }
}

fn range_command(
    config: &ViewerConfig,
    start: &str,
    end: &str,
    bounds: Option<(u64, u64)>,
    max_span: Option<u64>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let bounds = bounds.map(|(min, max)| GeneBounds::new(min, max));
    let max_span = max_span.unwrap_or(config.viewer.max_view_span);

    match validate_range(start, end, bounds.as_ref(), max_span) {
        Ok(range) => {
            match format {
                OutputFormat::Text => println!("OK {} ({} bp)", range, range.span()),
                OutputFormat::Json => print_json(&range)?,
            }
            Ok(())
        }
        Err(e) => {
            match format {
                OutputFormat::Text => println!("[{}] {}", e.code(), e),
                OutputFormat::Json => print_json(&e)?,
            }
            std::process::exit(1);
        }
    }
}

async fn score_command(
    config: &ViewerConfig,
    position: &str,
    reference: &str,
    alternate: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let scorer = scorer_from_config(&config.scorer)?;
    info!("Scoring with the {} scorer", scorer.name());

    let mut request = VariantAnalysisRequest::new();
    request.set_position(position);
    request.set_reference(reference);
    request.set_alternate(alternate);

    match request.run(scorer.as_ref()).await {
        AnalysisState::Succeeded { query, result } => {
            match format {
                OutputFormat::Text => println!(
                    "{}:{}>{}  {}  score={:.3}  log_odds={:.3}",
                    query.position,
                    query.reference,
                    query.alternate,
                    result.classification.as_str(),
                    result.score,
                    result.log_odds
                ),
                OutputFormat::Json => print_json(result)?,
            }
            Ok(())
        }
        AnalysisState::Failed(e) => {
            match format {
                OutputFormat::Text => println!("[{}] {}", e.code(), e),
                OutputFormat::Json => print_json(e)?,
            }
            std::process::exit(1);
        }
        other => Err(format!("analysis ended in unexpected state {:?}", other).into()),
    }
}

#[derive(Serialize)]
struct ViewReport<'a> {
    symbol: &'a str,
    chromosome: Option<&'a str>,
    bounds: Option<GeneBounds>,
    range: Option<String>,
    bases: Option<&'a str>,
    sequence_error: Option<&'a str>,
    clinvar: Option<&'a [ferro_locus::ClinvarVariant]>,
    clinvar_error: Option<&'a str>,
}

async fn view_command(
    config: &ViewerConfig,
    symbol: &str,
    assembly: Option<String>,
    range: Option<(String, String)>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = Arc::new(HttpGenomeProvider::new(config)?);
    let scorer: Arc<dyn VariantScorer> = Arc::from(scorer_from_config(&config.scorer)?);
    let mut viewer = ViewerOrchestrator::new(provider, scorer, config);

    if let Some(assembly) = assembly {
        viewer.change_assembly(&assembly).await?;
    }

    viewer.search(symbol).await;
    if let Some(e) = viewer.error() {
        error!("{}", e);
        std::process::exit(1);
    }
    let Some(gene) = viewer
        .search_results()
        .iter()
        .find(|g| g.symbol.eq_ignore_ascii_case(symbol))
        .or_else(|| viewer.search_results().first())
        .cloned()
    else {
        println!("No genes found for '{}'", symbol);
        std::process::exit(1);
    };

    viewer.select_gene(gene).await?;
    if let Some((start, end)) = range {
        viewer.update_range(&start, &end).await?;
    }

    let Some(session) = viewer.session() else {
        return Err("gene session was closed".into());
    };
    let clinvar_error = match session.clinvar().view() {
        ClinvarView::Failed(msg) => Some(msg),
        _ => None,
    };
    let report = ViewReport {
        symbol: &session.gene().symbol,
        chromosome: session.locus().map(|l| l.chromosome.as_str()),
        bounds: session.bounds().copied(),
        range: session.range().map(|r| r.to_string()),
        bases: session.window().map(|w| w.bases()),
        sequence_error: session.sequence_error(),
        clinvar: Some(session.clinvar().variants()),
        clinvar_error,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("{} ({})", report.symbol, session.gene().name);
            if let Some(e) = session.error() {
                println!("  error: {}", e);
            }
            if let (Some(chrom), Some(bounds)) = (report.chromosome, report.bounds) {
                println!("  gene:   {}:{}", chrom, bounds);
            }
            if let Some(range) = &report.range {
                println!("  window: {}", range);
            }
            if let Some(bases) = report.bases {
                for line in bases.as_bytes().chunks(80) {
                    println!("    {}", String::from_utf8_lossy(line));
                }
            }
            if let Some(e) = report.sequence_error {
                println!("  sequence error: {}", e);
            }
            if let Some(e) = report.clinvar_error {
                println!("  ClinVar error: {}", e);
            }
            for variant in session.clinvar().variants() {
                println!(
                    "  {:>10}  {:<12}  {:<28}  {}",
                    variant.clinvar_id,
                    variant.location,
                    variant.classification.as_str(),
                    variant.title
                );
            }
        }
    }
    Ok(())
}

fn config_command(output_path: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output_path.exists() && !force {
        error!(
            "Configuration file already exists: {}",
            output_path.display()
        );
        error!("Use --force to overwrite");
        std::process::exit(1);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    ViewerConfig::default().to_file(&output_path)?;

    println!(
        "Sample configuration file created: {}",
        output_path.display()
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Ok(ViewerConfig::from_file(path)?)
        }
        None => Ok(ViewerConfig::load()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
