use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commerce_core::pipeline::read_source;
use commerce_core::util::derive_title;
use commerce_core::{
    Catalog, CommercePipeline, MarkdownCompressor, PipelineOptions, ProductRecord, SkipPolicy,
    SourceKind,
};
use commerce_parsers::CatalogParser;

#[derive(Parser)]
#[command(
    name = "commerce",
    version,
    about = "Compress product catalogs into commerce.txt Markdown"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a source snapshot into the commerce.txt artifact
    Generate {
        /// Path to the saved source (JSON, HTML snapshot or JS bundle)
        #[arg(
            short,
            long,
            env = "COMMERCE_SOURCE",
            default_value = "data/jcrew_mens_sweaters.html"
        )]
        source: PathBuf,

        /// Destination Markdown file
        #[arg(
            short,
            long,
            env = "COMMERCE_OUTPUT",
            default_value = "data/commerce_jcrew.txt"
        )]
        output: PathBuf,

        /// Heading used for the generated Markdown (derived from the source file name if omitted)
        #[arg(short, long, env = "COMMERCE_TITLE")]
        title: Option<String>,

        /// Keep at most this many products
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Source kind (inferred from the file extension if omitted)
        #[arg(short, long)]
        kind: Option<SourceKind>,

        /// What to do with products that fail validation: skip or abort
        #[arg(long, env = "COMMERCE_SKIP_POLICY", default_value_t = SkipPolicy::Skip)]
        skip_policy: SkipPolicy,

        /// Truncate descriptions longer than this many characters
        #[arg(long, default_value_t = 280)]
        max_description_chars: usize,
    },

    /// Print the validated products of a source without rendering
    Parse {
        /// Path to the saved source
        #[arg(short, long, env = "COMMERCE_SOURCE")]
        source: PathBuf,

        /// Source kind (inferred from the file extension if omitted)
        #[arg(short, long)]
        kind: Option<SourceKind>,

        /// Keep at most this many products
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("commerce=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            source,
            output,
            title,
            limit,
            kind,
            skip_policy,
            max_description_chars,
        } => {
            let kind = resolve_kind(kind, &source)?;
            let options = PipelineOptions {
                skip_policy,
                limit: limit.map(|n| n as usize),
            };
            let compressor =
                MarkdownCompressor::new().with_max_description_chars(max_description_chars);
            let title = title.unwrap_or_else(|| derive_title(&source));
            cmd_generate(&source, &output, &title, kind, options, compressor)?;
        }
        Commands::Parse {
            source,
            kind,
            limit,
            format,
        } => {
            let kind = resolve_kind(kind, &source)?;
            let options = PipelineOptions {
                skip_policy: SkipPolicy::Skip,
                limit: limit.map(|n| n as usize),
            };
            cmd_parse(&source, kind, options, format)?;
        }
    }

    Ok(())
}

/// An explicit `--kind` wins; otherwise the extension decides.
fn resolve_kind(explicit: Option<SourceKind>, source: &Path) -> Result<SourceKind> {
    match explicit.or_else(|| SourceKind::from_path(source)) {
        Some(kind) => Ok(kind),
        None => anyhow::bail!(
            "Cannot infer source kind from {}; pass --kind generic-json|html-snapshot|bundled-script",
            source.display()
        ),
    }
}

fn cmd_generate(
    source: &Path,
    output: &Path,
    title: &str,
    kind: SourceKind,
    options: PipelineOptions,
    compressor: MarkdownCompressor,
) -> Result<()> {
    let text = read_source(source)
        .with_context(|| format!("Failed to read source file: {}", source.display()))?;

    let pipeline = CommercePipeline::new(CatalogParser::for_kind(kind))
        .with_compressor(compressor)
        .with_options(options);

    let rendered = pipeline
        .write_markdown(&text, output, Some(title))
        .with_context(|| format!("Failed to generate {}", output.display()))?;

    tracing::info!(
        extracted = rendered.catalog.extracted_count(),
        skipped = rendered.catalog.skipped_count(),
        content_hash = %&rendered.content_hash[..8],
        "Generation complete"
    );

    println!(
        "Wrote {} with {} lines.",
        output.display(),
        rendered.markdown.lines().count()
    );

    Ok(())
}

fn cmd_parse(
    source: &Path,
    kind: SourceKind,
    options: PipelineOptions,
    format: OutputFormat,
) -> Result<()> {
    let text = read_source(source)
        .with_context(|| format!("Failed to read source file: {}", source.display()))?;

    let catalog = CommercePipeline::new(CatalogParser::for_kind(kind))
        .with_options(options)
        .parse(&text)
        .with_context(|| format!("Failed to parse {}", source.display()))?;

    log_skipped(&catalog);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &catalog.records)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(&mut out, &catalog.records)?,
    }

    Ok(())
}

fn log_skipped(catalog: &Catalog) {
    for item in &catalog.skipped {
        tracing::info!(index = item.index, "Skipped: {}", item.reason);
    }
    tracing::info!(
        extracted = catalog.extracted_count(),
        skipped = catalog.skipped_count(),
        "Parse complete"
    );
}

const CSV_HEADER: [&str; 8] = [
    "name",
    "price",
    "currency",
    "url",
    "availability",
    "tags",
    "description",
    "metadata",
];

/// One row per record; tags joined by `|`, metadata as `k=v` pairs joined by `;`.
fn write_csv<W: Write>(out: W, records: &[ProductRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;

    for record in records {
        let metadata = record
            .metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";");
        let price = format!("{:.2}", record.price);
        let tags = record.tags.join("|");
        writer.write_record([
            record.name.as_str(),
            price.as_str(),
            record.currency.as_str(),
            record.url.as_str(),
            record.availability.as_deref().unwrap_or(""),
            tags.as_str(),
            record.description.as_deref().unwrap_or(""),
            metadata.as_str(),
        ])?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
