// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use pdfsift::{
    Chunker, Config, CsvExporter, FileScanner, HttpCompletionService, PdfExtractor,
    PipelineOrchestrator, ReportWriter, Schema, TextNormalizer, Validator,
};
use pdfsift::utils::logging::{format_error, format_success, format_warning};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pdfsift")]
#[command(version = "0.1.0")]
#[command(about = "Structured data extraction pipeline for PDF documents", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured records from a directory or explicit PDF files
    Run {
        /// Input directory to scan (defaults to input.source_dir)
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Explicit PDF paths; overrides directory scanning
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Schema file (defaults to input.schema_path)
        #[arg(long, value_name = "FILE")]
        schema: Option<PathBuf>,

        #[arg(long, value_name = "NUM")]
        limit: Option<usize>,
    },

    /// Preview page extraction, normalization, and chunking for one file
    /// without calling the model service
    Inspect {
        file: PathBuf,

        /// Print full chunk texts instead of a summary
        #[arg(long, action = ArgAction::SetTrue)]
        chunks: bool,
    },

    /// Validate the extraction schema, or write a starter template
    Schema {
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,

        /// Write a template schema to the path instead of validating
        #[arg(long, action = ArgAction::SetTrue)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pdfsift::utils::logging::init_logger(cli.color, cli.verbose);

    info!("pdfsift extraction pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Run {
            input,
            files,
            schema,
            limit,
        } => {
            cmd_run(&config, input, files, schema, limit).await?;
        }
        Commands::Inspect { file, chunks } => {
            cmd_inspect(&config, file, chunks).await?;
        }
        Commands::Schema { path, init } => {
            cmd_schema(&config, path, init)?;
        }
    }

    Ok(())
}

async fn cmd_run(
    config: &Config,
    input: Option<PathBuf>,
    files: Vec<PathBuf>,
    schema_path: Option<PathBuf>,
    limit: Option<usize>,
) -> Result<()> {
    let start_time = Instant::now();

    let schema_path = schema_path.unwrap_or_else(|| config.input.schema_path.clone());
    let schema = Schema::from_yaml_file(&schema_path).context("Failed to load schema")?;
    info!(
        "Schema {} declares {} field(s)",
        schema_path.display(),
        schema.fields.len()
    );

    let api_key = config.require_api_key()?.to_string();
    let service = HttpCompletionService::new(&config.service, api_key)
        .context("Failed to build service client")?;

    let mut scanned = if files.is_empty() {
        let dir = input.unwrap_or_else(|| config.input.source_dir.clone());
        Validator::validate_directory(&dir)?;
        FileScanner::new(config.input.clone()).scan_directory(&dir)?
    } else {
        for file in &files {
            Validator::validate_pdf_extension(file)?;
            Validator::validate_file_path(file)?;
        }
        FileScanner::from_paths(&files)
    };

    if let Some(limit) = limit {
        scanned.truncate(limit);
    }

    if scanned.is_empty() {
        warn!("No PDF files to process");
        return Ok(());
    }

    info!("Processing {} document(s)", scanned.len());

    let orchestrator = PipelineOrchestrator::new(config.clone(), schema.clone(), Arc::new(service));

    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight work");
            cancel.cancel();
        }
    });

    let run = orchestrator.run(scanned).await;

    CsvExporter::new(&config.output.table_path)?.export(&run, &schema)?;
    ReportWriter::new(&config.output.report_path)?.write(&run)?;

    let elapsed = start_time.elapsed();
    info!("Run complete in {:.2}s", elapsed.as_secs_f64());

    println!();
    println!(
        "{}",
        format_success(&format!(
            "{} complete ({} documents total)",
            run.complete(),
            run.documents.len()
        ))
    );
    if run.partial() > 0 {
        println!(
            "{}",
            format_warning(&format!("{} partial", run.partial()))
        );
    }
    if run.failed() > 0 {
        println!("{}", format_error(&format!("{} failed", run.failed())));
    }
    for error in run.errors() {
        println!(
            "  {} [{}] {}: {}",
            error.file,
            error.stage.as_str(),
            error.kind,
            error.detail
        );
    }
    println!();
    println!("Table:  {}", config.output.table_path.display());
    println!("Report: {}", config.output.report_path.display());

    Ok(())
}

async fn cmd_inspect(config: &Config, file: PathBuf, show_chunks: bool) -> Result<()> {
    Validator::validate_pdf_extension(&file)?;
    Validator::validate_file_path(&file)?;

    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let extractor = PdfExtractor::new();
    let pages = tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await??;

    println!("{}: {} page(s)", file.display(), pages.len());
    for page in &pages {
        println!(
            "  page {:>3}: {:>6} chars{}",
            page.index,
            page.char_count,
            if page.is_empty() { " (no text)" } else { "" }
        );
    }

    let normalizer = TextNormalizer::new();
    let text = normalizer.normalize_pages(&pages);
    println!("Normalized text: {} chars", text.chars().count());

    let chunker = Chunker::new(
        config.chunking.budget_chars,
        config.chunking.overlap_chars,
    );
    let chunks = chunker.chunk(&text);
    println!(
        "{} chunk(s) at budget {} (overlap {})",
        chunks.len(),
        config.chunking.budget_chars,
        config.chunking.overlap_chars
    );

    for chunk in &chunks {
        if show_chunks {
            println!("\n--- chunk {} ({} chars) ---", chunk.index, chunk.char_count());
            println!("{}", chunk.text);
        } else {
            let preview: String = chunk.text.chars().take(60).collect();
            println!("  chunk {:>3}: {:>6} chars | {}", chunk.index, chunk.char_count(), preview);
        }
    }

    Ok(())
}

fn cmd_schema(config: &Config, path: Option<PathBuf>, init: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| config.input.schema_path.clone());

    if init {
        if path.exists() {
            anyhow::bail!("Refusing to overwrite existing schema: {}", path.display());
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Schema::template_yaml())?;
        println!(
            "{}",
            format_success(&format!("Wrote schema template to {}", path.display()))
        );
        return Ok(());
    }

    let schema = Schema::from_yaml_file(&path)?;
    println!(
        "{}",
        format_success(&format!(
            "{}: {} field(s)",
            path.display(),
            schema.fields.len()
        ))
    );
    for field in &schema.fields {
        let mut line = format!("  {} ({})", field.name, field.field_type.as_str());
        if !field.allowed.is_empty() {
            line.push_str(&format!(" [{}]", field.allowed.join(", ")));
        }
        if let Some(ref description) = field.description {
            line.push_str(&format!(": {}", description));
        }
        println!("{}", line);
    }

    Ok(())
}
