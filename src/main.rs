// src/main.rs
mod document;
mod extractors;
mod source;
mod storage;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use extractors::section::{ParseResult, SectionExtractor};
use extractors::trace::{LogObserver, RecordingObserver, Tee, TraceEvent};
use extractors::{SectionCatalog, SectionDefinition};
use source::DocumentSource;
use storage::StorageManager;
use utils::AppError;

const CATALOG_ENV: &str = "SECTION_CATALOG";

/// Command Line Interface for the requirements-document section extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Document to read: a local path or an http(s) URL (HTML, XHTML or JSON tree)
    #[arg(short, long)]
    input: String,

    /// Identifier used for the output directory (default: input file stem)
    #[arg(long)]
    document_id: Option<String>,

    /// Section id to extract; repeat for several (default: every catalog section)
    #[arg(short, long)]
    section: Vec<String>,

    /// JSON section catalog (falls back to $SECTION_CATALOG, then the built-in catalog)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Output directory for extracted content
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Debug mode - save an annotated HTML trace per section
    #[arg(short, long)]
    debug: bool,

    /// Print the results as JSON to stdout
    #[arg(short, long)]
    print: bool,
}

fn load_catalog(path: Option<PathBuf>) -> Result<SectionCatalog, AppError> {
    let path = path.or_else(|| std::env::var(CATALOG_ENV).ok().map(PathBuf::from));
    match path {
        Some(path) => Ok(SectionCatalog::load_from_file(path)?),
        None => {
            tracing::debug!("Using built-in section catalog");
            Ok(SectionCatalog::builtin())
        }
    }
}

fn select_sections(
    catalog: &SectionCatalog,
    requested: &[String],
) -> Result<Vec<SectionDefinition>, AppError> {
    if requested.is_empty() {
        return Ok(catalog.sections.clone());
    }
    requested
        .iter()
        .map(|id| -> Result<SectionDefinition, AppError> {
            let section = catalog.get(id).map_err(|e| {
                let known = catalog.ids().collect::<Vec<_>>().join(", ");
                tracing::error!("Unknown section '{}'. Known sections: {}", id, known);
                e
            })?;
            Ok(section.clone())
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.debug);
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Catalog and sections
    let catalog = load_catalog(args.catalog.clone())?;
    let sections = select_sections(&catalog, &args.section)?;
    tracing::info!(
        "Extracting {} section(s): {}",
        sections.len(),
        sections.iter().map(|s| s.id.as_str()).collect::<Vec<_>>().join(", ")
    );

    // 4. Load and convert the document
    let input = DocumentSource::parse(&args.input);
    let document_id = args
        .document_id
        .clone()
        .unwrap_or_else(|| input.document_id());
    let loaded = source::load_document(&input).await?;
    tracing::info!("Loaded {} ({} bytes)", input.display(), loaded.bytes.len());

    let conversion = document::convert_document(&loaded.name, &loaded.bytes)?;
    for warning in &conversion.warnings {
        tracing::warn!("Conversion warning: {}", warning);
    }
    tracing::info!("Document tree has {} blocks", conversion.tree.len());

    // 5. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 6. Extract every section on the blocking pool
    let tree = Arc::new(conversion.tree);
    let extractor = SectionExtractor::new();
    let mut handles = Vec::with_capacity(sections.len());
    for section in sections {
        let tree = Arc::clone(&tree);
        let debug = args.debug;
        handles.push(tokio::task::spawn_blocking(move || {
            let mut log = LogObserver::new(section.id.as_str());
            let mut recorder = RecordingObserver::new();
            let result = if debug {
                let mut tee = Tee::new(&mut log, &mut recorder);
                extractor.extract_with_observer(&tree, &section, &mut tee)
            } else {
                extractor.extract_with_observer(&tree, &section, &mut log)
            };
            (section, result, recorder.events)
        }));
    }

    // 7. Save results
    let mut results: Vec<ParseResult> = Vec::new();
    let mut last_error = None;
    for handle in handles {
        let (section, outcome, events) = handle.await?;
        let result = match outcome {
            Ok(result) => result.with_warnings(conversion.warnings.iter().cloned()),
            Err(e) => {
                tracing::error!("Failed to extract section {}: {}", section.id, e);
                last_error = Some(e);
                continue;
            }
        };

        if result.found {
            tracing::info!(
                "Found {} via {:?} ({} chars)",
                section.id,
                result.mode,
                result.content_length
            );
        } else {
            tracing::warn!("{}: {}", section.id, result.errors.join("; "));
        }

        match storage.save_result(&document_id, &result) {
            Ok(Some(path)) => tracing::info!("Saved section content to: {}", path.display()),
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to save section content: {}", e),
        }
        match storage.save_result_metadata(&document_id, &result) {
            Ok(path) => tracing::info!("Saved section metadata to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save section metadata: {}", e),
        }

        if args.debug {
            if let Err(e) = save_trace(&storage, &document_id, &section, &tree, &events) {
                tracing::warn!("Failed to create debug HTML: {}", e);
            }
        }

        results.push(result);
    }

    let found = results.iter().filter(|r| r.found).count();
    tracing::info!(
        "Processing finished. Found: {}, Not found: {}",
        found,
        results.len() - found
    );

    if args.print {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    match last_error {
        Some(e) if results.is_empty() => Err(e.into()),
        _ => Ok(()),
    }
}

fn save_trace(
    storage: &StorageManager,
    document_id: &str,
    section: &SectionDefinition,
    tree: &document::DocumentTree,
    events: &[TraceEvent],
) -> Result<(), AppError> {
    let debug_dir = storage.document_dir(document_id)?.join("debug");
    std::fs::create_dir_all(&debug_dir)?;
    let html = utils::html_debug::render_trace_html(&section.id, tree, events);
    utils::html_debug::save_debug_html(debug_dir.join(format!("{}_trace.html", section.id)), &html)
}
