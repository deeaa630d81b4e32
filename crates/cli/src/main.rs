//! CLI tool for translating PowerPoint presentations.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deck_core::{output_path, translate_document, DocumentFormat, Language, RunReport, TranslateOptions};
use deck_pptx::PptxDocument;
use deck_service::{ChatTranslator, ServiceConfig};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Translate the text of a PowerPoint presentation into another language.
///
/// The translated deck is written next to the input, with the language code
/// inserted before the extension (deck.pptx -> deck-fi.pptx).
#[derive(Parser, Debug)]
#[command(name = "translate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Target language code: ru, fi, et, sv or en
    language: String,

    /// Trace shape classification and every translation
    #[arg(short, long)]
    verbose: bool,

    /// Also translate speaker notes
    #[arg(short, long)]
    notes: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    // Configuration is checked in full before the document is touched.
    let language: Language = args.language.parse()?;
    let config = ServiceConfig::from_env()?;
    check_input(&args.input)?;

    let translator = ChatTranslator::new(config).context("Failed to create HTTP client")?;

    if args.verbose {
        eprintln!("Processing: {}", args.input.display());
    }

    let mut deck = PptxDocument::open(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    if args.verbose {
        eprintln!("  Found {} slides", deck.document().slides.len());
    }

    let options = TranslateOptions {
        include_notes: args.notes,
    };
    let report = translate_document(deck.document_mut(), &translator, language, options);

    let output = output_path(&args.input, language);
    deck.save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Translated presentation saved as: {}", output.display());
        println!("{}", summary(&report));
    }

    Ok(())
}

/// Make sure the input exists, is readable and is a PPTX package.
fn check_input(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    let read = reader
        .read(&mut magic)
        .with_context(|| "Failed to read file header")?;

    let format = DocumentFormat::from_magic(&magic[..read]).or_else(|| {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentFormat::from_extension)
    });

    match format {
        Some(DocumentFormat::Pptx) => Ok(()),
        Some(DocumentFormat::Ppt) => bail!(
            "{} is a legacy .ppt file; save it as .pptx first",
            path.display()
        ),
        None => bail!("{} is not a PowerPoint presentation", path.display()),
    }
}

fn summary(report: &RunReport) -> String {
    let mut line = format!(
        "{} slides: {} translated, {} blank skipped, {} failed",
        report.slides,
        report.translated,
        report.skipped_empty,
        report.failed_count()
    );
    if report.walk.cycles > 0 {
        line.push_str(&format!(", {} cyclic references skipped", report.walk.cycles));
    }
    line
}
