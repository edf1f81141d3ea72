//! CLI tool for extracting slide records and images from PowerPoint files.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use deck_core::{DirectoryStore, ExtractOptions, FirstShortTitle, ImageNaming, DEFAULT_TITLE_THRESHOLD};
use deck_pptx::PptxExtractor;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Extract titles, paragraphs and images from a PowerPoint (.pptx) file as JSON.
#[derive(Parser, Debug)]
#[command(name = "deck-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Directory extracted images are written to (created if missing)
    #[arg(short, long, default_value = ".")]
    images_dir: PathBuf,

    /// How stored image file names are chosen
    #[arg(long, value_enum, default_value_t = Naming::Basename)]
    naming: Naming,

    /// Prefix for image file names (with --naming prefix)
    #[arg(long)]
    prefix: Option<String>,

    /// Include speaker notes
    #[arg(short, long)]
    notes: bool,

    /// Texts shorter than this many characters may become the slide title
    #[arg(long, default_value_t = DEFAULT_TITLE_THRESHOLD)]
    title_threshold: usize,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit slides and diagnostics as one object instead of the slide array
    #[arg(long)]
    report: bool,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Naming {
    /// Media base name, e.g. image1.png (later images overwrite earlier ones of the same name)
    Basename,
    /// SHA-256 of the image bytes
    Hash,
    /// --prefix followed by the media base name
    Prefix,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let options = ExtractOptions::new()
        .with_image_naming(image_naming(&args)?)
        .with_speaker_notes(args.notes);
    let extractor = PptxExtractor::new()
        .with_options(options)
        .with_classifier(FirstShortTitle::new().with_threshold(args.title_threshold));

    let mut store = DirectoryStore::create(&args.images_dir).with_context(|| {
        format!("Failed to create image directory {}", args.images_dir.display())
    })?;

    log::debug!("Processing: {}", args.input.display());
    let extraction = extractor
        .extract_file(&args.input, &mut store)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    if args.verbose {
        eprintln!(
            "  Found {} slides ({} skipped items)",
            extraction.slides.len(),
            extraction.diagnostics.len()
        );
    }

    let json = if args.report {
        to_json(&extraction, args.pretty)?
    } else {
        to_json(&extraction.slides, args.pretty)?
    };

    match &args.output {
        Some(path) => {
            write_output(path, &json)?;
            if args.verbose {
                eprintln!("Written to: {}", path.display());
            }
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn image_naming(args: &Args) -> Result<ImageNaming> {
    Ok(match (args.naming, &args.prefix) {
        (Naming::Basename, _) => ImageNaming::BaseName,
        (Naming::Hash, _) => ImageNaming::ContentHash,
        (Naming::Prefix, Some(prefix)) => ImageNaming::Prefixed(prefix.clone()),
        (Naming::Prefix, None) => bail!("--naming prefix requires --prefix"),
    })
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize slides")
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", content)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["deck-extract", "deck.pptx"]).unwrap();
        assert_eq!(args.images_dir, PathBuf::from("."));
        assert_eq!(args.naming, Naming::Basename);
        assert_eq!(args.title_threshold, 50);
        assert!(!args.notes);
        assert_eq!(image_naming(&args).unwrap(), ImageNaming::BaseName);
    }

    #[test]
    fn test_prefix_naming_needs_prefix() {
        let args = Args::try_parse_from(["deck-extract", "deck.pptx", "--naming", "prefix"]).unwrap();
        assert!(image_naming(&args).is_err());

        let args = Args::try_parse_from([
            "deck-extract",
            "deck.pptx",
            "--naming",
            "prefix",
            "--prefix",
            "req1-",
        ])
        .unwrap();
        assert_eq!(image_naming(&args).unwrap(), ImageNaming::Prefixed("req1-".to_string()));
    }

    #[test]
    fn test_report_flag() {
        let args = Args::try_parse_from(["deck-extract", "deck.pptx"]).unwrap();
        assert!(!args.report);

        let args = Args::try_parse_from(["deck-extract", "deck.pptx", "--report", "--pretty"]).unwrap();
        assert!(args.report);
        assert!(args.pretty);
    }
}
