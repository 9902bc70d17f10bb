//! coco2yolo: COCO JSON annotations to YOLO label datasets.
//!
//! A COCO document is indexed, its annotated images are split into
//! train/valid/test with a seeded shuffle, and each split is written as
//! `images/` + `labels/` directories next to a `data.yaml` manifest.
//!
//! # Modules
//!
//! - [`ir`]: COCO and YOLO types plus their readers and writers
//! - [`index`]: category, image and annotation lookup tables
//! - [`normalize`]: pixel geometry to normalized YOLO label lines
//! - [`split`]: reproducible train/valid/test partitioning
//! - [`conversion`]: the materializer and its summary report
//! - [`error`]: error types for coco2yolo operations

pub mod conversion;
pub mod error;
pub mod index;
pub mod ir;
pub mod normalize;
pub mod split;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use conversion::{convert, ConversionSummary, ConvertOptions, TransferMode};
pub use error::{Coco2YoloError, ConfigError, SchemaError};
pub use split::SplitRatios;

/// The coco2yolo CLI application.
#[derive(Parser)]
#[command(name = "coco2yolo")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a COCO JSON file into a split YOLO dataset.
    Convert(ConvertArgs),
    /// Show how images would be split, without writing anything.
    Plan(PlanArgs),
}

#[derive(clap::Args)]
struct SplitArgs {
    /// Fraction of annotated images for training.
    #[arg(long, default_value_t = 0.8, value_parser = parse_ratio)]
    train: f64,

    /// Fraction of annotated images for validation.
    #[arg(long, default_value_t = 0.2, value_parser = parse_ratio)]
    val: f64,

    /// Fraction of annotated images for testing.
    #[arg(long, default_value_t = 0.0, value_parser = parse_ratio)]
    test: f64,

    /// Shuffle seed; the same seed reproduces the same split.
    #[arg(long, default_value_t = conversion::DEFAULT_SEED)]
    seed: u64,
}

impl SplitArgs {
    fn ratios(&self) -> Result<SplitRatios, ConfigError> {
        SplitRatios::new(self.train, self.val, self.test)
    }
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// COCO annotations JSON file.
    coco_json: PathBuf,

    /// Directory holding the images named by `file_name`.
    #[arg(long)]
    images: PathBuf,

    /// Output dataset root.
    #[arg(long, short = 'o')]
    output: PathBuf,

    #[command(flatten)]
    split: SplitArgs,

    /// Hard-link images instead of copying (falls back to copy).
    #[arg(long)]
    link: bool,

    /// Hide progress bars.
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Exit non-zero when any image or annotation did not make it into the output.
    #[arg(long)]
    strict: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct PlanArgs {
    /// COCO annotations JSON file.
    coco_json: PathBuf,

    #[command(flatten)]
    split: SplitArgs,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if ratio.is_finite() && (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("{} is outside [0, 1]", value))
    }
}

/// Run the coco2yolo CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), Coco2YoloError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Plan(args)) => run_plan(args),
        None => {
            println!("coco2yolo {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert COCO JSON annotations into YOLO datasets.");
            println!();
            println!("Run 'coco2yolo --help' for usage information.");
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), Coco2YoloError> {
    let ratios = args.split.ratios()?;
    let transfer = if args.link {
        TransferMode::HardLink
    } else {
        TransferMode::Copy
    };
    let options = ConvertOptions::new(args.coco_json, args.images, args.output)
        .with_ratios(ratios)
        .with_seed(args.split.seed)
        .with_transfer(transfer)
        .with_progress(!args.quiet);

    let summary = convert(&options)?;
    print_report(&summary, args.report)?;

    if args.strict && !summary.is_complete() {
        return Err(Coco2YoloError::IncompleteConversion {
            missing: summary.missing_count(),
            skipped: summary.skipped_annotation_count(),
            unwritten: summary.unwritten_image_count(),
        });
    }
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<(), Coco2YoloError> {
    let ratios = args.split.ratios()?;
    let plan = conversion::plan(&args.coco_json, ratios, args.split.seed)?;
    print_report(&plan, args.report)
}

fn print_report<T>(report: &T, format: ReportFormat) -> Result<(), Coco2YoloError>
where
    T: std::fmt::Display + Serialize,
{
    match format {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(Coco2YoloError::ReportRender)?;
            println!("{}", json);
        }
        ReportFormat::Text => print!("{}", report),
    }
    Ok(())
}
