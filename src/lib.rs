//! mlstac: STAC catalogs of paired imagery and label samples.
//!
//! mlstac builds a STAC catalog from a list of `(image, label)` file pairs:
//! an image collection and a label collection, optionally split into
//! `train`/`test` sub-catalogs, with every label item linked to the image it
//! was traced from. The finished catalog can be re-indexed into an
//! ML-oriented catalog holding one combined item per sample.
//!
//! # Modules
//!
//! - [`model`]: Node, extent, asset and link types
//! - [`catalog`]: The node arena, href resolution, asset/link binding
//! - [`factory`]: Image/label item pair construction and bbox providers
//! - [`builder`]: Two-phase catalog construction with partial-failure reports
//! - [`split`]: Derived train/test ML catalogs
//! - [`stac`]: Reading and writing STAC documents
//! - [`scene`]: Training-pipeline scene descriptors
//! - [`manifest`]: CSV pair manifests and split assignment
//! - [`config`]: YAML catalog configuration
//! - [`inspect`]: Catalog summaries
//! - [`error`]: Error types for mlstac operations

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod factory;
pub mod inspect;
pub mod manifest;
pub mod model;
pub mod scene;
pub mod split;
pub mod stac;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use builder::{BuildReport, CatalogBuilder, CatalogOptions, Phase};
pub use catalog::Catalog;
pub use error::{BBoxError, CatalogError};
pub use split::{MlCatalogBuilder, MlCatalogOptions, SplitReport};

/// The mlstac CLI application.
#[derive(Parser)]
#[command(name = "mlstac")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a catalog from a pair manifest.
    Build(BuildArgs),
    /// Print the tree and extents of a saved catalog.
    Describe(DescribeArgs),
    /// Print the training dataset configuration of a saved ML catalog.
    Scenes(ScenesArgs),
}

/// Arguments for the build subcommand.
#[derive(clap::Args)]
struct BuildArgs {
    /// CSV manifest with image,label[,split][,xmin,ymin,xmax,ymax] columns.
    manifest: PathBuf,

    /// Directory the catalog is written to.
    #[arg(short, long)]
    output: PathBuf,

    /// YAML catalog configuration.
    #[arg(short, long, env = "MLSTAC_CONFIG")]
    config: Option<PathBuf>,

    /// Also write a derived train/test ML catalog to this directory.
    #[arg(long)]
    ml_output: Option<PathBuf>,

    /// Directory image references are resolved against (defaults to the
    /// manifest's directory).
    #[arg(long)]
    image_root: Option<PathBuf>,

    /// Fraction of unsplit pairs assigned to the test split.
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Seed for split assignment.
    #[arg(long)]
    seed: Option<u64>,

    /// Fail if any pair was skipped.
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the describe subcommand.
#[derive(clap::Args)]
struct DescribeArgs {
    /// Root catalog document.
    catalog: PathBuf,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the scenes subcommand.
#[derive(clap::Args)]
struct ScenesArgs {
    /// Root document of an ML catalog with train and test collections.
    catalog: PathBuf,

    /// Raster channel order, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "0,1,2")]
    channel_order: Vec<usize>,

    /// Class names used when the catalog declares none.
    #[arg(long = "class")]
    classes: Vec<String>,
}

/// Run the mlstac CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CatalogError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Build(args)) => run_build(args),
        Some(Commands::Describe(args)) => run_describe(args),
        Some(Commands::Scenes(args)) => run_scenes(args),
        None => {
            println!("mlstac {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Build STAC catalogs of paired imagery and label samples.");
            println!();
            println!("Run 'mlstac --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the build subcommand.
fn run_build(args: BuildArgs) -> Result<(), CatalogError> {
    check_format(&args.report)?;

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::CatalogConfig::default(),
    };

    let mut pairs = manifest::read_manifest(&args.manifest)?;
    if let Some(fraction) = args.test_fraction {
        manifest::assign_splits(&mut pairs, fraction, args.seed)?;
    }

    let image_root = match &args.image_root {
        Some(root) => absolute(root)?,
        None => absolute(args.manifest.parent().unwrap_or(Path::new("")))?,
    };
    let mut pair_factory = config.pair_factory();
    if pair_factory.asset_base_uri.is_none() {
        pair_factory = pair_factory.with_asset_base_uri(path_href(&image_root));
    }
    let provider = factory::PixelBoundsProvider::new(image_root.clone());

    let out_dir = absolute(&args.output)?;
    let root_href = path_href(&out_dir.join(catalog::href::CATALOG_FILE));
    let mut builder = CatalogBuilder::new(config.catalog_options(root_href), pair_factory, provider)?;
    let mut report = builder.add_pairs(pairs)?;
    report.issues.extend(builder.finalize());
    let built = builder.into_catalog();
    fs::create_dir_all(&out_dir)?;
    stac::write_catalog(&built, &out_dir)?;

    let split_report = match &args.ml_output {
        Some(ml_dir) => {
            let ml_dir = absolute(ml_dir)?;
            let href = path_href(&ml_dir.join(catalog::href::CATALOG_FILE));
            let mut ml = MlCatalogBuilder::new(config.ml_options(href))?;
            let split_report = ml.extend_from(&built)?;
            ml.finalize();
            fs::create_dir_all(&ml_dir)?;
            stac::write_catalog(ml.catalog(), &ml_dir)?;
            Some(split_report)
        }
        None => None,
    };

    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        "build finished"
    );

    match args.report.as_str() {
        "json" => {
            let output = BuildOutput {
                build: &report,
                split: split_report.as_ref(),
            };
            println!("{}", to_pretty_json(&output)?);
        }
        _ => {
            print!("{}", report);
            if let Some(split_report) = &split_report {
                println!();
                print!("{}", split_report);
            }
        }
    }

    let skipped =
        report.skipped.len() + split_report.as_ref().map_or(0, |r| r.skipped.len());
    if args.strict && skipped > 0 {
        Err(CatalogError::StrictFailed { skipped })
    } else {
        Ok(())
    }
}

/// JSON shape of the build subcommand's report.
#[derive(Serialize)]
struct BuildOutput<'a> {
    build: &'a BuildReport,
    split: Option<&'a SplitReport>,
}

/// Execute the describe subcommand.
fn run_describe(args: DescribeArgs) -> Result<(), CatalogError> {
    check_format(&args.output)?;
    let catalog = stac::read_catalog(&args.catalog)?;
    let summary = inspect::inspect_catalog(&catalog);

    match args.output.as_str() {
        "json" => println!("{}", to_pretty_json(&summary)?),
        _ => print!("{}", summary),
    }
    Ok(())
}

/// Execute the scenes subcommand.
fn run_scenes(args: ScenesArgs) -> Result<(), CatalogError> {
    let catalog = stac::read_catalog(&args.catalog)?;
    let options = scene::SceneOptions {
        channel_order: args.channel_order,
        fallback_classes: args.classes,
        ..Default::default()
    };
    let dataset = scene::read_dataset_config(&catalog, &options)?;
    println!("{}", to_pretty_json(&dataset)?);
    Ok(())
}

fn check_format(format: &str) -> Result<(), CatalogError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(CatalogError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, CatalogError> {
    serde_json::to_string_pretty(value).map_err(|source| CatalogError::StacWrite {
        path: PathBuf::from("<stdout>"),
        source,
    })
}

fn absolute(path: &Path) -> Result<PathBuf, CatalogError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn path_href(path: &Path) -> String {
    catalog::href::normalize(&path.to_string_lossy().replace('\\', "/"))
}
