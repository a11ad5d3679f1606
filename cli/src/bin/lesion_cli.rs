use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use lesion::Label;
use lesion_cli::RecordSummary;
use lesion_store::{FsObjectStore, PipelineConfig, run_batch, summarize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment every listed image and persist the feature table
    Process {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Segment a single image and print its features
    Segment {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,
        /// Save the binary mask to this path
        #[arg(short, long)]
        mask_output: Option<PathBuf>,
        /// Label recorded with the features
        #[arg(long, default_value = "benign")]
        label: Label,
        /// Median blur kernel size (odd)
        #[arg(long, default_value = "5")]
        median_kernel: u32,
        /// Fixed binarisation level instead of Otsu
        #[arg(long)]
        threshold: Option<u8>,
    },
    /// Per-label overview of a persisted feature table
    Summary {
        /// Path to the TOML or JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Write a default configuration file
    Init {
        /// Output path, `.toml` or `.json`
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Process { config } => process(config)?,
        Commands::Segment { input, mask_output, label, median_kernel, threshold } => {
            segment(input, mask_output.as_deref(), *label, *median_kernel, *threshold)?
        }
        Commands::Summary { config } => summary(config)?,
        Commands::Init { output } => init(output)?,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&PipelineConfig::schema())?);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    PipelineConfig::from_file(path)
        .wrap_err_with(|| format!("failed to load configuration {}", path.display()))
}

fn process(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    info!("Store root: {:?}", config.store_root);

    let store = FsObjectStore::new(&config.store_root);
    let report = run_batch(&store, &config)?;

    for failure in &report.failures {
        warn!("{} ({}): {}", failure.image_id, failure.stage, failure.reason);
    }
    let complete = report.table.records.iter().filter(|r| r.is_complete()).count();
    info!(
        "Feature table written to {}/{}: {} rows, {} complete",
        config.processed_bucket,
        config.table_key,
        report.table.len(),
        complete
    );
    Ok(())
}

fn segment(
    input: &Path,
    mask_output: Option<&Path>,
    label: Label,
    median_kernel: u32,
    threshold: Option<u8>,
) -> Result<()> {
    let image = image::open(input)
        .wrap_err_with(|| format!("failed to open {}", input.display()))?
        .to_rgb8();

    let pipeline = lesion::Pipeline::builder()
        .with_median_kernel(median_kernel)
        .with_fixed_threshold(threshold)
        .build();
    info!("{}", pipeline.info());

    let image_id = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| eyre!("input path has no file name: {}", input.display()))?;
    let (record, failures) = pipeline.process(image_id, label, &image);
    for failure in &failures {
        warn!("{}: {}", failure.stage, failure.reason);
    }

    if let Some(path) = mask_output {
        match record.segmented_image.as_ref().and_then(|p| p.to_image()) {
            Some(mask) => {
                mask.save(path)?;
                info!("Mask saved to {:?}", path);
            }
            None => warn!("No mask produced, nothing written to {:?}", path),
        }
    }

    println!("{}", serde_json::to_string_pretty(&RecordSummary::from(&record))?);
    Ok(())
}

fn summary(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let store = FsObjectStore::new(&config.store_root);
    let summary = summarize(&store, &config)?;

    for (label, stats) in &summary.by_label {
        info!(
            "{}: {} rows ({} complete), perimeter {:?}, non_zeros {:?}, circularity {:?}, \
             main asymmetry {:?}, secondary asymmetry {:?}",
            label,
            stats.rows,
            stats.complete,
            stats.perimeter.mean,
            stats.non_zeros.mean,
            stats.circularity.mean,
            stats.main_assymetry.mean,
            stats.secondary_assymetry.mean,
        );
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init(output: &Path) -> Result<()> {
    let config = PipelineConfig::default();
    let content = match output.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => config.to_toml()?,
        Some("json") => config.to_json()?,
        _ => return Err(eyre!("unsupported config extension, use .toml or .json")),
    };
    std::fs::write(output, content)?;
    info!("Default configuration written to {:?}", output);
    Ok(())
}
