//! pivotcal — command-line pivot calibration.

use std::{error::Error, fs, path::Path};

use clap::{Args, Parser, Subcommand};
use pivot_pipeline::{
    run_identification_study, run_pivot_calibration, IdentificationRow,
    IdentificationStudyConfig, PivotCalibrationConfig, PivotCalibrationInput,
    PivotCalibrationReport,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "pivotcal")]
#[command(author, version, about = "Tool-tip pivot calibration from flange poses")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Estimate tip offset and pivot from a JSON pose log.
    Calibrate {
        /// Path to JSON file containing PivotCalibrationInput.
        #[arg(long)]
        input: String,

        /// Optional path to JSON PivotCalibrationConfig. Defaults are used if omitted.
        #[arg(long)]
        config: Option<String>,
    },

    /// Tabulate identification error vs. number of poses on synthetic data.
    Sweep(SweepArgs),
}

#[derive(Debug, Clone, Args)]
struct SweepArgs {
    /// Optional path to JSON IdentificationStudyConfig; flags below override it.
    #[arg(long)]
    config: Option<String>,

    /// Smallest pose count (inclusive).
    #[arg(long)]
    min_poses: Option<usize>,

    /// Largest pose count (exclusive).
    #[arg(long)]
    max_poses: Option<usize>,

    /// Trials per pose count.
    #[arg(long)]
    repetitions: Option<usize>,

    /// Half-width of the uniform tip noise.
    #[arg(long)]
    noise: Option<f64>,

    /// Base random seed.
    #[arg(long)]
    seed: Option<u64>,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

fn run_calibration_from_files(input_path: &str, config_path: Option<&str>) -> CliResult<String> {
    let input: PivotCalibrationInput = load_json_file(Path::new(input_path))?;

    let config = if let Some(cfg_path) = config_path {
        load_json_file::<PivotCalibrationConfig>(Path::new(cfg_path))?
    } else {
        PivotCalibrationConfig::default()
    };

    let report: PivotCalibrationReport = run_pivot_calibration(&input, &config)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn sweep_config(args: &SweepArgs) -> CliResult<IdentificationStudyConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => load_json_file::<IdentificationStudyConfig>(Path::new(path))?,
        None => IdentificationStudyConfig::default(),
    };
    if let Some(v) = args.min_poses {
        config.min_poses = v;
    }
    if let Some(v) = args.max_poses {
        config.max_poses = v;
    }
    if let Some(v) = args.repetitions {
        config.repetitions = v;
    }
    if let Some(v) = args.noise {
        config.noise = v;
    }
    if let Some(v) = args.seed {
        config.seed = v;
    }
    Ok(config)
}

fn run_sweep(args: &SweepArgs) -> CliResult<String> {
    let config = sweep_config(args)?;
    let rows: Vec<IdentificationRow> = run_identification_study(&config)?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    let json = match &cli.command {
        Commands::Calibrate { input, config } => {
            run_calibration_from_files(input, config.as_deref())?
        }
        Commands::Sweep(args) => run_sweep(args)?,
    };
    println!("{json}");
    Ok(())
}
