pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use spotcast_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "spotcast",
    about = "Spotcast fishing-spot CLI",
    long_about = "Cluster fishing spots for map display, score fishing conditions, train the bootstrap catch model, and recommend spots near a position.",
    after_help = "Examples:\n  spotcast cluster --input spots.json --zoom 8\n  spotcast recommend --species cod --lat 59.91 --lon 10.75\n  spotcast config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a spotcast.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Override directory.url")]
    directory_url: Option<String>,
    #[arg(long, global = true, help = "Override directory.fixture_path")]
    directory_fixture: Option<PathBuf>,
    #[arg(long, global = true, help = "Override model.artifact_path")]
    model_artifact: Option<PathBuf>,
    #[arg(long, global = true, help = "Override pipeline.default_radius_km")]
    default_radius_km: Option<f64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Group spots from a JSON file into map clusters for a zoom level")]
    Cluster {
        #[arg(long, help = "JSON list of locations")]
        input: PathBuf,
        #[arg(long, help = "Map zoom level")]
        zoom: f64,
    },
    #[command(about = "Score one raw feature vector with the deployed condition model")]
    Classify {
        #[arg(long, help = "Ten comma-separated raw feature values")]
        features: String,
        #[arg(long, help = "Classifier artifact (defaults to model.artifact_path)")]
        model: Option<PathBuf>,
    },
    #[command(about = "Train the bootstrap catch model from logged observations")]
    Train(TrainArgs),
    #[command(about = "Recommend nearby spots ranked by distance and by predicted conditions")]
    Recommend(RecommendArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    #[arg(long, help = "JSON list of catch observations")]
    pub samples: PathBuf,
    #[arg(long, help = "Where to write the trained artifact")]
    pub output: PathBuf,
    #[arg(long, help = "Override training.epochs")]
    pub epochs: Option<usize>,
    #[arg(long, help = "Override training.seed")]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    #[arg(long)]
    pub species: String,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
    #[arg(long, help = "Search radius (defaults to pipeline.default_radius_km)")]
    pub radius_km: Option<f64>,
    #[arg(long, help = "Planned fishing time as RFC 3339 (defaults to now)")]
    pub at: Option<String>,
    #[arg(long, help = "Classifier artifact (defaults to model.artifact_path)")]
    pub model: Option<PathBuf>,
    #[arg(long, help = "Location fixture file (overrides directory settings)")]
    pub fixture: Option<PathBuf>,
}

impl Cli {
    /// Config loading options built from the global flags.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                log_level: self.log_level.clone(),
                directory_url: self.directory_url.clone(),
                directory_fixture_path: self.directory_fixture.clone(),
                model_artifact_path: self.model_artifact.clone(),
                default_radius_km: self.default_radius_km,
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Commands report config errors themselves; logging falls back to defaults.
    let logging = AppConfig::load(options.clone()).map(|config| config.logging).unwrap_or_else(
        |_| AppConfig::default().logging,
    );
    logging::init(&logging);

    let result = match cli.command {
        Command::Cluster { input, zoom } => commands::cluster::run(&options, &input, zoom),
        Command::Classify { features, model } => {
            commands::classify::run(&options, &features, model)
        }
        Command::Train(args) => commands::train::run(&options, args),
        Command::Recommend(args) => commands::recommend::run(&options, args),
        Command::Config => commands::config::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
