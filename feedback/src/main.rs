mod config;

use clap::{Parser, Subcommand};
use config::{CommonConfig, Config, ConfigError};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "feedback", about = "Patient feedback intake service")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Accepts feedback submissions and forwards them to storage.
    Intake {
        #[arg(long)]
        config_file_path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Intake { config_file_path } => {
            let config = match load_config(config_file_path.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Failed to load config: {e}");
                    process::exit(1);
                }
            };

            // Keeps the Sentry client alive until shutdown.
            let _sentry = init_logging(&config.common);
            init_metrics(&config.common);

            let intake_config = config.intake.unwrap_or_default();
            if let Err(e) = run_intake(intake_config) {
                tracing::error!(error = %e, "Intake service stopped");
                process::exit(1);
            }
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let mut intake_config = config.intake.take().unwrap_or_default();
    intake_config.apply_env_overrides(|key| std::env::var(key).ok())?;
    intake_config.validate()?;
    config.intake = Some(intake_config);

    Ok(config)
}

fn init_logging(common: &CommonConfig) -> Option<sentry::ClientInitGuard> {
    let guard = common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry::integrations::tracing::layer())
        .init();

    guard
}

fn init_metrics(common: &CommonConfig) {
    let Some(metrics) = &common.metrics else {
        tracing::info!("No metrics backend configured");
        return;
    };

    let recorder = match StatsdBuilder::from(metrics.statsd_host.as_str(), metrics.statsd_port)
        .build(metrics.prefix.as_deref())
    {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build statsd recorder, metrics are disabled");
            return;
        }
    };

    if let Err(e) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %e, "Failed to install metrics recorder");
        return;
    }

    shared::metrics_defs::describe_all(intake::metrics_defs::ALL_METRICS);
}

fn run_intake(config: intake::config::Config) -> Result<(), intake::errors::IntakeError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(intake::run(config))
}
