//! LitScout CLI Entry Point
//!
//! - `litscout run` - research all subtopics of a goal in parallel
//! - `litscout progress` - tail the progress log
//! - `litscout status` - show the session status
//! - `litscout config` - show or validate the configuration

use anyhow::Context;
use litscout::cli::commands;
use litscout::cli::output::Output;
use litscout::cli::{Cli, Commands};
use litscout::LitScoutConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<()> {
    let mut config = commands::load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Run {
            goal,
            subtopics,
            subtopics_file,
            backend,
            output_dir,
        } => {
            commands::apply_overrides(&mut config, backend, output_dir);
            let subtopics = commands::collect_subtopics(&subtopics, subtopics_file.as_deref())?;
            output.banner();
            commands::run(config, &goal, &subtopics, output).await?;
        }
        Commands::Progress { last, output_dir } => {
            commands::apply_overrides(&mut config, None, output_dir);
            commands::progress(&config, last, output)?;
        }
        Commands::Status { output_dir } => {
            commands::apply_overrides(&mut config, None, output_dir);
            commands::status(&config, output)?;
        }
        Commands::Config { validate } => {
            commands::show_config(&config, &cli.config, validate, output)?;
        }
    }

    Ok(())
}

/// Human-readable or JSON logs on stderr. `RUST_LOG` overrides the configured
/// level; `--verbose` forces debug.
fn init_tracing(config: &LitScoutConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let (json_layer, plain_layer) = if config.logging.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .init();
}
