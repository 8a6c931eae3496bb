//! Bare metal provisioning CLI
//!
//! Command-line interface for the bare metal provisioning REST API.

use anyhow::Result;
use baremetalctl::cli::{
    generate_completion, handle_config, handle_driver, handle_portgroup, Cli, Commands,
    OutputFormat,
};
use baremetalctl::client::HttpClient;
use baremetalctl::config::CliConfig;
use baremetalctl::BaremetalClient;
use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs go to stderr so they never mix with command output.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn exit_with_error(e: &anyhow::Error, verbose: bool) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), e);
    if verbose {
        eprintln!("Error details: {:?}", e);
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build configuration using priority chain: defaults → file → env → CLI args
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            if cli.verbose {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    };

    let verbose = config.verbose;
    init_tracing(verbose);
    if !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }

    let output_format = match config.output_format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };
    debug!(url = %config.url, api_version = %config.api_version, ?output_format, "resolved configuration");

    let mut stdout = std::io::stdout();

    let result = match cli.command {
        Commands::Portgroup { command } => match build_client(&config) {
            Ok(client) => handle_portgroup(&client, command, &output_format, &mut stdout).await,
            Err(e) => Err(e),
        },
        Commands::Driver { command } => match build_client(&config) {
            Ok(client) => handle_driver(&client, command, &output_format, &mut stdout).await,
            Err(e) => Err(e),
        },
        Commands::Config { command } => handle_config(command, &config, &output_format, &mut stdout),
        Commands::Completion { shell } => {
            generate_completion(shell, &mut stdout);
            Ok(())
        }
    };

    if let Err(e) = result {
        exit_with_error(&e, verbose);
    }

    Ok(())
}

fn build_client(config: &CliConfig) -> Result<BaremetalClient<HttpClient>> {
    let transport = HttpClient::new(
        &config.url,
        &config.api_version,
        config.token.as_deref(),
        config.timeout,
    )?
    .with_retries(config.max_retries, Duration::from_millis(500));
    Ok(BaremetalClient::new(transport))
}

fn resolve_config(cli: &Cli) -> Result<CliConfig> {
    let mut builder = CliConfig::builder();

    // Load config file (unless --no-config is specified)
    if !cli.no_config {
        builder = builder.with_config_file(cli.config.as_deref())?;
    }

    // Apply environment variable overrides
    builder = builder.with_env_overrides();

    // Apply CLI argument overrides (highest priority)
    if let Some(ref url) = cli.url {
        builder = builder.with_url(url)?;
    }
    if let Some(ref version) = cli.api_version {
        builder = builder.with_api_version(version)?;
    }
    if let Some(ref token) = cli.token {
        builder = builder.with_token(token);
    }
    if let Some(ref format) = cli.format {
        let format_str = match format {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        };
        builder = builder.with_output_format(format_str)?;
    }
    if cli.verbose {
        builder = builder.with_verbose(true);
    }

    builder.build()
}
