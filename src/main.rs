use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use clab_api_config::config::{DEFAULT_ENV_FILE, Key, Resolution, resolve_layers};
use clab_api_config::logging::{init_logging, level_directive};

#[derive(Parser)]
#[command(name = "clab-api-config")]
#[command(
	author,
	version,
	about = "Resolve containerlab API server configuration from defaults, .env, and environment"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Path to the dotenv file (a missing default .env is not an error)
	#[arg(long, global = true, value_name = "PATH")]
	env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Display the effective configuration with the source of each value
	Show {
		/// Output format
		#[arg(long, value_enum, default_value_t = Format::Text)]
		format: Format,
	},
	/// Resolve the configuration and report errors without printing values
	Validate,
	/// List recognized keys and their built-in defaults
	Keys,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
	Text,
	Toml,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Show { format } => handle_show(cli.env_file, format),
		Commands::Validate => handle_validate(cli.env_file),
		Commands::Keys => handle_keys(),
	}
}

/// Resolve, then bring up logging from the resolved level.
fn load(env_file: Option<PathBuf>) -> Result<Resolution> {
	let resolution = resolve_layers(env_file.as_deref())?;
	let config = &resolution.config;

	init_logging(config.log_level())
		.map_err(|e| anyhow::anyhow!(e))
		.context("Failed to initialize logging")?;

	if level_directive(config.log_level()).is_none() {
		tracing::warn!(level = config.log_level(), "unrecognized LOG_LEVEL, using info");
	}
	if config.jwt_secret_is_default() {
		tracing::warn!("JWT_SECRET is the built-in default; set it before exposing the API");
	}

	Ok(resolution)
}

fn handle_show(env_file: Option<PathBuf>, format: Format) -> Result<ExitCode> {
	let resolution = load(env_file).context("Failed to resolve configuration")?;

	match format {
		Format::Toml => {
			let rendered =
				toml::to_string(&resolution.config).context("Failed to render configuration")?;
			print!("{}", rendered);
		}
		Format::Text => {
			match resolution.file {
				Some(ref path) => println!("# Config file: {}", path.display()),
				None => println!("# Config file: {} (not found)", DEFAULT_ENV_FILE),
			}
			for key in Key::ALL {
				println!(
					"{}={}  # {}",
					key,
					resolution.config.display_value(key),
					resolution.source(key)
				);
			}
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_validate(env_file: Option<PathBuf>) -> Result<ExitCode> {
	match load(env_file) {
		Ok(resolution) => {
			println!("Configuration is valid");
			if let Some(ref path) = resolution.file {
				println!("  file: {}", path.display());
			}
			for name in &resolution.unknown_keys {
				println!("  ignored unknown key: {}", name);
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {:#}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_keys() -> Result<ExitCode> {
	for key in Key::ALL {
		let default = if key.is_secret() {
			"<redacted>"
		} else {
			key.default_value()
		};
		println!("{}={:?}", key, default);
	}
	Ok(ExitCode::SUCCESS)
}
