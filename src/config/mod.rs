//! Configuration resolution for the containerlab API server.
//!
//! This module handles:
//! - The fixed key set and its built-in defaults
//! - Dotenv-style file parsing
//! - Environment overlay and typed decoding

pub mod cascade;
pub mod decode;
pub mod parser;
pub mod types;

pub use cascade::{
	EnvSource, ProcessEnv, Resolution, Source, resolve, resolve_layers, resolve_layers_with_env,
	resolve_with_env,
};
pub use decode::decode_config;
pub use parser::{ParsedEnvFile, parse_env_file, parse_env_str};
pub use types::{DEFAULT_ENV_FILE, DEFAULT_JWT_SECRET, EnvFile, Key, ResolvedConfig, TrustedProxies};
