use crate::config::decode::decode_config;
use crate::config::parser::{ParsedEnvFile, parse_env_file};
use crate::config::types::{EnvFile, Key, ResolvedConfig};
use crate::error::{ErrorKind, ResolveError, Result};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where environment overrides are read from.
pub trait EnvSource {
	/// Value of `name` if it is set, even when set to the empty string.
	fn var(&self, name: &str) -> Option<OsString>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
	fn var(&self, name: &str) -> Option<OsString> {
		std::env::var_os(name)
	}
}

impl EnvSource for HashMap<String, String> {
	fn var(&self, name: &str) -> Option<OsString> {
		self.get(name).map(OsString::from)
	}
}

/// The layer that supplied a key's final value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
	Default,
	File(PathBuf),
	Environment,
}

impl std::fmt::Display for Source {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Source::Default => f.write_str("default"),
			Source::File(path) => write!(f, "file {}", path.display()),
			Source::Environment => f.write_str("environment"),
		}
	}
}

/// A resolved config together with where each value came from.
#[derive(Debug, Clone)]
pub struct Resolution {
	/// The decoded record.
	pub config: ResolvedConfig,

	/// Winning layer for every recognized key.
	pub sources: BTreeMap<Key, Source>,

	/// The file that was loaded, if one was found.
	pub file: Option<PathBuf>,

	/// Unrecognized names assigned in the loaded file.
	pub unknown_keys: Vec<String>,
}

impl Resolution {
	pub fn source(&self, key: Key) -> &Source {
		self.sources.get(&key).unwrap_or(&Source::Default)
	}
}

/// Resolve the configuration from defaults, `file_path`, and the process environment.
///
/// Precedence, lowest to highest:
/// 1. Built-in defaults for every key
/// 2. Values from the dotenv file (`.env` when `file_path` is `None`)
/// 3. Environment variables with the exact key names
///
/// A missing default file is skipped; a missing explicit file is an error.
pub fn resolve(file_path: Option<&Path>) -> Result<ResolvedConfig> {
	resolve_with_env(file_path, &ProcessEnv)
}

/// Same as [`resolve`], reading overrides from `env` instead of the process.
pub fn resolve_with_env(file_path: Option<&Path>, env: &impl EnvSource) -> Result<ResolvedConfig> {
	resolve_layers_with_env(file_path, env).map(|resolution| resolution.config)
}

/// Resolve against the process environment, keeping per-key provenance.
pub fn resolve_layers(file_path: Option<&Path>) -> Result<Resolution> {
	resolve_layers_with_env(file_path, &ProcessEnv)
}

/// Resolve against `env`, keeping per-key provenance.
pub fn resolve_layers_with_env(file_path: Option<&Path>, env: &impl EnvSource) -> Result<Resolution> {
	let env_file = EnvFile::from_arg(file_path);

	let mut values: BTreeMap<Key, String> = Key::ALL
		.into_iter()
		.map(|key| (key, key.default_value().to_string()))
		.collect();
	let mut sources: BTreeMap<Key, Source> =
		Key::ALL.into_iter().map(|key| (key, Source::Default)).collect();

	let parsed = load_env_file(&env_file)?;
	let (file, unknown_keys) = match parsed {
		Some(parsed) => {
			for (key, value) in parsed.values {
				tracing::debug!(key = key.name(), path = %parsed.path.display(), "value set from file");
				values.insert(key, value);
				sources.insert(key, Source::File(parsed.path.clone()));
			}
			(Some(parsed.path), parsed.unknown_keys)
		}
		None => (None, Vec::new()),
	};

	apply_env_overrides(&mut values, &mut sources, env)?;

	let config = decode_config(&values)?;

	Ok(Resolution {
		config,
		sources,
		file,
		unknown_keys,
	})
}

/// Load the selected file, treating a missing default file as absent.
fn load_env_file(env_file: &EnvFile) -> Result<Option<ParsedEnvFile>> {
	match parse_env_file(env_file.path()) {
		Ok(parsed) => Ok(Some(parsed)),
		Err(e) if e.kind() == ErrorKind::FileNotFound && env_file.is_default() => {
			tracing::debug!(
				path = %env_file.path().display(),
				"default config file not found, using defaults and environment"
			);
			Ok(None)
		}
		Err(e) => Err(e),
	}
}

fn apply_env_overrides(
	values: &mut BTreeMap<Key, String>,
	sources: &mut BTreeMap<Key, Source>,
	env: &impl EnvSource,
) -> Result<()> {
	for key in Key::ALL {
		let Some(raw) = env.var(key.name()) else {
			continue;
		};

		let value = raw.into_string().map_err(|raw| {
			ResolveError::decode(
				key.name(),
				raw.to_string_lossy(),
				"environment value is not valid unicode",
			)
		})?;

		tracing::debug!(key = key.name(), "value set from environment");
		values.insert(key, value);
		sources.insert(key, Source::Environment);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use std::time::Duration;

	fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn write_env(dir: &Path, content: &str) -> PathBuf {
		let path = dir.join("api.env");
		fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn test_defaults_when_file_and_env_absent() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "");

		let config = resolve_with_env(Some(&path), &env(&[])).unwrap();

		assert_eq!(config.api_port(), "8080");
		assert_eq!(config.jwt_secret(), "default_secret_change_me");
		assert!(config.jwt_secret_is_default());
		assert_eq!(config.jwt_expiration(), Duration::from_secs(60 * 60));
		assert_eq!(config.api_user_group(), "");
		assert_eq!(config.superuser_group(), "");
		assert_eq!(config.clab_runtime(), "docker");
		assert_eq!(config.log_level(), "info");
		assert!(!config.tls_enable());
		assert_eq!(config.tls_cert_file(), "");
		assert_eq!(config.tls_key_file(), "");
		assert_eq!(config.gin_mode(), "debug");
		assert_eq!(config.trusted_proxies_raw(), "");
	}

	#[test]
	fn test_file_overrides_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(
			dir.path(),
			"API_PORT=9443\nCLAB_RUNTIME=podman\nTLS_ENABLE=true\nGIN_MODE=release\n",
		);

		let config = resolve_with_env(Some(&path), &env(&[])).unwrap();

		assert_eq!(config.api_port(), "9443");
		assert_eq!(config.clab_runtime(), "podman");
		assert!(config.tls_enable());
		assert_eq!(config.gin_mode(), "release");
		assert_eq!(config.log_level(), "info");
	}

	#[test]
	fn test_env_overrides_file_and_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "API_PORT=9443\nLOG_LEVEL=warn\n");

		let config = resolve_with_env(
			Some(&path),
			&env(&[("API_PORT", "7000"), ("SUPERUSER_GROUP", "clab_admins")]),
		)
		.unwrap();

		assert_eq!(config.api_port(), "7000");
		assert_eq!(config.superuser_group(), "clab_admins");
		assert_eq!(config.log_level(), "warn");
	}

	#[test]
	fn test_empty_env_value_counts_as_set() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "API_USER_GROUP=clab_users\n");

		let config = resolve_with_env(Some(&path), &env(&[("API_USER_GROUP", "")])).unwrap();
		assert_eq!(config.api_user_group(), "");
	}

	#[test]
	fn test_expiration_minutes_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "JWT_EXPIRATION_MINUTES=10\n");

		let config = resolve_with_env(Some(&path), &env(&[])).unwrap();
		assert_eq!(config.jwt_expiration(), Duration::from_secs(600));
	}

	#[test]
	fn test_expiration_minutes_from_env() {
		let config = resolve_with_env(
			Some(Path::new("/no/such/dir/.env")),
			&env(&[("JWT_EXPIRATION_MINUTES", "10")]),
		);
		// explicit missing file still fails, environment does not rescue it
		assert_eq!(config.unwrap_err().kind(), ErrorKind::FileNotFound);

		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "JWT_EXPIRATION_MINUTES=30\n");
		let config =
			resolve_with_env(Some(&path), &env(&[("JWT_EXPIRATION_MINUTES", "10")])).unwrap();
		assert_eq!(config.jwt_expiration(), Duration::from_secs(600));
	}

	#[test]
	fn test_explicit_missing_file_is_not_found() {
		let err = resolve_with_env(Some(Path::new("/no/such/file")), &env(&[])).unwrap_err();

		assert_eq!(err.kind(), ErrorKind::FileNotFound);
		assert_eq!(err.path(), Some(Path::new("/no/such/file")));
	}

	#[test]
	fn test_directory_path_is_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = resolve_with_env(Some(dir.path()), &env(&[])).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::ParseError);
	}

	#[test]
	fn test_invalid_bool_in_file_is_decode_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "TLS_ENABLE=notabool\n");

		match resolve_with_env(Some(&path), &env(&[])).unwrap_err() {
			ResolveError::DecodeError { key, value, .. } => {
				assert_eq!(key, "TLS_ENABLE");
				assert_eq!(value, "notabool");
			}
			other => panic!("Expected DecodeError, got {other:?}"),
		}
	}

	#[test]
	fn test_invalid_env_value_is_decode_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "");

		let err = resolve_with_env(Some(&path), &env(&[("JWT_EXPIRATION_MINUTES", "soon")]))
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::DecodeError);
	}

	#[test]
	fn test_comment_only_values_resolve_empty() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(
			dir.path(),
			"TLS_ENABLE= # set later\nAPI_USER_GROUP=   # none\n",
		);

		let config = resolve_with_env(Some(&path), &env(&[])).unwrap();
		assert!(!config.tls_enable());
		assert_eq!(config.api_user_group(), "");
	}

	#[test]
	fn test_env_fixes_bad_file_value() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "TLS_ENABLE=maybe\n");

		let config = resolve_with_env(Some(&path), &env(&[("TLS_ENABLE", "TRUE")])).unwrap();
		assert!(config.tls_enable());
	}

	#[test]
	fn test_malformed_syntax_is_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "JWT_SECRET='unterminated\n");

		let err = resolve_with_env(Some(&path), &env(&[])).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::ParseError);
		assert_eq!(err.path(), Some(path.as_path()));
	}

	#[test]
	fn test_resolutions_are_independent() {
		let dir = tempfile::tempdir().unwrap();
		let first_path = dir.path().join("first.env");
		let second_path = dir.path().join("second.env");
		fs::write(&first_path, "API_PORT=1111\nTLS_ENABLE=true\n").unwrap();
		fs::write(&second_path, "GIN_MODE=release\n").unwrap();

		let first = resolve_with_env(Some(&first_path), &env(&[("LOG_LEVEL", "debug")])).unwrap();
		let second = resolve_with_env(Some(&second_path), &env(&[])).unwrap();

		assert_eq!(first.api_port(), "1111");
		assert!(first.tls_enable());
		assert_eq!(first.log_level(), "debug");
		assert_eq!(first.gin_mode(), "debug");

		assert_eq!(second.api_port(), "8080");
		assert!(!second.tls_enable());
		assert_eq!(second.log_level(), "info");
		assert_eq!(second.gin_mode(), "release");
	}

	#[test]
	fn test_sources_track_winning_layer() {
		let dir = tempfile::tempdir().unwrap();
		let path = write_env(dir.path(), "API_PORT=9443\nGIN_MODE=release\nEXTRA=1\n");

		let resolution =
			resolve_layers_with_env(Some(&path), &env(&[("GIN_MODE", "test")])).unwrap();

		assert_eq!(resolution.source(Key::ApiPort), &Source::File(path.clone()));
		assert_eq!(resolution.source(Key::GinMode), &Source::Environment);
		assert_eq!(resolution.source(Key::LogLevel), &Source::Default);
		assert_eq!(resolution.file, Some(path));
		assert_eq!(resolution.unknown_keys, vec!["EXTRA".to_string()]);
		assert_eq!(resolution.config.gin_mode(), "test");
	}

	#[test]
	fn test_source_display() {
		assert_eq!(Source::Default.to_string(), "default");
		assert_eq!(Source::Environment.to_string(), "environment");
		assert_eq!(
			Source::File(PathBuf::from("/etc/api.env")).to_string(),
			"file /etc/api.env"
		);
	}
}
