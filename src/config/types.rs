use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ResolveError, Result};

/// Canonical config file, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Default JWT signing key. Deployments are expected to override it.
pub const DEFAULT_JWT_SECRET: &str = "default_secret_change_me";

const REDACTED: &str = "<redacted>";

/// A recognized configuration key.
///
/// The set is closed: the file and environment layers only ever
/// contribute values for these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
	ApiPort,
	JwtSecret,
	JwtExpirationMinutes,
	ApiUserGroup,
	SuperuserGroup,
	ClabRuntime,
	LogLevel,
	TlsEnable,
	TlsCertFile,
	TlsKeyFile,
	GinMode,
	TrustedProxies,
}

impl Key {
	/// Every recognized key, in declaration order.
	pub const ALL: [Key; 12] = [
		Key::ApiPort,
		Key::JwtSecret,
		Key::JwtExpirationMinutes,
		Key::ApiUserGroup,
		Key::SuperuserGroup,
		Key::ClabRuntime,
		Key::LogLevel,
		Key::TlsEnable,
		Key::TlsCertFile,
		Key::TlsKeyFile,
		Key::GinMode,
		Key::TrustedProxies,
	];

	/// The exact variable name used in files and the environment.
	pub fn name(&self) -> &'static str {
		match self {
			Key::ApiPort => "API_PORT",
			Key::JwtSecret => "JWT_SECRET",
			Key::JwtExpirationMinutes => "JWT_EXPIRATION_MINUTES",
			Key::ApiUserGroup => "API_USER_GROUP",
			Key::SuperuserGroup => "SUPERUSER_GROUP",
			Key::ClabRuntime => "CLAB_RUNTIME",
			Key::LogLevel => "LOG_LEVEL",
			Key::TlsEnable => "TLS_ENABLE",
			Key::TlsCertFile => "TLS_CERT_FILE",
			Key::TlsKeyFile => "TLS_KEY_FILE",
			Key::GinMode => "GIN_MODE",
			Key::TrustedProxies => "TRUSTED_PROXIES",
		}
	}

	/// Look up a key by its exact (case-sensitive) name.
	pub fn from_name(name: &str) -> Option<Key> {
		Key::ALL.into_iter().find(|key| key.name() == name)
	}

	/// Built-in value used when neither the file nor the environment sets the key.
	pub fn default_value(&self) -> &'static str {
		match self {
			Key::ApiPort => "8080",
			Key::JwtSecret => DEFAULT_JWT_SECRET,
			Key::JwtExpirationMinutes => "60",
			Key::ApiUserGroup => "",
			Key::SuperuserGroup => "",
			Key::ClabRuntime => "docker",
			Key::LogLevel => "info",
			Key::TlsEnable => "false",
			Key::TlsCertFile => "",
			Key::TlsKeyFile => "",
			Key::GinMode => "debug",
			Key::TrustedProxies => "",
		}
	}

	/// Whether the value must never be printed or logged.
	pub fn is_secret(&self) -> bool {
		matches!(self, Key::JwtSecret)
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Which config file to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFile {
	/// The canonical `.env`; a missing file is not an error.
	Default,
	/// A caller-supplied path; a missing file is an error.
	Explicit(PathBuf),
}

impl EnvFile {
	/// Classify a caller-supplied path.
	///
	/// No path, an empty path, or the literal default name all select
	/// the canonical default.
	pub fn from_arg(path: Option<&Path>) -> Self {
		match path {
			None => EnvFile::Default,
			Some(p) if p.as_os_str().is_empty() || p == Path::new(DEFAULT_ENV_FILE) => {
				EnvFile::Default
			}
			Some(p) => EnvFile::Explicit(p.to_path_buf()),
		}
	}

	pub fn path(&self) -> &Path {
		match self {
			EnvFile::Default => Path::new(DEFAULT_ENV_FILE),
			EnvFile::Explicit(path) => path,
		}
	}

	pub fn is_default(&self) -> bool {
		matches!(self, EnvFile::Default)
	}
}

/// Proxy trust policy derived from `TRUSTED_PROXIES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustedProxies {
	/// Empty value: leave the web framework's default in place.
	Unset,
	/// Literal `nil`: trust no proxy.
	None,
	/// Comma-separated addresses or CIDRs.
	List(Vec<String>),
}

impl TrustedProxies {
	pub fn parse(raw: &str) -> Self {
		let trimmed = raw.trim();
		if trimmed.is_empty() {
			return TrustedProxies::Unset;
		}
		if trimmed == "nil" {
			return TrustedProxies::None;
		}

		let entries: Vec<String> = trimmed
			.split(',')
			.map(str::trim)
			.filter(|entry| !entry.is_empty())
			.map(str::to_string)
			.collect();

		if entries.is_empty() {
			TrustedProxies::Unset
		} else {
			TrustedProxies::List(entries)
		}
	}
}

/// Fully-populated configuration for the API server.
///
/// Built once at startup by [`crate::config::resolve`] and handed to every
/// component that needs it. There are no setters.
///
/// Serializes with the variable names as field names, the secret redacted,
/// and the expiration written back as whole minutes.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ResolvedConfig {
	pub(crate) api_port: String,
	#[serde(serialize_with = "redact")]
	pub(crate) jwt_secret: String,
	#[serde(rename = "JWT_EXPIRATION_MINUTES", serialize_with = "whole_minutes")]
	pub(crate) jwt_expiration: Duration,
	pub(crate) api_user_group: String,
	pub(crate) superuser_group: String,
	pub(crate) clab_runtime: String,
	pub(crate) log_level: String,
	pub(crate) tls_enable: bool,
	pub(crate) tls_cert_file: String,
	pub(crate) tls_key_file: String,
	pub(crate) gin_mode: String,
	pub(crate) trusted_proxies: String,
}

fn redact<S: Serializer>(_: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
	serializer.serialize_str(REDACTED)
}

fn whole_minutes<S: Serializer>(
	duration: &Duration,
	serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
	serializer.serialize_u64(duration.as_secs() / 60)
}

impl ResolvedConfig {
	/// Port to bind, as configured.
	pub fn api_port(&self) -> &str {
		&self.api_port
	}

	/// Port to bind, parsed.
	pub fn port(&self) -> Result<u16> {
		self.api_port.trim().parse().map_err(|_| {
			ResolveError::decode(
				Key::ApiPort.name(),
				self.api_port.as_str(),
				"expected a port number between 0 and 65535",
			)
		})
	}

	pub fn jwt_secret(&self) -> &str {
		&self.jwt_secret
	}

	/// True while the built-in signing key is in effect.
	pub fn jwt_secret_is_default(&self) -> bool {
		self.jwt_secret == DEFAULT_JWT_SECRET
	}

	/// Token lifetime, already converted from minutes.
	pub fn jwt_expiration(&self) -> Duration {
		self.jwt_expiration
	}

	pub fn api_user_group(&self) -> &str {
		&self.api_user_group
	}

	pub fn superuser_group(&self) -> &str {
		&self.superuser_group
	}

	pub fn clab_runtime(&self) -> &str {
		&self.clab_runtime
	}

	pub fn log_level(&self) -> &str {
		&self.log_level
	}

	pub fn tls_enable(&self) -> bool {
		self.tls_enable
	}

	pub fn tls_cert_file(&self) -> &str {
		&self.tls_cert_file
	}

	pub fn tls_key_file(&self) -> &str {
		&self.tls_key_file
	}

	pub fn gin_mode(&self) -> &str {
		&self.gin_mode
	}

	/// Raw `TRUSTED_PROXIES` value.
	pub fn trusted_proxies_raw(&self) -> &str {
		&self.trusted_proxies
	}

	pub fn trusted_proxies(&self) -> TrustedProxies {
		TrustedProxies::parse(&self.trusted_proxies)
	}

	/// Display form of a single key, with secrets redacted.
	pub fn display_value(&self, key: Key) -> String {
		match key {
			Key::ApiPort => self.api_port.clone(),
			Key::JwtSecret => REDACTED.to_string(),
			Key::JwtExpirationMinutes => self.expiration_minutes().to_string(),
			Key::ApiUserGroup => self.api_user_group.clone(),
			Key::SuperuserGroup => self.superuser_group.clone(),
			Key::ClabRuntime => self.clab_runtime.clone(),
			Key::LogLevel => self.log_level.clone(),
			Key::TlsEnable => self.tls_enable.to_string(),
			Key::TlsCertFile => self.tls_cert_file.clone(),
			Key::TlsKeyFile => self.tls_key_file.clone(),
			Key::GinMode => self.gin_mode.clone(),
			Key::TrustedProxies => self.trusted_proxies.clone(),
		}
	}

	fn expiration_minutes(&self) -> u64 {
		self.jwt_expiration.as_secs() / 60
	}
}

impl fmt::Debug for ResolvedConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedConfig")
			.field("api_port", &self.api_port)
			.field("jwt_secret", &REDACTED)
			.field("jwt_expiration", &self.jwt_expiration)
			.field("api_user_group", &self.api_user_group)
			.field("superuser_group", &self.superuser_group)
			.field("clab_runtime", &self.clab_runtime)
			.field("log_level", &self.log_level)
			.field("tls_enable", &self.tls_enable)
			.field("tls_cert_file", &self.tls_cert_file)
			.field("tls_key_file", &self.tls_key_file)
			.field("gin_mode", &self.gin_mode)
			.field("trusted_proxies", &self.trusted_proxies)
			.finish()
	}
}
