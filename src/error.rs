use std::path::{Path, PathBuf};

/// The three ways a resolution can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// An explicitly requested config file does not exist.
	FileNotFound,
	/// The config file could not be read or contains malformed syntax.
	ParseError,
	/// A merged value could not be coerced into its field type.
	DecodeError,
}

/// Library-level structured errors for configuration resolution.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
	#[error("Config file not found: {path}")]
	FileNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path} (line {line}: {message})")]
	ParseError {
		path: PathBuf,
		line: usize,
		message: String,
	},

	#[error("Invalid value for {key}: {value:?} ({reason})")]
	DecodeError {
		key: &'static str,
		value: String,
		reason: String,
	},
}

impl ResolveError {
	/// Classify this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			ResolveError::FileNotFound { .. } => ErrorKind::FileNotFound,
			ResolveError::ReadError { .. } | ResolveError::ParseError { .. } => {
				ErrorKind::ParseError
			}
			ResolveError::DecodeError { .. } => ErrorKind::DecodeError,
		}
	}

	/// The file the error refers to, if any.
	pub fn path(&self) -> Option<&Path> {
		match self {
			ResolveError::FileNotFound { path }
			| ResolveError::ReadError { path, .. }
			| ResolveError::ParseError { path, .. } => Some(path),
			ResolveError::DecodeError { .. } => None,
		}
	}

	pub(crate) fn decode(
		key: &'static str,
		value: impl Into<String>,
		reason: impl Into<String>,
	) -> Self {
		ResolveError::DecodeError {
			key,
			value: value.into(),
			reason: reason.into(),
		}
	}
}

/// Result type alias using ResolveError.
pub type Result<T> = std::result::Result<T, ResolveError>;
