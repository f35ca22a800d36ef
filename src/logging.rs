//! Logging setup driven by the resolved `LOG_LEVEL`.
//!
//! `RUST_LOG` wins when it is set, so a single run can be made noisier
//! without touching the config file.

use tracing_subscriber::EnvFilter;

/// Map a `LOG_LEVEL` name to a tracing level directive.
///
/// Accepts the usual names in any case, plus `warning`, `fatal`, and
/// `panic` as spelled by other services sharing the same `.env`.
pub fn level_directive(level: &str) -> Option<&'static str> {
	match level.trim().to_ascii_lowercase().as_str() {
		"trace" => Some("trace"),
		"debug" => Some("debug"),
		"info" => Some("info"),
		"warn" | "warning" => Some("warn"),
		"error" | "fatal" | "panic" => Some("error"),
		"off" => Some("off"),
		_ => None,
	}
}

/// Build the filter: `RUST_LOG` if present, else `level`, else `info`.
pub fn build_filter(level: &str) -> EnvFilter {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return filter;
	}
	EnvFilter::new(level_directive(level).unwrap_or("info"))
}

/// Install the global subscriber, writing to stderr.
pub fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	tracing_subscriber::fmt()
		.with_env_filter(build_filter(level))
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_level_directive() {
		assert_eq!(level_directive("info"), Some("info"));
		assert_eq!(level_directive("DEBUG"), Some("debug"));
		assert_eq!(level_directive(" warning "), Some("warn"));
		assert_eq!(level_directive("fatal"), Some("error"));
		assert_eq!(level_directive("off"), Some("off"));
		assert_eq!(level_directive("loud"), None);
		assert_eq!(level_directive(""), None);
	}

	#[test]
	fn test_second_init_reports_error() {
		// Only this test installs a global subscriber in the unit test binary.
		init_logging("info").unwrap();
		assert!(init_logging("debug").is_err());
	}
}
