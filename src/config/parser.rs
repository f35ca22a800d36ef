use crate::config::types::Key;
use crate::error::{ResolveError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Recognized assignments read from a dotenv-style file.
#[derive(Debug, Clone, Default)]
pub struct ParsedEnvFile {
	/// The path this file was loaded from.
	pub path: PathBuf,

	/// Last assignment for each recognized key.
	pub values: BTreeMap<Key, String>,

	/// Assigned names that are not recognized keys, in first-seen order.
	pub unknown_keys: Vec<String>,
}

/// Parse a dotenv-style file from the given path.
pub fn parse_env_file(path: &Path) -> Result<ParsedEnvFile> {
	let content = std::fs::read_to_string(path).map_err(|source| {
		if source.kind() == std::io::ErrorKind::NotFound {
			ResolveError::FileNotFound {
				path: path.to_path_buf(),
			}
		} else {
			ResolveError::ReadError {
				path: path.to_path_buf(),
				source,
			}
		}
	})?;

	parse_env_str(&content, path)
}

/// Parse dotenv-style content (useful for testing).
///
/// Each line goes through `dotenvy` on its own so failures keep their line
/// number. Blank lines and comments are skipped. A line `dotenvy` rejects is
/// an error only when it assigns a recognized key; otherwise it is ignored.
pub fn parse_env_str(content: &str, path: &Path) -> Result<ParsedEnvFile> {
	let mut parsed = ParsedEnvFile {
		path: path.to_path_buf(),
		..Default::default()
	};

	for (index, line) in content.lines().enumerate() {
		let line_no = index + 1;

		for item in dotenvy::from_read_iter(line.as_bytes()) {
			match item {
				Ok((name, value)) => record(&mut parsed, name, value, line_no),
				Err(e) => {
					let Some(key) = assigned_name(line).and_then(Key::from_name) else {
						tracing::debug!(path = %path.display(), line = line_no, "ignoring malformed line");
						continue;
					};

					// The value may be a secret, so the dotenvy message is not echoed.
					let message = match e {
						dotenvy::Error::LineParse(_, position) => {
							format!("{key}: invalid value syntax at index {position}")
						}
						_ => format!("{key}: invalid value syntax"),
					};
					return Err(ResolveError::ParseError {
						path: path.to_path_buf(),
						line: line_no,
						message,
					});
				}
			}
		}
	}

	Ok(parsed)
}

fn record(parsed: &mut ParsedEnvFile, name: String, value: String, line_no: usize) {
	match Key::from_name(&name) {
		Some(key) => {
			parsed.values.insert(key, value);
		}
		None => {
			tracing::debug!(path = %parsed.path.display(), line = line_no, key = %name, "ignoring unrecognized key");
			if !parsed.unknown_keys.contains(&name) {
				parsed.unknown_keys.push(name);
			}
		}
	}
}

/// Name on the left of `=` in a line `dotenvy` could not parse.
fn assigned_name(line: &str) -> Option<&str> {
	let line = line.trim_start();
	let line = match line.strip_prefix("export") {
		Some(rest) if rest.starts_with(char::is_whitespace) => rest,
		_ => line,
	};
	let (name, _) = line.split_once('=')?;
	Some(name.trim())
}
