//! Typed decoding of the merged key space.
//!
//! One rule per field type: strings pass through, booleans accept only
//! `true`/`false` (any case) with an empty value meaning `false`, and the
//! expiration is an unsigned count of minutes converted to a [`Duration`]
//! here and nowhere else.

use crate::config::types::{Key, ResolvedConfig};
use crate::error::{ResolveError, Result};
use std::collections::BTreeMap;
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;

/// Decode merged values into the typed record.
pub fn decode_config(values: &BTreeMap<Key, String>) -> Result<ResolvedConfig> {
	let minutes = decode_minutes(
		Key::JwtExpirationMinutes,
		raw(values, Key::JwtExpirationMinutes),
	)?;

	Ok(ResolvedConfig {
		api_port: decode_string(values, Key::ApiPort),
		jwt_secret: decode_string(values, Key::JwtSecret),
		jwt_expiration: minutes_to_duration(minutes)?,
		api_user_group: decode_string(values, Key::ApiUserGroup),
		superuser_group: decode_string(values, Key::SuperuserGroup),
		clab_runtime: decode_string(values, Key::ClabRuntime),
		log_level: decode_string(values, Key::LogLevel),
		tls_enable: decode_bool(Key::TlsEnable, raw(values, Key::TlsEnable))?,
		tls_cert_file: decode_string(values, Key::TlsCertFile),
		tls_key_file: decode_string(values, Key::TlsKeyFile),
		gin_mode: decode_string(values, Key::GinMode),
		trusted_proxies: decode_string(values, Key::TrustedProxies),
	})
}

fn raw(values: &BTreeMap<Key, String>, key: Key) -> &str {
	values
		.get(&key)
		.map(String::as_str)
		.unwrap_or_else(|| key.default_value())
}

fn decode_string(values: &BTreeMap<Key, String>, key: Key) -> String {
	raw(values, key).to_string()
}

pub(crate) fn decode_bool(key: Key, value: &str) -> Result<bool> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		Ok(false)
	} else if trimmed.eq_ignore_ascii_case("true") {
		Ok(true)
	} else if trimmed.eq_ignore_ascii_case("false") {
		Ok(false)
	} else {
		Err(ResolveError::decode(key.name(), value, "expected true or false"))
	}
}

pub(crate) fn decode_minutes(key: Key, value: &str) -> Result<u64> {
	value.trim().parse::<u64>().map_err(|e| {
		ResolveError::decode(
			key.name(),
			value,
			format!("expected a whole number of minutes: {e}"),
		)
	})
}

fn minutes_to_duration(minutes: u64) -> Result<Duration> {
	minutes
		.checked_mul(SECONDS_PER_MINUTE)
		.map(Duration::from_secs)
		.ok_or_else(|| {
			ResolveError::decode(
				Key::JwtExpirationMinutes.name(),
				minutes.to_string(),
				"expiration is too large",
			)
		})
}
