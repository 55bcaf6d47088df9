use std::{net::IpAddr, path::PathBuf, str::FromStr};

use tracing::Level;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/blog.db";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} must be {expected}, got {value:?}")]
	Invalid {
		name: &'static str,
		expected: &'static str,
		value: String,
	},
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub host: IpAddr,
	pub port: u16,
	pub media_root: PathBuf,
	pub max_upload_bytes: usize,
	pub trace: TraceConfig,
}

#[derive(Debug, Clone)]
pub struct TraceConfig {
	pub level: Level,
	/// Export spans and metrics over OTLP in addition to logging them.
	pub otel: bool,
}

impl Default for TraceConfig {
	fn default() -> Self {
		Self {
			level: Level::INFO,
			otel: false,
		}
	}
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
	where
		F: Fn(&str) -> Option<String>,
	{
		Ok(Self {
			database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
			host: parse(&lookup, "HOST", "an IP address")?.unwrap_or(IpAddr::from([127, 0, 0, 1])),
			port: parse(&lookup, "PORT", "a port number")?.unwrap_or(3000),
			media_root: lookup("MEDIA_ROOT").map_or_else(|| DEFAULT_MEDIA_ROOT.into(), PathBuf::from),
			max_upload_bytes: parse(&lookup, "MAX_UPLOAD_BYTES", "a number of bytes")?
				.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
			trace: TraceConfig {
				level: parse(&lookup, "LOG_LEVEL", "one of trace, debug, info, warn or error")?
					.unwrap_or(Level::INFO),
				otel: parse_bool(&lookup, "OTEL_ENABLED")?.unwrap_or(false),
			},
		})
	}
}

fn parse<F, T>(lookup: &F, name: &'static str, expected: &'static str) -> Result<Option<T>, Error>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr,
{
	let Some(value) = lookup(name) else {
		return Ok(None);
	};

	value
		.trim()
		.parse()
		.map(Some)
		.map_err(|_| Error::Invalid {
			name,
			expected,
			value,
		})
}

fn parse_bool<F>(lookup: &F, name: &'static str) -> Result<Option<bool>, Error>
where
	F: Fn(&str) -> Option<String>,
{
	let Some(value) = lookup(name) else {
		return Ok(None);
	};

	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(Some(true)),
		"0" | "false" | "no" | "off" | "" => Ok(Some(false)),
		_ => Err(Error::Invalid {
			name,
			expected: "a boolean",
			value,
		}),
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use tracing::Level;

	use super::{Config, Error, DEFAULT_DATABASE_URL, DEFAULT_MAX_UPLOAD_BYTES};

	fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
		let vars = vars
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[]).unwrap();

		assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
		assert_eq!(config.host.to_string(), "127.0.0.1");
		assert_eq!(config.port, 3000);
		assert_eq!(config.media_root.to_str(), Some("media"));
		assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
		assert_eq!(config.trace.level, Level::INFO);
		assert!(!config.trace.otel);
	}

	#[test]
	fn test_overrides() {
		let config = config(&[
			("HOST", "0.0.0.0"),
			("PORT", "8080"),
			("LOG_LEVEL", "debug"),
			("OTEL_ENABLED", "true"),
			("MAX_UPLOAD_BYTES", "1024"),
		])
		.unwrap();

		assert_eq!(config.host.to_string(), "0.0.0.0");
		assert_eq!(config.port, 8080);
		assert_eq!(config.trace.level, Level::DEBUG);
		assert!(config.trace.otel);
		assert_eq!(config.max_upload_bytes, 1024);
	}

	#[test]
	fn test_invalid_values() {
		assert!(matches!(
			config(&[("PORT", "http")]),
			Err(Error::Invalid { name: "PORT", .. })
		));
		assert!(matches!(
			config(&[("OTEL_ENABLED", "maybe")]),
			Err(Error::Invalid {
				name: "OTEL_ENABLED",
				..
			})
		));
	}
}
