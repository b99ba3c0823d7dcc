//! Configuration module for the order registry.
//!
//! Configuration is loaded from TOML files. `${VAR}` and `${VAR:-default}`
//! placeholders are resolved from the environment before parsing, and the
//! result is validated so that a registry never starts without an admin or
//! with an empty signer set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use regex::Regex;
use registry_types::{Address, QuorumPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Registry instance settings.
	pub registry: RegistryConfig,
	/// Genesis roles and signer set.
	pub access: AccessConfig,
	/// Quorum policy for consensus submission.
	#[serde(default)]
	pub consensus: ConsensusConfig,
	/// Digest algorithm selection.
	pub commitment: CommitmentConfig,
	/// Storage backend selection.
	pub storage: StorageConfig,
	/// HTTP API server settings.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the registry instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
	/// Unique identifier for this registry instance.
	pub id: String,
	/// Whether `getOrder` is open to any caller. When false, only signers
	/// and admins may read orders.
	#[serde(default = "default_public_reads")]
	pub public_reads: bool,
}

fn default_public_reads() -> bool {
	true
}

/// Initial access-control state, applied only when storage holds no access
/// table yet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessConfig {
	/// Accounts granted the admin role at genesis.
	pub admins: Vec<Address>,
	/// Initial signer set. Must not be empty.
	pub signers: Vec<Address>,
}

/// Quorum policy names accepted in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuorumPolicyKind {
	Fixed,
	#[default]
	Majority,
}

/// Configuration for consensus submission.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConsensusConfig {
	#[serde(default)]
	pub policy: QuorumPolicyKind,
	/// Required approvals; only valid with the fixed policy.
	pub threshold: Option<usize>,
}

impl ConsensusConfig {
	/// Resolves the configured policy. Call after validation.
	pub fn quorum_policy(&self) -> QuorumPolicy {
		match self.policy {
			QuorumPolicyKind::Fixed => QuorumPolicy::Fixed(self.threshold.unwrap_or(1)),
			QuorumPolicyKind::Majority => QuorumPolicy::Majority,
		}
	}
}

/// Configuration for the digest algorithm.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommitmentConfig {
	/// Which implementation to use as primary.
	#[serde(default = "default_commitment")]
	pub primary: String,
	/// Map of commitment implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

fn default_commitment() -> String {
	"sha256".to_string()
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Header carrying the authenticated caller address, set by the gateway
	/// in front of the registry.
	#[serde(default = "default_caller_header")]
	pub caller_header: String,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_caller_header() -> String {
	"x-registry-caller".to_string()
}

fn default_max_request_size() -> usize {
	64 * 1024
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Whether the HTTP API should be started.
	pub fn api_enabled(&self) -> bool {
		self.api.as_ref().is_some_and(|api| api.enabled)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.registry.id.trim().is_empty() {
			return Err(ConfigError::Validation("Registry ID cannot be empty".into()));
		}

		self.validate_access()?;
		self.validate_consensus()?;

		// Validate storage config
		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;

		// Validate commitment config
		validate_primary(
			"commitment",
			&self.commitment.primary,
			&self.commitment.implementations,
		)?;

		// Validate API config if enabled
		if let Some(api) = self.api.as_ref().filter(|api| api.enabled) {
			let header = api.caller_header.as_str();
			let valid_header = !header.is_empty()
				&& header
					.chars()
					.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
			if !valid_header {
				return Err(ConfigError::Validation(format!(
					"API caller_header '{}' must be a non-empty lowercase header name",
					header
				)));
			}
			if api.max_request_size == 0 {
				return Err(ConfigError::Validation(
					"API max_request_size must be greater than 0".into(),
				));
			}
		}

		Ok(())
	}

	/// Genesis access rules: at least one admin (lockout protection) and a
	/// non-empty signer set, each without duplicates.
	fn validate_access(&self) -> Result<(), ConfigError> {
		if self.access.admins.is_empty() {
			return Err(ConfigError::Validation(
				"At least one admin must be configured".into(),
			));
		}
		if self.access.signers.is_empty() {
			return Err(ConfigError::Validation(
				"Signer set cannot be empty".into(),
			));
		}

		for (section, accounts) in [
			("admins", &self.access.admins),
			("signers", &self.access.signers),
		] {
			let mut seen = HashSet::new();
			for account in accounts {
				if account.is_zero() {
					return Err(ConfigError::Validation(format!(
						"access.{} cannot contain the zero address",
						section
					)));
				}
				if !seen.insert(account) {
					return Err(ConfigError::Validation(format!(
						"Duplicate account {} in access.{}",
						account, section
					)));
				}
			}
		}

		Ok(())
	}

	fn validate_consensus(&self) -> Result<(), ConfigError> {
		match (self.consensus.policy, self.consensus.threshold) {
			(QuorumPolicyKind::Fixed, None) => Err(ConfigError::Validation(
				"consensus.threshold is required with the fixed policy".into(),
			)),
			(QuorumPolicyKind::Fixed, Some(threshold)) => {
				let signers = self.access.signers.len();
				if threshold == 0 || threshold > signers {
					return Err(ConfigError::Validation(format!(
						"consensus.threshold must be between 1 and the number of signers ({}), got {}",
						signers, threshold
					)));
				}
				Ok(())
			},
			(QuorumPolicyKind::Majority, Some(_)) => Err(ConfigError::Validation(
				"consensus.threshold is only valid with the fixed policy".into(),
			)),
			(QuorumPolicyKind::Majority, None) => Ok(()),
		}
	}
}

fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses a TOML string, resolving environment variables and validating the
/// result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ADMIN: &str = "0x1111111111111111111111111111111111111111";

	fn config_with(consensus: &str) -> String {
		format!(
			r#"
[registry]
id = "test-registry"

[access]
admins = ["{admin}"]
signers = [
	"0x2222222222222222222222222222222222222222",
	"0x3333333333333333333333333333333333333333",
	"0x4444444444444444444444444444444444444444",
]

{consensus}

[commitment]
[commitment.implementations.sha256]

[storage]
primary = "memory"
[storage.implementations.memory]
"#,
			admin = ADMIN,
			consensus = consensus
		)
	}

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("REGISTRY_TEST_HOST", "localhost");
		std::env::set_var("REGISTRY_TEST_PORT", "5432");

		let input = "host = \"${REGISTRY_TEST_HOST}:${REGISTRY_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("REGISTRY_TEST_HOST");
		std::env::remove_var("REGISTRY_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${REGISTRY_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${REGISTRY_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("REGISTRY_MISSING_VAR"));
	}

	#[test]
	fn test_defaults() {
		let config: Config = config_with("").parse().unwrap();
		assert_eq!(config.registry.id, "test-registry");
		assert!(config.registry.public_reads);
		assert_eq!(config.commitment.primary, "sha256");
		assert_eq!(config.consensus.quorum_policy(), QuorumPolicy::Majority);
		assert!(!config.api_enabled());
		assert_eq!(
			config.access.admins[0],
			ADMIN.parse::<Address>().unwrap()
		);
	}

	#[test]
	fn test_admin_from_env() {
		std::env::set_var("REGISTRY_TEST_ADMIN", ADMIN);
		let src = config_with("").replace(ADMIN, "${REGISTRY_TEST_ADMIN}");
		let config: Config = src.parse().unwrap();
		assert_eq!(config.access.admins.len(), 1);
		std::env::remove_var("REGISTRY_TEST_ADMIN");
	}

	#[test]
	fn test_fixed_quorum() {
		let config: Config = config_with("[consensus]\npolicy = \"fixed\"\nthreshold = 2")
			.parse()
			.unwrap();
		assert_eq!(config.consensus.quorum_policy(), QuorumPolicy::Fixed(2));
	}

	#[test]
	fn test_fixed_quorum_bounds() {
		let too_high =
			Config::from_str(&config_with("[consensus]\npolicy = \"fixed\"\nthreshold = 4"));
		assert!(too_high.unwrap_err().to_string().contains("between 1 and"));

		let missing = Config::from_str(&config_with("[consensus]\npolicy = \"fixed\""));
		assert!(missing.unwrap_err().to_string().contains("required"));

		let stray = Config::from_str(&config_with("[consensus]\nthreshold = 2"));
		assert!(stray.unwrap_err().to_string().contains("only valid"));
	}

	#[test]
	fn test_empty_signer_set_rejected() {
		let src = r#"
[registry]
id = "r"
[access]
admins = ["0x1111111111111111111111111111111111111111"]
signers = []
[commitment]
[commitment.implementations.sha256]
[storage]
primary = "memory"
[storage.implementations.memory]
"#;
		let err = Config::from_str(src).unwrap_err();
		assert!(err.to_string().contains("Signer set cannot be empty"));
	}

	#[test]
	fn test_duplicate_signer_rejected() {
		let src = config_with("").replace(
			"0x4444444444444444444444444444444444444444",
			"0x3333333333333333333333333333333333333333",
		);
		let err = Config::from_str(&src).unwrap_err();
		assert!(err.to_string().contains("Duplicate account"));
	}

	#[test]
	fn test_unknown_primary_storage() {
		let src = config_with("").replace("primary = \"memory\"", "primary = \"file\"");
		let err = Config::from_str(&src).unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file' not found"));
	}

	#[test]
	fn test_invalid_address() {
		let src = config_with("").replace(ADMIN, "0x1234");
		assert!(matches!(Config::from_str(&src), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_api_caller_header_validation() {
		let src = format!(
			"{}\n[api]\nenabled = true\ncaller_header = \"X Caller\"\n",
			config_with("")
		);
		let err = Config::from_str(&src).unwrap_err();
		assert!(err.to_string().contains("caller_header"));

		let ok = format!("{}\n[api]\nenabled = true\nport = 8080\n", config_with(""));
		let config = Config::from_str(&ok).unwrap();
		assert!(config.api_enabled());
		assert_eq!(config.api.unwrap().caller_header, "x-registry-caller");
	}
}
