//! Loader for configurations split across several files.
//!
//! A main file may list other files under `include`. Every top-level section
//! must come from exactly one file, so a registry's genesis access table can
//! never be assembled from two competing `[access]` blocks.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Configuration loader that handles multi-file configurations with includes.
pub struct ConfigLoader {
	/// Base path for resolving relative includes
	base_path: PathBuf,
	/// Files already read, to catch circular includes
	loaded_files: HashSet<PathBuf>,
	/// Which file each section came from, for error reporting
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads a configuration file and all its includes, then validates the
	/// combined result.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;

		let main_content = self.load_file(&config_path).await?;
		let main_toml: toml::Value = toml::from_str(&main_content)?;

		let includes = self.extract_includes(&main_toml)?;
		if includes.is_empty() {
			return main_content.parse();
		}

		let combined = self
			.load_and_combine(main_toml, includes, config_path)
			.await?;

		let config_str = toml::to_string(&combined).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		config_str.parse()
	}

	/// Reads a file and resolves environment variables.
	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical_path = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical_path.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical_path.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	/// Extracts include directives from the configuration.
	fn extract_includes(&self, toml: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
		let Some(include_value) = toml.get("include") else {
			return Ok(Vec::new());
		};

		if let Some(path_str) = include_value.as_str() {
			return Ok(vec![PathBuf::from(path_str)]);
		}

		let include_array = include_value.as_array().ok_or_else(|| {
			ConfigError::Validation("Include must be a string or array of strings".into())
		})?;

		include_array
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect()
	}

	/// Merges included files into the main table, rejecting duplicate sections.
	async fn load_and_combine(
		&mut self,
		mut main_toml: toml::Value,
		includes: Vec<PathBuf>,
		main_file_path: PathBuf,
	) -> Result<toml::Value, ConfigError> {
		if let Some(table) = main_toml.as_table_mut() {
			table.remove("include");
			for key in table.keys() {
				self.section_sources
					.insert(key.clone(), main_file_path.clone());
			}
		}

		for include_path in includes {
			let resolved_path = self.resolve_path(&include_path)?;
			let include_content = self.load_file(&resolved_path).await?;
			let include_toml: toml::Value = toml::from_str(&include_content)?;

			let Some(include_table) = include_toml.as_table() else {
				continue;
			};

			if include_table.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"Nested includes are not supported ({})",
					resolved_path.display()
				)));
			}

			for key in include_table.keys() {
				if let Some(existing_source) = self.section_sources.get(key) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						key,
						existing_source.display(),
						resolved_path.display()
					)));
				}
				self.section_sources
					.insert(key.clone(), resolved_path.clone());
			}

			if let Some(main_table) = main_toml.as_table_mut() {
				for (key, value) in include_table {
					main_table.insert(key.clone(), value.clone());
				}
			}
		}

		Ok(main_toml)
	}

	/// Resolves a path relative to the base path.
	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();

		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const REGISTRY: &str = r#"
[registry]
id = "test-registry"
"#;

	const ACCESS: &str = r#"
[access]
admins = ["0x1111111111111111111111111111111111111111"]
signers = [
	"0x2222222222222222222222222222222222222222",
	"0x3333333333333333333333333333333333333333",
]
"#;

	const BACKENDS: &str = r#"
[commitment]
[commitment.implementations.sha256]

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("registry.toml");
		fs::write(&config_path, format!("{}{}{}", REGISTRY, ACCESS, BACKENDS)).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("registry.toml").await.unwrap();

		assert_eq!(config.registry.id, "test-registry");
		assert_eq!(config.access.signers.len(), 2);
	}

	#[tokio::test]
	async fn test_multi_file_config() {
		let temp_dir = TempDir::new().unwrap();

		let main = format!(
			"include = [\"access.toml\", \"backends.toml\"]\n{}",
			REGISTRY
		);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(temp_dir.path().join("access.toml"), ACCESS).unwrap();
		fs::write(temp_dir.path().join("backends.toml"), BACKENDS).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.registry.id, "test-registry");
		assert_eq!(config.access.admins.len(), 1);
		assert_eq!(config.storage.primary, "memory");
	}

	#[tokio::test]
	async fn test_single_include_string() {
		let temp_dir = TempDir::new().unwrap();

		let main = format!("include = \"rest.toml\"\n{}", REGISTRY);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(
			temp_dir.path().join("rest.toml"),
			format!("{}{}", ACCESS, BACKENDS),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		assert!(loader.load_config("main.toml").await.is_ok());
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();

		let main = format!(
			"include = [\"access.toml\", \"more_access.toml\"]\n{}{}",
			REGISTRY, BACKENDS
		);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(temp_dir.path().join("access.toml"), ACCESS).unwrap();
		fs::write(temp_dir.path().join("more_access.toml"), ACCESS).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();
		assert!(err.to_string().contains("Duplicate section 'access'"));
	}

	#[tokio::test]
	async fn test_self_include_detected() {
		let temp_dir = TempDir::new().unwrap();

		let main = format!("include = [\"main.toml\"]\n{}", REGISTRY);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();
		assert!(err.to_string().contains("Circular include"));
	}

	#[tokio::test]
	async fn test_missing_include() {
		let temp_dir = TempDir::new().unwrap();

		let main = format!("include = [\"absent.toml\"]\n{}", REGISTRY);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();
		assert!(matches!(err, ConfigError::Io(_)));
	}

	#[tokio::test]
	async fn test_nested_include_rejected() {
		let temp_dir = TempDir::new().unwrap();

		let main = format!("include = [\"access.toml\"]\n{}{}", REGISTRY, BACKENDS);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(
			temp_dir.path().join("access.toml"),
			format!("include = [\"other.toml\"]\n{}", ACCESS),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();
		assert!(err.to_string().contains("Nested includes"));
	}

	#[tokio::test]
	async fn test_from_file_entry_point() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("registry.toml");
		fs::write(&config_path, format!("{}{}{}", REGISTRY, ACCESS, BACKENDS)).unwrap();

		let config = Config::from_file(config_path.to_str().unwrap()).await.unwrap();
		assert_eq!(config.registry.id, "test-registry");
	}
}
