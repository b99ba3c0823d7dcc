//! File-based storage backend.
//!
//! Each key is stored as one file under `<storage_path>/<namespace>/`. Record
//! ids are hex-encoded into the file name so arbitrary order ids map to
//! distinct, filesystem-safe names. Writes go to a temp file that is then
//! renamed over the target, which keeps single-key updates atomic.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use registry_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use std::path::PathBuf;
use tokio::fs;

/// Longest hex-encoded file stem accepted; keeps names under common
/// filesystem limits once the extension is added.
const MAX_FILE_STEM: usize = 240;

#[allow(clippy::doc_nested_refdefs)]
/// Fixed-size file header.
///
/// Binary layout (16 bytes total):
/// - [0-3]: Magic bytes "ORGS"
/// - [4-5]: Version (u16, little-endian)
/// - [6-7]: Reserved
/// - [8-15]: Payload length (u64, little-endian)
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileHeader {
	version: u16,
	payload_len: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"ORGS";
	const VERSION: u16 = 1;
	const SIZE: usize = 16;

	fn for_payload(payload: &[u8]) -> Self {
		Self {
			version: Self::VERSION,
			payload_len: payload.len() as u64,
		}
	}

	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[8..16].copy_from_slice(&self.payload_len.to_le_bytes());
		bytes
	}

	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}
		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Invalid magic bytes".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut len_bytes = [0u8; 8];
		len_bytes.copy_from_slice(&bytes[8..16]);

		Ok(Self {
			version,
			payload_len: u64::from_le_bytes(len_bytes),
		})
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Maps `namespace:id` to `<base>/<namespace>/<hex(id)>.bin`.
	fn get_file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
		let (dir, id) = match key.split_once(':') {
			Some((namespace, id)) if is_safe_segment(namespace) => {
				(self.base_path.join(namespace), id)
			},
			_ => (self.base_path.clone(), key),
		};

		let stem = hex::encode(id.as_bytes());
		if stem.is_empty() || stem.len() > MAX_FILE_STEM {
			return Err(StorageError::Backend(format!(
				"Key length out of range for file storage: {} bytes",
				id.len()
			)));
		}

		Ok(dir.join(format!("{}.bin", stem)))
	}
}

fn is_safe_segment(segment: &str) -> bool {
	!segment.is_empty()
		&& segment
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key)?;

		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::deserialize(&data)?;
		let payload = &data[FileHeader::SIZE..];
		if payload.len() as u64 != header.payload_len {
			tracing::warn!(
				path = %path.display(),
				expected = header.payload_len,
				actual = payload.len(),
				"Storage file length does not match header"
			);
			return Err(StorageError::Backend(format!(
				"Corrupt storage file {}",
				path.display()
			)));
		}

		Ok(payload.to_vec())
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key)?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let header = FileHeader::for_payload(&value);
		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&header.serialize());
		file_data.extend_from_slice(&value);

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key)?;
		fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("storage_path cannot be empty".into()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/registry")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/registry");

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_persists_across_instances() {
		let dir = TempDir::new().unwrap();

		let storage = FileStorage::new(dir.path().to_path_buf());
		storage
			.set_bytes("orders:1234", b"{\"id\":\"1234\"}".to_vec())
			.await
			.unwrap();

		let reopened = FileStorage::new(dir.path().to_path_buf());
		assert_eq!(
			reopened.get_bytes("orders:1234").await.unwrap(),
			b"{\"id\":\"1234\"}".to_vec()
		);
		assert!(reopened.exists("orders:1234").await.unwrap());
		assert!(dir.path().join("orders").is_dir());
	}

	#[tokio::test]
	async fn test_ids_do_not_collide() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("orders:a/b", b"slash".to_vec()).await.unwrap();
		storage.set_bytes("orders:a_b", b"underscore".to_vec()).await.unwrap();
		storage.set_bytes("orders:a:b", b"colon".to_vec()).await.unwrap();

		assert_eq!(storage.get_bytes("orders:a/b").await.unwrap(), b"slash");
		assert_eq!(storage.get_bytes("orders:a_b").await.unwrap(), b"underscore");
		assert_eq!(storage.get_bytes("orders:a:b").await.unwrap(), b"colon");
	}

	#[tokio::test]
	async fn test_missing_key() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		assert!(matches!(
			storage.get_bytes("orders:nope").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("orders:nope").await.unwrap());

		storage.set_bytes("orders:x", b"1".to_vec()).await.unwrap();
		assert!(storage.exists("orders:x").await.unwrap());
		assert!(!storage.exists("transactions:x").await.unwrap());
	}

	#[tokio::test]
	async fn test_corrupt_file_is_rejected() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		storage.set_bytes("orders:x", b"payload".to_vec()).await.unwrap();

		let path = storage.get_file_path("orders:x").unwrap();
		let mut raw = std::fs::read(&path).unwrap();
		raw.truncate(raw.len() - 2);
		std::fs::write(&path, raw).unwrap();

		assert!(matches!(
			storage.get_bytes("orders:x").await,
			Err(StorageError::Backend(_))
		));
	}

	#[test]
	fn test_header_layout() {
		let header = FileHeader::for_payload(b"abc");
		let bytes = header.serialize();
		assert_eq!(&bytes[0..4], b"ORGS");
		assert_eq!(FileHeader::deserialize(&bytes).unwrap(), header);
		assert!(FileHeader::deserialize(b"ORG").is_err());
	}

	#[test]
	fn test_oversized_key_rejected() {
		let storage = FileStorage::new(PathBuf::from("/unused"));
		let long_id = "x".repeat(200);
		assert!(storage
			.get_file_path(&format!("orders:{}", long_id))
			.is_err());
	}
}
