//! Storage backends for mesh configurations.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use wgmgr_config::MeshConfig;

use crate::error::{Result, StoreError};

/// Key used by [`DocumentKeyBackend`] when none is given.
pub const DEFAULT_DOCUMENT_KEY: &str = "wgmgr";

/// Somewhere a [`MeshConfig`] snapshot can be loaded from and saved to.
pub trait Backend {
    /// Loads and validates the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored yet, or another
    /// [`StoreError`] if the stored data cannot be read or is invalid.
    fn load(&self) -> Result<MeshConfig>;

    /// Stores the configuration, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    fn save(&self, config: &MeshConfig) -> Result<()>;

    /// Returns true if a configuration is already stored.
    fn exists(&self) -> bool;

    /// Human-readable location, for messages.
    fn describe(&self) -> String;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn load(&self) -> Result<MeshConfig> {
        (**self).load()
    }

    fn save(&self, config: &MeshConfig) -> Result<()> {
        (**self).save(config)
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Stores the configuration as a whole JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for FileBackend {
    fn load(&self) -> Result<MeshConfig> {
        let document = read_json(&self.path)?;
        let config = MeshConfig::from_json_value(document)?;
        debug!(path = %self.path.display(), peers = config.peers().len(), "loaded configuration");
        Ok(config)
    }

    fn save(&self, config: &MeshConfig) -> Result<()> {
        write_atomic(&self.path, &config.to_json()?)?;
        info!(path = %self.path.display(), peers = config.peers().len(), "saved configuration");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Stores the configuration under one key of a larger JSON document.
///
/// The document must be a JSON object. Other keys are preserved on save, so
/// the configuration can live next to unrelated settings. Documents in any
/// other format are refused rather than rewritten.
#[derive(Debug, Clone)]
pub struct DocumentKeyBackend {
    path: PathBuf,
    key: String,
}

impl DocumentKeyBackend {
    /// Creates a backend for `key` inside the document at `path`.
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Path of the enclosing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key the configuration is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        match read_json(&self.path)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(self.path.clone())),
        }
    }
}

impl Backend for DocumentKeyBackend {
    fn load(&self) -> Result<MeshConfig> {
        let mut document = self.read_document()?;
        let value = document
            .remove(&self.key)
            .ok_or_else(|| StoreError::MissingKey {
                path: self.path.clone(),
                key: self.key.clone(),
            })?;
        let config = MeshConfig::from_json_value(value)?;
        debug!(path = %self.path.display(), key = %self.key, "loaded configuration");
        Ok(config)
    }

    fn save(&self, config: &MeshConfig) -> Result<()> {
        let mut document = match self.read_document() {
            Ok(map) => map,
            Err(StoreError::NotFound(_)) => Map::new(),
            Err(e) => return Err(e),
        };
        document.insert(self.key.clone(), config.to_json_value()?);

        let text = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| StoreError::json(&self.path, e))?;
        write_atomic(&self.path, &text)?;
        info!(path = %self.path.display(), key = %self.key, "saved configuration");
        Ok(())
    }

    fn exists(&self) -> bool {
        matches!(self.read_document(), Ok(map) if map.contains_key(&self.key))
    }

    fn describe(&self) -> String {
        format!("{} (key {})", self.path.display(), self.key)
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::io(path, e)
        }
    })?;
    serde_json::from_str(&text).map_err(|e| StoreError::json(path, e))
}

/// Writes `contents` next to `path` and renames it into place, so readers
/// see either the old or the new file.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| StoreError::io(file.path(), e))?;
    file.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}
