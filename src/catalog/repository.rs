use super::Catalog;
use crate::errors::{AppError, AppResult};
use crate::models::Category;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Whole-unit persistence for the catalog. Every operation loads, mutates and saves.
pub trait CatalogRepository: Send + Sync {
    fn load(&self) -> AppResult<Catalog>;
    fn save(&self, catalog: &Catalog) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct JsonCatalogRepository {
    path: PathBuf,
}

impl JsonCatalogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an empty catalog when the file does not exist yet.
    pub fn ensure_initialized(&self) -> AppResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&Catalog::default())?;
        tracing::info!(path = %self.path.to_string_lossy(), "initialized empty catalog");
        Ok(true)
    }
}

impl CatalogRepository for JsonCatalogRepository {
    fn load(&self) -> AppResult<Catalog> {
        let bytes = fs::read(&self.path)
            .map_err(|error| AppError::Io(format!("cannot read {}: {}", self.path.display(), error)))?;
        parse_catalog(&bytes)
    }

    fn save(&self, catalog: &Catalog) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(catalog)?;
        write_atomically(&self.path, &bytes)
    }
}

pub fn parse_catalog(bytes: &[u8]) -> AppResult<Catalog> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|error| AppError::StoreCorrupt(format!("catalog is not valid JSON: {}", error)))?;

    let Some(root) = value.as_object() else {
        return Err(AppError::StoreCorrupt("catalog root must be an object".to_string()));
    };
    for category in Category::ALL {
        match root.get(category.as_str()) {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(AppError::StoreCorrupt(format!(
                    "category '{}' must be a list",
                    category.as_str()
                )))
            }
            None => {
                return Err(AppError::StoreCorrupt(format!(
                    "missing category '{}'",
                    category.as_str()
                )))
            }
        }
    }

    serde_json::from_value(value)
        .map_err(|error| AppError::StoreCorrupt(format!("malformed activity: {}", error)))
}

/// Replaces `path` with `bytes` via a synced sibling temp file and a rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|error| AppError::Io(format!("cannot create {}: {}", parent.display(), error)))?;

    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|error| AppError::Io(format!("cannot create temp file in {}: {}", parent.display(), error)))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|error| AppError::Io(format!("cannot write {}: {}", path.display(), error)))?;
    temp.persist(path)
        .map_err(|error| AppError::Io(format!("cannot replace {}: {}", path.display(), error.error)))?;
    Ok(())
}
