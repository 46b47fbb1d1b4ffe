use crate::catalog::{is_image_referenced, Catalog};
use crate::models::CleanupOutcome;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Removes upload files nobody references any more. Never fails the caller.
#[derive(Debug, Clone)]
pub struct AssetJanitor {
    upload_dir: PathBuf,
}

impl AssetJanitor {
    pub fn new(upload_dir: &Path) -> Self {
        Self {
            upload_dir: upload_dir.to_path_buf(),
        }
    }

    /// `catalog` must already reflect the removal of the activity that held `filename`.
    pub fn maybe_delete_asset(&self, catalog: &Catalog, filename: &str) -> CleanupOutcome {
        if !is_managed_filename(filename) {
            return CleanupOutcome::NotManaged;
        }
        if is_image_referenced(catalog, filename) {
            tracing::debug!(filename, "asset still referenced, keeping file");
            return CleanupOutcome::StillReferenced;
        }

        let path = self.upload_dir.join(filename);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.to_string_lossy(), "removed unreferenced asset");
                CleanupOutcome::Removed
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.to_string_lossy(), "unreferenced asset already missing");
                CleanupOutcome::Missing
            }
            Err(error) => {
                tracing::warn!(path = %path.to_string_lossy(), error = %error, "failed to remove unreferenced asset");
                CleanupOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        }
    }
}

/// The upload directory is flat: only bare file names point into it.
fn is_managed_filename(filename: &str) -> bool {
    if filename.trim().is_empty() || crate::images::is_locator(filename) {
        return false;
    }
    let path = Path::new(filename);
    path.file_name().map(|name| name == path.as_os_str()).unwrap_or(false)
        && !filename.contains(['/', '\\'])
        && filename != "."
        && filename != ".."
}
