use crate::errors::{AppError, AppResult};
use crate::models::ImageUpload;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const MAX_COLLISION_SUFFIX: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct UploadStore {
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(upload_dir: &Path, allowed_extensions: Vec<String>, max_bytes: u64) -> Self {
        Self {
            upload_dir: upload_dir.to_path_buf(),
            allowed_extensions,
            max_bytes,
        }
    }

    pub fn ensure_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.upload_dir).map_err(|error| AppError::Io(error.to_string()))
    }

    /// Stores the upload and returns the file name the catalog should record.
    /// An existing file is never overwritten; the new one gets a numbered name instead.
    pub fn store(&self, upload: &ImageUpload) -> AppResult<String> {
        if upload.bytes.is_empty() {
            return Err(AppError::InvalidInput("Uploaded image is empty".to_string()));
        }
        if upload.bytes.len() as u64 > self.max_bytes {
            return Err(AppError::InvalidInput(format!(
                "Uploaded image exceeds {} bytes",
                self.max_bytes
            )));
        }

        let filename = secure_filename(&upload.filename)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid image filename '{}'", upload.filename)))?;
        let (stem, extension) = split_extension(&filename);
        let extension = extension.map(|ext| ext.to_ascii_lowercase()).unwrap_or_default();
        if !self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(AppError::InvalidInput(format!(
                "Image type '{}' is not allowed (expected one of: {})",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }

        self.ensure_dir()?;
        for attempt in 0..=MAX_COLLISION_SUFFIX {
            let candidate = if attempt == 0 {
                filename.clone()
            } else {
                format!("{}-{}.{}", stem, attempt, extension_of(&filename))
            };
            let path = self.upload_dir.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(error) = file.write_all(&upload.bytes).and_then(|_| file.sync_all()) {
                        drop(file);
                        let _ = fs::remove_file(&path);
                        return Err(AppError::Io(format!("cannot write {}: {}", path.display(), error)));
                    }
                    if attempt > 0 {
                        tracing::info!(requested = %filename, stored = %candidate, "renamed colliding upload");
                    }
                    return Ok(candidate);
                }
                Err(error) if error.kind() == ErrorKind::AlreadyExists => continue,
                Err(error) => {
                    return Err(AppError::Io(format!("cannot create {}: {}", path.display(), error)));
                }
            }
        }

        Err(AppError::Io(format!("No free file name for upload '{}'", filename)))
    }

    /// Best-effort removal of a file this store wrote.
    pub fn discard(&self, filename: &str) {
        let path = self.upload_dir.join(filename);
        if let Err(error) = fs::remove_file(&path) {
            tracing::warn!(path = %path.to_string_lossy(), error = %error, "failed to discard upload");
        }
    }
}

/// Strips directories and reduces the name to `[A-Za-z0-9._-]`, without leading dots.
pub fn secure_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut out = String::with_capacity(base.len());
    for ch in base.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }
    let cleaned = out.trim_start_matches(['.', '_']).trim_end_matches(['.', '_']).to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    }
}

fn extension_of(filename: &str) -> &str {
    split_extension(filename).1.unwrap_or_default()
}
