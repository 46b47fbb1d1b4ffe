use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static LOCATOR_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?://|file:///|data:image/)").expect("valid locator regex"));

#[derive(Debug, Clone)]
pub struct ImageResolver {
    search_dirs: Vec<PathBuf>,
}

impl ImageResolver {
    pub fn new(upload_dir: &Path, project_root: &Path, static_dir: &Path) -> Self {
        Self {
            search_dirs: vec![
                upload_dir.to_path_buf(),
                project_root.to_path_buf(),
                static_dir.to_path_buf(),
            ],
        }
    }

    pub fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if is_locator(reference) {
            return Some(reference.to_string());
        }

        let path = Path::new(reference);
        if path.is_absolute() {
            return path.exists().then(|| file_uri(path));
        }

        let found = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
            .map(|candidate| file_uri(&candidate));
        if found.is_none() {
            tracing::debug!(reference, "image reference did not resolve");
        }
        found
    }
}

pub fn is_locator(reference: &str) -> bool {
    LOCATOR_PREFIX_RE.is_match(reference)
}

pub fn file_uri(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let normalized = absolute.to_string_lossy().replace('\\', "/");
    if normalized.starts_with('/') {
        format!("file://{}", normalized)
    } else {
        format!("file:///{}", normalized)
    }
}

/// Local path behind a `file://` locator, if that is what it is.
pub fn locator_path(locator: &str) -> Option<PathBuf> {
    let rest = locator.strip_prefix("file://")?;
    if rest.starts_with('/') && rest.get(2..3) == Some(":") {
        // file:///C:/dir/img.png
        return Some(PathBuf::from(&rest[1..]));
    }
    Some(PathBuf::from(rest))
}
