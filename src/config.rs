use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "lesson-planner.yaml";
pub const ROOT_ENV_VAR: &str = "LESSON_PLANNER_ROOT";

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;
const DEFAULT_RENDER_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RendererKind {
    Html,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererConfig {
    pub kind: RendererKind,
    pub embed_images: bool,
    pub program: String,
    /// `{input}` and `{output}` are replaced with the scratch HTML and target paths.
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Command,
            embed_images: true,
            program: "weasyprint".to_string(),
            args: vec!["{input}".to_string(), "{output}".to_string()],
            timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(skip)]
    pub project_root: PathBuf,
    pub catalog_path: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub logo_path: PathBuf,
    pub stylesheet_path: PathBuf,
    pub log_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_image_extensions: Vec<String>,
    pub document_lang: String,
    pub document_dir: String,
    pub renderer: RendererConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::new(),
            catalog_path: PathBuf::from("games.json"),
            upload_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("static"),
            logo_path: PathBuf::from("logo.png"),
            stylesheet_path: PathBuf::from("lesson_app/static/pdf_style.css"),
            log_dir: PathBuf::from("logs"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_image_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            document_lang: "he".to_string(),
            document_dir: "rtl".to_string(),
            renderer: RendererConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults with every path anchored at `root`.
    pub fn for_root(root: &Path) -> Self {
        Self::default().anchored(root)
    }

    /// Reads `config_path` if given, otherwise `<root>/lesson-planner.yaml` when it exists.
    pub fn load(root: &Path, config_path: Option<&Path>) -> AppResult<Self> {
        let candidate = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                default_path.is_file().then_some(default_path)
            }
        };

        let config = match candidate {
            Some(path) => {
                let raw = fs::read_to_string(&path).map_err(|error| {
                    AppError::Config(format!("cannot read {}: {}", path.display(), error))
                })?;
                if raw.trim().is_empty() {
                    Self::default()
                } else {
                    serde_yaml::from_str::<Self>(&raw)?
                }
            }
            None => Self::default(),
        };

        let config = config.anchored(root);
        config.validate()?;
        Ok(config)
    }

    fn anchored(mut self, root: &Path) -> Self {
        let anchor = |path: PathBuf| if path.is_absolute() { path } else { root.join(path) };
        self.project_root = root.to_path_buf();
        self.catalog_path = anchor(self.catalog_path);
        self.upload_dir = anchor(self.upload_dir);
        self.static_dir = anchor(self.static_dir);
        self.logo_path = anchor(self.logo_path);
        self.stylesheet_path = anchor(self.stylesheet_path);
        self.log_dir = anchor(self.log_dir);
        self.allowed_image_extensions = self
            .allowed_image_extensions
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    fn validate(&self) -> AppResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(AppError::Config("maxUploadBytes must be greater than zero".to_string()));
        }
        if self.allowed_image_extensions.is_empty() {
            return Err(AppError::Config("allowedImageExtensions must not be empty".to_string()));
        }
        if self.renderer.kind == RendererKind::Command && self.renderer.program.trim().is_empty() {
            return Err(AppError::Config("renderer.program is required for the command renderer".to_string()));
        }
        if self.renderer.timeout_ms == 0 {
            return Err(AppError::Config("renderer.timeoutMs must be greater than zero".to_string()));
        }
        Ok(())
    }
}
