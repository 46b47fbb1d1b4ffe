pub mod command;
pub mod html;

use crate::config::{AppConfig, RendererKind};
use crate::document::DocumentModel;
use crate::errors::AppResult;
use crate::models::RenderedDocument;
use std::fs;
use std::path::Path;

pub use command::CommandRenderer;
pub use html::{HtmlOptions, HtmlRenderer};

pub const DEFAULT_STYLESHEET: &str = r#"@page { size: A4; margin: 15mm; }
body { font-family: "Arial", "Helvetica", sans-serif; font-size: 12pt; color: #222; }
header { display: flex; align-items: center; justify-content: space-between; border-bottom: 2px solid #1b6ca8; margin-bottom: 8mm; }
header img.logo { height: 22mm; }
header .date { font-size: 11pt; color: #555; }
section.slot { page-break-inside: avoid; margin-bottom: 8mm; }
section.slot h2 { color: #1b6ca8; margin: 0 0 2mm 0; }
section.slot h3 { margin: 0 0 2mm 0; }
section.slot img.activity { max-width: 100%; max-height: 70mm; margin-top: 3mm; }
section.slot.empty p { color: #999; font-style: italic; }
"#;

/// Turns an assembled lesson plan into a downloadable artifact.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, model: &DocumentModel, stylesheet: &str) -> AppResult<RenderedDocument>;
}

pub fn build_renderer(config: &AppConfig) -> Box<dyn DocumentRenderer> {
    let options = HtmlOptions {
        lang: config.document_lang.clone(),
        dir: config.document_dir.clone(),
        embed_images: config.renderer.embed_images,
    };
    match config.renderer.kind {
        RendererKind::Html => Box::new(HtmlRenderer::new(options)),
        RendererKind::Command => Box::new(CommandRenderer::new(
            options,
            config.renderer.program.clone(),
            config.renderer.args.clone(),
            config.renderer.timeout_ms,
        )),
    }
}

/// Reads the configured stylesheet, falling back to the built-in one.
pub fn load_stylesheet(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(css) => css,
        Err(error) => {
            tracing::warn!(path = %path.to_string_lossy(), error = %error, "stylesheet unavailable, using built-in layout");
            DEFAULT_STYLESHEET.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_stylesheet_falls_back_to_default() {
        let root = tempfile::tempdir().expect("temp root");
        assert_eq!(load_stylesheet(&root.path().join("absent.css")), DEFAULT_STYLESHEET);

        let custom = root.path().join("custom.css");
        fs::write(&custom, "body { color: red; }").expect("write css");
        assert_eq!(load_stylesheet(&custom), "body { color: red; }");
    }

    fn empty_model() -> DocumentModel {
        DocumentModel {
            warm_up: crate::document::DocumentSlot::NoSelection,
            main: crate::document::DocumentSlot::NoSelection,
            cool_down: crate::document::DocumentSlot::NoSelection,
            today_date: "01/01/2026".to_string(),
            logo_locator: "http://example.invalid/logo.png".to_string(),
        }
    }

    #[test]
    fn html_renderer_is_opt_in() {
        let root = tempfile::tempdir().expect("temp root");
        let mut config = AppConfig::for_root(root.path());
        config.renderer.kind = RendererKind::Html;
        let rendered = build_renderer(&config)
            .render(&empty_model(), DEFAULT_STYLESHEET)
            .expect("html render");
        assert_eq!(rendered.filename, "lesson_plan.html");
    }

    #[test]
    fn default_renderer_runs_the_pdf_converter() {
        let root = tempfile::tempdir().expect("temp root");
        let mut config = AppConfig::for_root(root.path());
        config.renderer.program = "lesson-planner-no-such-converter".to_string();
        let error = build_renderer(&config)
            .render(&empty_model(), DEFAULT_STYLESHEET)
            .expect_err("converter missing");
        assert!(error.to_string().starts_with("RENDER_FAILED"));
    }
}
