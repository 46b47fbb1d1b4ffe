use super::DocumentRenderer;
use crate::document::{ActivityView, DocumentModel, DocumentSlot};
use crate::errors::AppResult;
use crate::images::locator_path;
use crate::models::{Category, RenderedDocument};
use base64::Engine;
use std::fs;

pub const HTML_FILENAME: &str = "lesson_plan.html";
const DOCUMENT_TITLE: &str = "מערך שיעור";
const NO_SELECTION_TEXT: &str = "לא נבחר משחק";

#[derive(Debug, Clone)]
pub struct HtmlOptions {
    pub lang: String,
    pub dir: String,
    pub embed_images: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            lang: "he".to_string(),
            dir: "rtl".to_string(),
            embed_images: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    options: HtmlOptions,
}

impl HtmlRenderer {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, model: &DocumentModel, stylesheet: &str) -> AppResult<RenderedDocument> {
        Ok(RenderedDocument {
            filename: HTML_FILENAME.to_string(),
            mime_type: "text/html; charset=utf-8".to_string(),
            bytes: render_html(model, stylesheet, &self.options).into_bytes(),
        })
    }
}

pub fn render_html(model: &DocumentModel, stylesheet: &str, options: &HtmlOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"{}\" dir=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n",
        escape_html(&options.lang),
        escape_html(&options.dir),
        DOCUMENT_TITLE,
        stylesheet.replace("</style", "<\\/style"),
    ));

    let logo = image_source(&model.logo_locator, options.embed_images);
    out.push_str(&format!(
        "<header>\n<img class=\"logo\" src=\"{}\" alt=\"\">\n<h1>{}</h1>\n<span class=\"date\">{}</span>\n</header>\n",
        escape_html(&logo),
        DOCUMENT_TITLE,
        escape_html(&model.today_date),
    ));

    for category in Category::ALL {
        match model.slot(category) {
            DocumentSlot::Selected(view) => write_selected(&mut out, category, view, options),
            DocumentSlot::NoSelection => {
                out.push_str(&format!(
                    "<section class=\"slot empty {}\">\n<h2>{}</h2>\n<p>{}</p>\n</section>\n",
                    category.slug(),
                    category.as_str(),
                    NO_SELECTION_TEXT,
                ));
            }
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn write_selected(out: &mut String, category: Category, view: &ActivityView, options: &HtmlOptions) {
    out.push_str(&format!(
        "<section class=\"slot {}\">\n<h2>{}</h2>\n<h3>{}</h3>\n<ul>\n",
        category.slug(),
        category.as_str(),
        escape_html(&view.title),
    ));
    for bullet in &view.bullets {
        out.push_str(&format!("<li>{}</li>\n", escape_html(bullet)));
    }
    out.push_str("</ul>\n");
    if let Some(locator) = view.image_locator.as_deref() {
        let src = image_source(locator, options.embed_images);
        out.push_str(&format!(
            "<img class=\"activity\" src=\"{}\" alt=\"{}\">\n",
            escape_html(&src),
            escape_html(&view.title),
        ));
    }
    out.push_str("</section>\n");
}

fn image_source(locator: &str, embed: bool) -> String {
    if !embed {
        return locator.to_string();
    }
    let Some(path) = locator_path(locator) else {
        return locator.to_string();
    };
    let Some(mime) = mime_for(&path.to_string_lossy()) else {
        return locator.to_string();
    };
    match fs::read(&path) {
        Ok(bytes) => format!(
            "data:{};base64,{}",
            mime,
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ),
        Err(error) => {
            tracing::debug!(path = %path.to_string_lossy(), error = %error, "image not embedded");
            locator.to_string()
        }
    }
}

fn mime_for(path: &str) -> Option<&'static str> {
    let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
