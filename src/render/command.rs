use super::html::{render_html, HtmlOptions};
use super::DocumentRenderer;
use crate::document::DocumentModel;
use crate::errors::{AppError, AppResult};
use crate::models::RenderedDocument;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

pub const PDF_FILENAME: &str = "lesson_plan.pdf";
const MAX_STDERR_CHARS: usize = 4_000;

/// Hands the HTML layout to an external HTML-to-PDF converter.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    options: HtmlOptions,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderer {
    pub fn new(options: HtmlOptions, program: String, args: Vec<String>, timeout_ms: u64) -> Self {
        Self {
            options,
            program,
            args,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }

    fn run(&self, scratch: &Path, input: &Path, output: &Path) -> AppResult<()> {
        // Diagnostics go to a file so a chatty converter cannot fill a pipe and stall.
        let stderr_path = scratch.join("converter.stderr");
        let stderr_file = File::create(&stderr_path).map_err(|error| AppError::Io(error.to_string()))?;
        let mut child = Command::new(&self.program)
            .args(self.expand_args(input, output))
            .current_dir(scratch)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file))
            .spawn()
            .map_err(|error| AppError::Render(format!("failed to start '{}': {}", self.program, error)))?;

        let status = match child
            .wait_timeout(self.timeout)
            .map_err(|error| AppError::Render(error.to_string()))?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AppError::Render(format!(
                    "'{}' timed out after {} ms",
                    self.program,
                    self.timeout.as_millis()
                )));
            }
        };

        if !status.success() {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            let detail: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(AppError::Render(format!(
                "'{}' exited with {}: {}",
                self.program, status, detail
            )));
        }
        Ok(())
    }
}

impl DocumentRenderer for CommandRenderer {
    fn render(&self, model: &DocumentModel, stylesheet: &str) -> AppResult<RenderedDocument> {
        let scratch = tempfile::Builder::new()
            .prefix("lesson-planner-")
            .tempdir()
            .map_err(|error| AppError::Io(format!("cannot create scratch dir: {}", error)))?;
        let input = scratch.path().join("lesson_plan.html");
        let output = scratch.path().join(PDF_FILENAME);
        fs::write(&input, render_html(model, stylesheet, &self.options))
            .map_err(|error| AppError::Io(error.to_string()))?;

        self.run(scratch.path(), &input, &output)?;

        let bytes = fs::read(&output).map_err(|error| {
            AppError::Render(format!("'{}' produced no output: {}", self.program, error))
        })?;
        tracing::info!(program = %self.program, bytes = bytes.len(), "rendered lesson plan");
        Ok(RenderedDocument {
            filename: PDF_FILENAME.to_string(),
            mime_type: "application/pdf".to_string(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSlot;

    fn model() -> DocumentModel {
        DocumentModel {
            warm_up: DocumentSlot::NoSelection,
            main: DocumentSlot::NoSelection,
            cool_down: DocumentSlot::NoSelection,
            today_date: "07/03/2026".to_string(),
            logo_locator: "http://example.invalid/logo.png".to_string(),
        }
    }

    fn renderer(program: &str, args: &[&str], timeout_ms: u64) -> CommandRenderer {
        CommandRenderer::new(
            HtmlOptions::default(),
            program.to_string(),
            args.iter().map(|arg| arg.to_string()).collect(),
            timeout_ms,
        )
    }

    #[test]
    fn placeholders_are_expanded() {
        let renderer = renderer("convert", &["--in={input}", "{output}", "-q"], 1000);
        let args = renderer.expand_args(Path::new("/tmp/a.html"), Path::new("/tmp/b.pdf"));
        assert_eq!(args, vec!["--in=/tmp/a.html", "/tmp/b.pdf", "-q"]);
    }

    #[test]
    fn missing_program_is_a_render_failure() {
        let renderer = renderer("lesson-planner-no-such-converter", &["{input}", "{output}"], 1000);
        let error = renderer.render(&model(), "").expect_err("missing program");
        assert!(matches!(error, AppError::Render(_)));
    }

    #[cfg(unix)]
    #[test]
    fn converter_output_becomes_the_artifact() {
        let renderer = renderer("cp", &["{input}", "{output}"], 10_000);
        let rendered = renderer.render(&model(), "").expect("copied output");
        assert_eq!(rendered.filename, PDF_FILENAME);
        assert_eq!(rendered.mime_type, "application/pdf");
        assert!(String::from_utf8(rendered.bytes).expect("utf8").contains("07/03/2026"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_converter_reports_exit_status() {
        let renderer = renderer("sh", &["-c", "echo broken >&2; exit 3"], 10_000);
        let error = renderer.render(&model(), "").expect_err("non-zero exit");
        assert!(error.to_string().contains("broken"));
    }

    #[cfg(unix)]
    #[test]
    fn slow_converter_times_out() {
        let renderer = renderer("sleep", &["5"], 100);
        let error = renderer.render(&model(), "").expect_err("timeout");
        assert!(error.to_string().contains("timed out"));
    }
}
