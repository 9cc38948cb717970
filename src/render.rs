//! HTML-to-PDF rendering engine.
//!
//! Handles the low-level details of writing composed HTML to temporary files,
//! invoking the WeasyPrint CLI, and reading back the output PDF.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Errors that can occur while rendering a PDF.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write HTML source: {0}")]
    WriteHtml(#[source] std::io::Error),
    #[error("WeasyPrint execution failed: {0}")]
    RendererIo(#[source] std::io::Error),
    #[error("WeasyPrint exited with status {0}")]
    RendererExit(i32),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
}

/// Opaque boundary to the rendering engine: HTML in, PDF bytes out.
pub trait PdfRenderer {
    /// Render an HTML string to PDF bytes. `base_dir` resolves relative
    /// static assets such as fonts.
    fn render_pdf(&self, html: &str, base_dir: &Path) -> Result<Vec<u8>, RenderError>;
}

/// Stateless renderer shelling out to the `weasyprint` CLI.
pub struct WeasyPrintRenderer;

impl PdfRenderer for WeasyPrintRenderer {
    fn render_pdf(&self, html: &str, base_dir: &Path) -> Result<Vec<u8>, RenderError> {
        let temp_dir = tempdir().map_err(RenderError::TempDir)?;
        let html_path = temp_dir.path().join("document.html");
        let pdf_path = temp_dir.path().join("document.pdf");

        fs::write(&html_path, html).map_err(RenderError::WriteHtml)?;

        let status = Command::new("weasyprint")
            .arg(&html_path)
            .arg(&pdf_path)
            .arg("--base-url")
            .arg(base_dir)
            .status()
            .map_err(RenderError::RendererIo)?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(RenderError::RendererExit(code));
        }

        fs::read(&pdf_path).map_err(RenderError::ReadPdf)
    }
}

/// Base directory for static assets referenced by templates (fonts, images).
pub fn get_static_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}
