//! First-page PDF rasterization via pdfium.
//!
//! pdfium wraps a CPU-bound C++ library that is not safe to call from async
//! contexts, so rendering runs under `tokio::task::spawn_blocking`. The
//! library is bound once per process: a `OnceCell` coalesces concurrent
//! first callers into a single binding attempt, and a failed bind stays
//! uncached so a later call may retry.

use std::io::Cursor;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Upper bound on input size, checked before the engine is touched.
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;
/// Oversampling factor against the page's native viewport.
pub const PREVIEW_SCALE: f32 = 2.5;
const JPEG_QUALITY: u8 = 92;
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Typed failure reasons. Callers branch on the kind, never on message text.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render engine failed to load: {0}")]
    EngineLoadFailed(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("document is password-protected")]
    EncryptedDocument,
    #[error("rendering failed: {0}")]
    RenderFailed(String),
    #[error("image encoding failed: {0}")]
    EncodeFailed(String),
}

/// A source document held in memory, as received from the client.
#[derive(Debug, Clone)]
pub struct RenderSource {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The single preview image produced from a source document.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render_first_page(&self, source: RenderSource) -> Result<PreviewImage, RenderError>;
}

/// Production renderer over the pdfium engine.
pub struct PdfiumRenderer;

#[async_trait]
impl PreviewRenderer for PdfiumRenderer {
    async fn render_first_page(&self, source: RenderSource) -> Result<PreviewImage, RenderError> {
        if source.content_type != PDF_CONTENT_TYPE {
            return Err(RenderError::InvalidInput(format!(
                "expected {PDF_CONTENT_TYPE}, got '{}'",
                source.content_type
            )));
        }
        if source.bytes.len() > MAX_PDF_BYTES {
            return Err(RenderError::InvalidInput(format!(
                "document is {} bytes, limit is {MAX_PDF_BYTES}",
                source.bytes.len()
            )));
        }

        tokio::task::spawn_blocking(move || render_blocking(source))
            .await
            .map_err(|e| RenderError::RenderFailed(format!("render task panicked: {e}")))?
    }
}

static ENGINE: OnceCell<Pdfium> = OnceCell::new();

/// Binds the pdfium library on first use. Concurrent callers block on the
/// same in-flight attempt rather than starting their own.
fn engine() -> Result<&'static Pdfium, RenderError> {
    ENGINE.get_or_try_init(|| {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map(Pdfium::new)
            .map_err(|e| RenderError::EngineLoadFailed(format!("{e:?}")))
    })
}

fn render_blocking(source: RenderSource) -> Result<PreviewImage, RenderError> {
    let pdfium = engine()?;

    let document = pdfium
        .load_pdf_from_byte_slice(&source.bytes, None)
        .map_err(classify_load_error)?;

    let page = document
        .pages()
        .get(0)
        .map_err(|e| RenderError::RenderFailed(format!("{e:?}")))?;

    let (width, height) = preview_dimensions(page.width().value, page.height().value);

    // The raster is cleared to opaque white before drawing, so pages with
    // transparent content export cleanly to JPEG.
    let render_config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .clear_before_rendering(true)
        .set_clear_color(PdfColor::new(255, 255, 255, 255));

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| RenderError::RenderFailed(format!("{e:?}")))?;
    let pixels = bitmap.as_image().to_rgb8();

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut Cursor::new(&mut buf), JPEG_QUALITY)
        .encode_image(&pixels)
        .map_err(|e| RenderError::EncodeFailed(e.to_string()))?;
    if buf.is_empty() {
        return Err(RenderError::EncodeFailed(
            "encoder produced no data".to_string(),
        ));
    }

    debug!(
        "rendered '{}' -> {}x{} px, {} bytes",
        source.file_name,
        width,
        height,
        buf.len()
    );

    Ok(PreviewImage {
        file_name: preview_file_name(&source.file_name),
        bytes: buf,
        width: width as u32,
        height: height as u32,
    })
}

fn classify_load_error(err: PdfiumError) -> RenderError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            RenderError::EncryptedDocument
        }
        other => RenderError::RenderFailed(format!("{other:?}")),
    }
}

/// Output pixel dimensions: the native viewport oversampled by 2.5x.
pub fn preview_dimensions(page_width: f32, page_height: f32) -> (i32, i32) {
    (
        (page_width * PREVIEW_SCALE).round() as i32,
        (page_height * PREVIEW_SCALE).round() as i32,
    )
}

/// The preview keeps the source name, with its extension replaced.
fn preview_file_name(source: &str) -> String {
    match source.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.jpg"),
        None => format!("{source}.jpg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_dimensions_oversample_the_viewport() {
        // US letter at PDF points
        assert_eq!(preview_dimensions(612.0, 792.0), (1530, 1980));
        assert_eq!(preview_dimensions(595.0, 842.0), (1488, 2105));
    }

    #[test]
    fn test_preview_dimensions_round_to_nearest_pixel() {
        assert_eq!(preview_dimensions(100.1, 100.3), (250, 251));
    }

    #[test]
    fn test_preview_file_name_replaces_extension() {
        assert_eq!(preview_file_name("resume.pdf"), "resume.jpg");
        assert_eq!(preview_file_name("jane.doe.PDF"), "jane.doe.jpg");
        assert_eq!(preview_file_name("resume"), "resume.jpg");
    }

    #[tokio::test]
    async fn test_oversized_input_rejected_before_engine_load() {
        let source = RenderSource {
            file_name: "big.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![0u8; MAX_PDF_BYTES + 1],
        };
        let err = PdfiumRenderer.render_first_page(source).await.unwrap_err();
        assert!(matches!(err, RenderError::InvalidInput(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_non_pdf_content_type_rejected() {
        let source = RenderSource {
            file_name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0u8; 16],
        };
        let err = PdfiumRenderer.render_first_page(source).await.unwrap_err();
        assert!(matches!(err, RenderError::InvalidInput(_)), "got {err:?}");
    }
}
