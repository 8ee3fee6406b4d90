pub mod hierarchy;
pub mod tesseract;

use image::GrayImage;
use tracing::debug;

use crate::error::ScanError;
use crate::models::TextToken;
use hierarchy::Page;

/// Engine configuration passed through to the OCR capability unchanged: the
/// recognition-engine mode and the page-segmentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub oem: u32,
    pub psm: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { oem: 2, psm: 6 }
    }
}

/// The external OCR capability. `lang` is a `+`-joined set of language codes
/// (e.g. "kor+eng"); implementations must not filter tokens by confidence.
pub trait OcrBackend: Send + Sync {
    /// Flat list of detected tokens with level tags, in engine output order.
    fn recognize_tokens(
        &self,
        image: &GrayImage,
        lang: &str,
        options: &EngineOptions,
    ) -> Result<Vec<TextToken>, ScanError>;

    /// Plain-text rendition of the page.
    fn recognize_text(
        &self,
        image: &GrayImage,
        lang: &str,
        options: &EngineOptions,
    ) -> Result<String, ScanError>;

    /// Positional markup (e.g. hOCR for `extension = "hocr"`), as raw bytes.
    fn recognize_markup(
        &self,
        image: &GrayImage,
        lang: &str,
        extension: &str,
        options: &EngineOptions,
    ) -> Result<Vec<u8>, ScanError>;
}

/// Everything one OCR pass produces for the pipeline: the full token stream,
/// its typed hierarchy, and the independently recognized text and markup.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tokens: Vec<TextToken>,
    pub pages: Vec<Page>,
    pub text: String,
    pub markup: Vec<u8>,
}

/// Submits a rectified, contrast-enhanced grayscale image to the backend and
/// restructures the flat token stream into a layout hierarchy.
pub struct OcrExtractor<'a> {
    backend: &'a dyn OcrBackend,
    lang: String,
    options: EngineOptions,
}

impl<'a> OcrExtractor<'a> {
    pub fn new(backend: &'a dyn OcrBackend, lang: impl Into<String>, options: EngineOptions) -> Self {
        Self {
            backend,
            lang: lang.into(),
            options,
        }
    }

    /// Structured extraction. All tokens are kept regardless of confidence;
    /// filtering is an overlay concern only.
    pub fn extract(&self, image: &GrayImage) -> Result<(Vec<TextToken>, Vec<Page>), ScanError> {
        let tokens = self
            .backend
            .recognize_tokens(image, &self.lang, &self.options)?;
        debug!(tokens = tokens.len(), "token stream received");
        let pages = hierarchy::build(&tokens);
        Ok((tokens, pages))
    }

    /// Plain-text extraction: an independent engine invocation on the same
    /// image and configuration as [`extract`](Self::extract).
    pub fn extract_plain_text(&self, image: &GrayImage) -> Result<String, ScanError> {
        self.backend.recognize_text(image, &self.lang, &self.options)
    }

    /// Positional markup (hOCR) extraction, also an independent invocation.
    pub fn extract_markup(&self, image: &GrayImage) -> Result<Vec<u8>, ScanError> {
        self.backend
            .recognize_markup(image, &self.lang, "hocr", &self.options)
    }

    /// Run all three extractions on the identical image.
    pub fn extract_all(&self, image: &GrayImage) -> Result<Extraction, ScanError> {
        let (tokens, pages) = self.extract(image)?;
        let text = self.extract_plain_text(image)?;
        let markup = self.extract_markup(image)?;
        Ok(Extraction {
            tokens,
            pages,
            text,
            markup,
        })
    }
}
