//! Tesseract-executable backend for the OCR capability.
//!
//! The engine is invoked as an external process: the image is written to a
//! scoped temp directory, `tesseract <input> <output-base> -l <lang>
//! --oem <n> --psm <n> [txt|tsv|hocr]` runs synchronously, and the produced
//! output file is read back. The executable location is explicit
//! configuration fixed at construction.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::models::{BoundingBox, TextToken, TokenLevel};
use crate::ocr::{EngineOptions, OcrBackend};

pub struct TesseractBackend {
    executable: PathBuf,
}

impl TesseractBackend {
    /// Create a backend bound to a specific `tesseract` executable. The path
    /// is immutable for the lifetime of the backend.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run one engine invocation and return the produced output file.
    ///
    /// `format` is the Tesseract output config name ("txt", "tsv", "hocr");
    /// the output file carries the same extension. The temp directory is
    /// dropped (and cleaned up) on every exit path.
    fn invoke(
        &self,
        image: &GrayImage,
        lang: &str,
        options: &EngineOptions,
        format: &str,
    ) -> Result<Vec<u8>, ScanError> {
        let scratch = TempDir::new().map_err(|e| {
            ScanError::OcrInvocation(format!("failed to create scratch dir: {}", e))
        })?;
        let input = scratch.path().join("input.png");
        let output_base = scratch.path().join("output");

        image
            .save(&input)
            .map_err(|e| ScanError::OcrInvocation(format!("failed to stage image: {}", e)))?;

        let output = Command::new(&self.executable)
            .arg(&input)
            .arg(&output_base)
            .args(["-l", lang])
            .args(["--oem", &options.oem.to_string()])
            .args(["--psm", &options.psm.to_string()])
            .arg(format)
            .output()
            .map_err(|e| {
                ScanError::OcrInvocation(format!(
                    "failed to run {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::OcrInvocation(format!(
                "{} exited with {}: {}",
                self.executable.display(),
                output.status,
                stderr.trim()
            )));
        }

        let extension = if format == "txt" { "txt" } else { format };
        let produced = output_base.with_extension(extension);
        let bytes = std::fs::read(&produced).map_err(|e| {
            ScanError::OcrInvocation(format!(
                "engine produced no {} output: {}",
                extension, e
            ))
        })?;
        debug!(format, bytes = bytes.len(), "engine invocation complete");
        Ok(bytes)
    }
}

impl OcrBackend for TesseractBackend {
    fn recognize_tokens(
        &self,
        image: &GrayImage,
        lang: &str,
        options: &EngineOptions,
    ) -> Result<Vec<TextToken>, ScanError> {
        let tsv = self.invoke(image, lang, options, "tsv")?;
        let tsv = String::from_utf8_lossy(&tsv);
        Ok(parse_tsv(&tsv))
    }

    fn recognize_text(
        &self,
        image: &GrayImage,
        lang: &str,
        options: &EngineOptions,
    ) -> Result<String, ScanError> {
        let bytes = self.invoke(image, lang, options, "txt")?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn recognize_markup(
        &self,
        image: &GrayImage,
        lang: &str,
        extension: &str,
        options: &EngineOptions,
    ) -> Result<Vec<u8>, ScanError> {
        self.invoke(image, lang, options, extension)
    }
}

/// Parse the engine's TSV token table.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. The first row is a header; rows with an
/// unknown level or malformed geometry are skipped with a warning rather
/// than failing the whole extraction.
pub fn parse_tsv(tsv: &str) -> Vec<TextToken> {
    let mut tokens = Vec::new();

    for (index, line) in tsv.lines().enumerate() {
        if index == 0 || line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 11 {
            warn!(row = index, "short TSV row skipped");
            continue;
        }

        let level = fields[0]
            .parse::<u32>()
            .ok()
            .and_then(TokenLevel::from_tsv);
        let geometry: Option<[u32; 4]> = (|| {
            Some([
                fields[6].parse().ok()?,
                fields[7].parse().ok()?,
                fields[8].parse().ok()?,
                fields[9].parse().ok()?,
            ])
        })();
        let confidence = fields[10].parse::<f32>().unwrap_or(-1.0);

        match (level, geometry) {
            (Some(level), Some([x, y, width, height])) => tokens.push(TextToken {
                level,
                bbox: BoundingBox::new(x, y, width, height),
                confidence,
                text: fields.get(11).unwrap_or(&"").to_string(),
            }),
            _ => warn!(row = index, "malformed TSV row skipped"),
        }
    }

    tokens
}
