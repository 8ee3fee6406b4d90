//! The forward pipeline: raw frame -> preprocessed representation ->
//! quadrilateral -> homography -> rectified image(s) -> OCR hierarchy.
//!
//! Stages run strictly sequentially; each one fully consumes its
//! predecessor's output. The observer taps every stage with a copy and never
//! feeds anything back. Stage-local failures are converted into the returned
//! [`ScanReport`] at this boundary; only artifact I/O errors propagate.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use tracing::{info, warn};

use crate::detection::preprocessing::{Preprocessor, clahe, denoise};
use crate::detection::{CandidateContour, QuadDetector};
use crate::error::ScanError;
use crate::models::Quad;
use crate::ocr::{EngineOptions, Extraction, OcrBackend, OcrExtractor};
use crate::overlay;
use crate::rectify::Rectification;
use crate::session::StageObserver;

/// How far a debug artifact is from the essentials. Level 1 keeps the
/// original and the rectified result, 2 adds the preprocessing chain,
/// 3 adds contour and OCR overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off,
    Basic,
    Intermediate,
    Full,
}

impl DebugLevel {
    pub fn from_cli(level: u8) -> Self {
        match level {
            0 => Self::Off,
            1 => Self::Basic,
            2 => Self::Intermediate,
            _ => Self::Full,
        }
    }
}

/// Terminal state of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Rectification and OCR both ran (OCR possibly recovered-empty).
    Complete,
    /// No document boundary; preprocessing artifacts remain for diagnosis,
    /// no rectification or OCR was attempted.
    QuadNotFound,
}

/// Structured result of a pipeline run: success flag, optional recovered
/// error, and everything downstream consumers need.
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub quad: Option<Quad>,
    pub rectified_size: Option<(u32, u32)>,
    pub extraction: Extraction,
    /// Set when the OCR capability failed and the run recovered with empty
    /// text/markup.
    pub ocr_error: Option<String>,
}

impl ScanReport {
    pub fn success(&self) -> bool {
        self.outcome == ScanOutcome::Complete
    }

    fn not_found() -> Self {
        Self {
            outcome: ScanOutcome::QuadNotFound,
            quad: None,
            rectified_size: None,
            extraction: Extraction::default(),
            ocr_error: None,
        }
    }
}

pub struct Pipeline {
    pub preprocessor: Preprocessor,
    pub detector: QuadDetector,
    pub lang: String,
    pub engine_options: EngineOptions,
    pub debug_level: DebugLevel,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            detector: QuadDetector::default(),
            lang: "kor+eng".to_string(),
            engine_options: EngineOptions::default(),
            debug_level: DebugLevel::Full,
        }
    }
}

impl Pipeline {
    /// Run the whole chain on one decoded frame.
    pub fn run(
        &self,
        frame: &DynamicImage,
        backend: &dyn OcrBackend,
        observer: &mut dyn StageObserver,
    ) -> Result<ScanReport, ScanError> {
        let mut tap = Tap {
            observer,
            level: self.debug_level,
        };

        tap.gated(DebugLevel::Basic, "01_original", frame)?;

        // Stage 1: preprocessing.
        let frames = self.preprocessor.run(frame);
        tap.gated_gray(DebugLevel::Intermediate, "02_grayscale", &frames.grayscale)?;
        tap.gated_gray(DebugLevel::Intermediate, "03_contrast", &frames.contrast)?;
        tap.gated_gray(DebugLevel::Intermediate, "04_blurred", &frames.blurred)?;
        tap.gated_gray(DebugLevel::Intermediate, "05_binary", &frames.binary)?;
        tap.gated_gray(DebugLevel::Intermediate, "06_edges", &frames.edges)?;
        tap.gated_gray(DebugLevel::Intermediate, "07_dilated", &frames.dilated)?;
        tap.gated_gray(DebugLevel::Intermediate, "08_closed", &frames.closed)?;
        tap.gated_gray(DebugLevel::Intermediate, "09_inverted", &frames.inverted)?;

        // Stage 2: boundary detection.
        if tap.level >= DebugLevel::Full {
            let candidates = self.detector.candidates(&frames.inverted);
            let vis = contour_overlay(&frames.inverted, &candidates);
            tap.gated(DebugLevel::Full, "10_contours", &DynamicImage::ImageRgba8(vis))?;
        }

        let Some(quad) = self.detector.detect(&frames.inverted) else {
            warn!("no document boundary found; halting before rectification");
            return Ok(ScanReport::not_found());
        };
        info!(%quad, "document boundary detected");

        // Stage 3: rectification. The color frame and the edge map are
        // co-registered, so one shared transform warps both.
        let rectification = Rectification::from_quad(&quad)?;
        let (width, height) = rectification.target_dimensions();
        let rectified = rectification.apply_rgba(&frame.to_rgba8());
        let rectified_edges = rectification.apply_gray(&frames.edges);
        info!(width, height, "perspective rectification applied");

        tap.gated(
            DebugLevel::Basic,
            "11_rectified",
            &DynamicImage::ImageRgba8(rectified.clone()),
        )?;
        tap.gated_gray(DebugLevel::Intermediate, "12_rectified_edges", &rectified_edges)?;

        // Stage 4: OCR on the rectified grayscale frame, denoised and then
        // contrast-enhanced. All three backend calls receive this identical
        // image.
        let ocr_input = clahe(
            &denoise(&DynamicImage::ImageRgba8(rectified.clone()).to_luma8()),
            self.preprocessor.clahe_clip_limit,
            self.preprocessor.clahe_grid,
        );
        tap.gated_gray(DebugLevel::Intermediate, "13_ocr_input", &ocr_input)?;

        let extractor = OcrExtractor::new(backend, self.lang.clone(), self.engine_options);
        let (extraction, ocr_error) = match extractor.extract_all(&ocr_input) {
            Ok(extraction) => (extraction, None),
            Err(err) => {
                // The OCR capability is an external collaborator; its failure
                // is recovered locally with empty results so the artifacts
                // written so far survive.
                warn!(error = %err, "OCR failed; continuing with empty extraction");
                (Extraction::default(), Some(err.to_string()))
            }
        };

        // Stage 5: overlays, each on a fresh copy of the rectified color
        // frame.
        if tap.level >= DebugLevel::Full {
            let blocks = overlay::draw_blocks(&rectified, &extraction.tokens);
            tap.gated(DebugLevel::Full, "14_text_blocks", &DynamicImage::ImageRgba8(blocks))?;

            let lines = overlay::draw_lines(&rectified, &extraction.tokens);
            tap.gated(DebugLevel::Full, "15_text_lines", &DynamicImage::ImageRgba8(lines))?;

            let words = overlay::draw_words(&rectified, &extraction.tokens);
            tap.gated(DebugLevel::Full, "16_words", &DynamicImage::ImageRgba8(words))?;

            let (annotated, drawn) =
                overlay::draw_annotated_words(&rectified, &extraction.tokens);
            info!(annotated = drawn, "confidence-filtered annotation layer drawn");
            tap.gated(DebugLevel::Full, "17_annotated", &DynamicImage::ImageRgba8(annotated))?;
        }

        Ok(ScanReport {
            outcome: ScanOutcome::Complete,
            quad: Some(quad),
            rectified_size: Some((width, height)),
            extraction,
            ocr_error,
        })
    }
}

struct Tap<'a> {
    observer: &'a mut dyn StageObserver,
    level: DebugLevel,
}

impl Tap<'_> {
    fn gated(
        &mut self,
        min_level: DebugLevel,
        label: &str,
        image: &DynamicImage,
    ) -> Result<(), ScanError> {
        if self.level >= min_level {
            self.observer.observe(label, image)?;
        }
        Ok(())
    }

    fn gated_gray(
        &mut self,
        min_level: DebugLevel,
        label: &str,
        image: &image::GrayImage,
    ) -> Result<(), ScanError> {
        if self.level >= min_level {
            self.observer
                .observe(label, &DynamicImage::ImageLuma8(image.clone()))?;
        }
        Ok(())
    }
}

/// Contour-stage visualization: candidate outlines in yellow over the mask,
/// approximation vertices as red dots.
fn contour_overlay(mask: &image::GrayImage, candidates: &[CandidateContour]) -> RgbaImage {
    let mut canvas = DynamicImage::ImageLuma8(mask.clone()).to_rgba8();
    for candidate in candidates {
        for point in &candidate.points {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < canvas.width()
                && (point.y as u32) < canvas.height()
            {
                canvas.put_pixel(point.x as u32, point.y as u32, Rgba([0, 200, 200, 255]));
            }
        }
        for vertex in &candidate.approx {
            draw_filled_circle_mut(&mut canvas, (vertex.x, vertex.y), 4, Rgba([255, 0, 0, 255]));
        }
    }
    canvas
}
