use std::sync::Mutex;

use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use slipscan::models::{BoundingBox, TextToken, TokenLevel};
use slipscan::ocr::{EngineOptions, OcrBackend};
use slipscan::ScanError;

/// A synthetic "photograph": a white rectangle with a black border lying on
/// a checkerboard-textured background. The texture guarantees dense edges
/// everywhere outside the document, the way real clutter does.
pub fn synthetic_photo(
    width: u32,
    height: u32,
    rect: (u32, u32, u32, u32),
) -> DynamicImage {
    let (rx0, ry0, rx1, ry1) = rect;
    let mut img = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let tile = ((x / 8) + (y / 8)) % 2;
            let value = if tile == 0 { 100u8 } else { 160u8 };
            img.put_pixel(x, y, Rgba([value, value, value, 255]));
        }
    }

    const BORDER: u32 = 4;
    for y in ry0..ry1 {
        for x in rx0..rx1 {
            let on_border = x < rx0 + BORDER
                || x >= rx1 - BORDER
                || y < ry0 + BORDER
                || y >= ry1 - BORDER;
            let value = if on_border { 0u8 } else { 255u8 };
            img.put_pixel(x, y, Rgba([value, value, value, 255]));
        }
    }

    DynamicImage::ImageRgba8(img)
}

/// A frame that is texture everywhere: no closed high-area region survives
/// preprocessing, so no document boundary exists.
pub fn textured_frame(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let tile = ((x / 8) + (y / 8)) % 2;
            let value = if tile == 0 { 90u8 } else { 170u8 };
            img.put_pixel(x, y, Rgba([value, value, value, 255]));
        }
    }
    DynamicImage::ImageRgba8(img)
}

pub fn word_token(x: u32, confidence: f32, text: &str) -> TextToken {
    TextToken {
        level: TokenLevel::Word,
        bbox: BoundingBox::new(x, 4, 30, 12),
        confidence,
        text: text.to_string(),
    }
}

/// OCR capability stub: replays a fixed token list and records the
/// dimensions and configuration of every image it is handed.
pub struct MockOcr {
    pub tokens: Vec<TextToken>,
    pub text: String,
    pub calls: Mutex<Vec<(u32, u32)>>,
    pub fail: bool,
}

impl MockOcr {
    pub fn with_tokens(tokens: Vec<TextToken>) -> Self {
        Self {
            tokens,
            text: String::new(),
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            tokens: Vec::new(),
            text: String::new(),
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn record(&self, image: &GrayImage) -> Result<(), ScanError> {
        if self.fail {
            return Err(ScanError::OcrInvocation("mock engine down".to_string()));
        }
        self.calls.lock().unwrap().push(image.dimensions());
        Ok(())
    }
}

impl OcrBackend for MockOcr {
    fn recognize_tokens(
        &self,
        image: &GrayImage,
        _lang: &str,
        _options: &EngineOptions,
    ) -> Result<Vec<TextToken>, ScanError> {
        self.record(image)?;
        Ok(self.tokens.clone())
    }

    fn recognize_text(
        &self,
        image: &GrayImage,
        _lang: &str,
        _options: &EngineOptions,
    ) -> Result<String, ScanError> {
        self.record(image)?;
        Ok(self.text.clone())
    }

    fn recognize_markup(
        &self,
        image: &GrayImage,
        _lang: &str,
        extension: &str,
        _options: &EngineOptions,
    ) -> Result<Vec<u8>, ScanError> {
        self.record(image)?;
        Ok(format!("<!-- {} -->", extension).into_bytes())
    }
}
