//! Visual overlays for the OCR stages: block/line/word boxes and the
//! confidence-filtered annotation layer. Every overlay is drawn on a fresh
//! copy of the rectified color image so it stays human-legible; the
//! processed intermediates are never used as a canvas.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::models::{TextToken, TokenLevel};

const BLOCK_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const LINE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BASELINE_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
const WORD_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);
const ANNOTATION_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);

fn token_rect(token: &TextToken) -> Option<Rect> {
    if token.bbox.width == 0 || token.bbox.height == 0 {
        return None;
    }
    Some(
        Rect::at(token.bbox.x as i32, token.bbox.y as i32)
            .of_size(token.bbox.width, token.bbox.height),
    )
}

/// Rectangle around every block-level token.
pub fn draw_blocks(base: &RgbaImage, tokens: &[TextToken]) -> RgbaImage {
    let mut canvas = base.clone();
    for token in tokens.iter().filter(|t| t.level == TokenLevel::Block) {
        if let Some(rect) = token_rect(token) {
            draw_hollow_rect_mut(&mut canvas, rect, BLOCK_COLOR);
        }
    }
    canvas
}

/// Rectangle around every line-level token, plus a baseline segment at 75%
/// of the box height.
pub fn draw_lines(base: &RgbaImage, tokens: &[TextToken]) -> RgbaImage {
    let mut canvas = base.clone();
    for token in tokens.iter().filter(|t| t.level == TokenLevel::Line) {
        if let Some(rect) = token_rect(token) {
            draw_hollow_rect_mut(&mut canvas, rect, LINE_COLOR);
            let baseline_y = token.bbox.y as f32 + token.bbox.height as f32 * 0.75;
            draw_line_segment_mut(
                &mut canvas,
                (token.bbox.x as f32, baseline_y),
                ((token.bbox.x + token.bbox.width) as f32, baseline_y),
                BASELINE_COLOR,
            );
        }
    }
    canvas
}

/// Rectangle around every word-level token, regardless of confidence.
pub fn draw_words(base: &RgbaImage, tokens: &[TextToken]) -> RgbaImage {
    let mut canvas = base.clone();
    for token in tokens.iter().filter(|t| t.level == TokenLevel::Word) {
        if let Some(rect) = token_rect(token) {
            draw_hollow_rect_mut(&mut canvas, rect, WORD_COLOR);
        }
    }
    canvas
}

/// The confidence-filtered annotation layer: only non-empty words above the
/// 60-confidence bar are marked. Returns the canvas and how many tokens were
/// annotated.
pub fn draw_annotated_words(base: &RgbaImage, tokens: &[TextToken]) -> (RgbaImage, usize) {
    let mut canvas = base.clone();
    let mut drawn = 0usize;
    for token in tokens.iter().filter(|t| t.annotatable()) {
        if let Some(rect) = token_rect(token) {
            draw_hollow_rect_mut(&mut canvas, rect, ANNOTATION_COLOR);
            drawn += 1;
        }
    }
    (canvas, drawn)
}
