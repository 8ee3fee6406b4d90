use image::{DynamicImage, GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::morphology::{dilate, erode};
use imageproc::distance_transform::Norm;
use tracing::debug;

/// Every intermediate frame produced while turning a raw photo into the mask
/// used for contour search. All of them are persisted as debug artifacts.
pub struct PreprocessedFrames {
    pub grayscale: GrayImage,
    pub contrast: GrayImage,
    pub blurred: GrayImage,
    pub binary: GrayImage,
    pub edges: GrayImage,
    pub dilated: GrayImage,
    pub closed: GrayImage,
    /// Closed edge mask, inverted: the document interior (not the textured
    /// background) is the foreground blob.
    pub inverted: GrayImage,
}

/// Fixed-order preprocessing chain for boundary detection.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    pub clahe_clip_limit: f32,
    pub clahe_grid: u32,
    pub blur_sigma: f32,
    pub threshold_block_radius: u32,
    pub threshold_c: i32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Structuring element radius for dilation/closing (L-inf norm, so a
    /// radius of 2 matches a 5x5 square kernel).
    pub morph_radius: u8,
    pub morph_iterations: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 2.0,
            clahe_grid: 8,
            blur_sigma: 1.5,
            threshold_block_radius: 7,
            threshold_c: 5,
            canny_low: 30.0,
            canny_high: 150.0,
            morph_radius: 2,
            morph_iterations: 2,
        }
    }
}

impl Preprocessor {
    /// Run the full chain. Each step consumes the previous step's output and
    /// never mutates it; edge detection runs on the binarized image, not the
    /// blurred grayscale.
    pub fn run(&self, frame: &DynamicImage) -> PreprocessedFrames {
        let grayscale = frame.to_luma8();
        debug!(
            width = grayscale.width(),
            height = grayscale.height(),
            "converted to grayscale"
        );

        let contrast = clahe(&grayscale, self.clahe_clip_limit, self.clahe_grid);
        let blurred = gaussian_blur_f32(&contrast, self.blur_sigma);
        let binary = adaptive_binarize(&blurred, self.threshold_block_radius, self.threshold_c);
        let edges = canny(&binary, self.canny_low, self.canny_high);

        let mut dilated = edges.clone();
        for _ in 0..self.morph_iterations {
            dilated = dilate(&dilated, Norm::LInf, self.morph_radius);
        }

        // Morphological closing with the same kernel and iteration count:
        // dilate twice, then erode twice.
        let mut closed = dilated.clone();
        for _ in 0..self.morph_iterations {
            closed = dilate(&closed, Norm::LInf, self.morph_radius);
        }
        for _ in 0..self.morph_iterations {
            closed = erode(&closed, Norm::LInf, self.morph_radius);
        }

        let mut inverted = closed.clone();
        image::imageops::invert(&mut inverted);
        debug!("preprocessing chain complete");

        PreprocessedFrames {
            grayscale,
            contrast,
            blurred,
            binary,
            edges,
            dilated,
            closed,
            inverted,
        }
    }
}

/// Tile-based local contrast normalization (CLAHE).
///
/// The image is divided into a `grid` x `grid` tile layout. Each tile gets a
/// histogram-equalization lookup table built from its clipped histogram, and
/// every output pixel blends the tables of the four nearest tile centres
/// bilinearly, which removes the blockiness a per-tile mapping would produce.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let grid = grid.max(1);
    let tile_w = width.div_ceil(grid);
    let tile_h = height.div_ceil(grid);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    // One 256-entry lookup table per tile.
    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y).0[0] as usize] += 1;
                }
            }
            let pixel_count = ((x1 - x0) * (y1 - y0)).max(1);

            // Clip the histogram and hand the excess back uniformly. The
            // remainder goes one-per-bin from the front so the histogram
            // total stays equal to the tile's pixel count; losing it would
            // drag the CDF (and every low-contrast tile) toward black.
            let clip = ((clip_limit * pixel_count as f32) / 256.0).max(1.0) as u32;
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }
            for bin in hist.iter_mut().take((excess % 256) as usize) {
                *bin += 1;
            }

            let lut = &mut luts[(ty * tiles_x + tx) as usize];
            let mut cdf = 0u64;
            for (value, bin) in hist.iter().enumerate() {
                cdf += *bin as u64;
                lut[value] = ((cdf * 255) / pixel_count as u64).min(255) as u8;
            }
        }
    }

    let lut_at = |tx: u32, ty: u32, value: u8| -> f32 {
        luts[(ty * tiles_x + tx) as usize][value as usize] as f32
    };

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = gray.get_pixel(x, y).0[0];

            // Position relative to tile centres.
            let fx = (x as f32 - tile_w as f32 / 2.0) / tile_w as f32;
            let fy = (y as f32 - tile_h as f32 / 2.0) / tile_h as f32;
            let tx0 = fx.floor().max(0.0) as u32;
            let ty0 = fy.floor().max(0.0) as u32;
            let tx0 = tx0.min(tiles_x - 1);
            let ty0 = ty0.min(tiles_y - 1);
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let ty1 = (ty0 + 1).min(tiles_y - 1);
            let wx = (fx - fx.floor()).clamp(0.0, 1.0);
            let wy = (fy - fy.floor()).clamp(0.0, 1.0);

            let top = lut_at(tx0, ty0, value) * (1.0 - wx) + lut_at(tx1, ty0, value) * wx;
            let bottom = lut_at(tx0, ty1, value) * (1.0 - wx) + lut_at(tx1, ty1, value) * wx;
            let blended = top * (1.0 - wy) + bottom * wy;
            out.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }

    out
}

/// 3x3 median denoise for the OCR input, run before the contrast pass.
/// A median kills isolated sensor noise without softening glyph edges the
/// way a Gaussian would.
pub fn denoise(gray: &GrayImage) -> GrayImage {
    median_filter(gray, 1, 1)
}

/// Locally-adaptive binarization: a pixel is white when it exceeds the mean
/// of its square neighbourhood minus `c`. A single global threshold would
/// break on unevenly lit photographs, which is the common case here.
pub fn adaptive_binarize(gray: &GrayImage, block_radius: u32, c: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = integral_image(gray);
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mean = window_mean(&integral, width, height, x, y, block_radius);
            let threshold = (mean as i32 - c).clamp(0, 255);
            let value = gray.get_pixel(x, y).0[0];
            let bit = if (value as i32) >= threshold { 255u8 } else { 0u8 };
            out.put_pixel(x, y, Luma([bit]));
        }
    }

    out
}

/// Summed-area table with a zero-padded top/left border. Entry
/// `[y * (w + 1) + x]` holds the sum of all pixels in `[0, x) x [0, y)`.
fn integral_image(gray: &GrayImage) -> Vec<u64> {
    let (width, height) = gray.dimensions();
    let stride = (width + 1) as usize;
    let mut table = vec![0u64; stride * (height + 1) as usize];

    for y in 0..height {
        let mut row = 0u64;
        for x in 0..width {
            row += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            table[idx] = row + table[idx - stride];
        }
    }

    table
}

fn window_mean(
    integral: &[u64],
    width: u32,
    height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> u32 {
    let stride = (width + 1) as usize;
    let x0 = cx.saturating_sub(radius) as usize;
    let y0 = cy.saturating_sub(radius) as usize;
    let x1 = (cx + radius + 1).min(width) as usize;
    let y1 = (cy + radius + 1).min(height) as usize;

    let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
        - integral[y0 * stride + x1]
        - integral[y1 * stride + x0];
    let count = ((x1 - x0) * (y1 - y0)).max(1) as u64;
    (sum / count) as u32
}
