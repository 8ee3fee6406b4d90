use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::debug;

use crate::error::ScanError;
use crate::models::Quad;

/// Fill value for destination pixels that map outside the source extent.
const FILL_GRAY: Luma<u8> = Luma([0]);
const FILL_RGBA: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A perspective transform from a detected quadrilateral to its canonical
/// axis-aligned rectangle, reusable across any number of images registered in
/// the same pixel-coordinate space as the quadrilateral.
pub struct Rectification {
    projection: Projection,
    width: u32,
    height: u32,
}

impl Rectification {
    /// Derive the homography for a quadrilateral.
    ///
    /// The destination rectangle corners (0,0), (W-1,0), (W-1,H-1), (0,H-1)
    /// correspond to the source corners in the same TL/TR/BR/BL order; four
    /// exact point correspondences determine the projection uniquely, so no
    /// least-squares fitting is involved.
    pub fn from_quad(quad: &Quad) -> Result<Self, ScanError> {
        let (width, height) = quad.target_size();
        if width < 2 || height < 2 {
            return Err(ScanError::DegenerateQuad(format!(
                "target rectangle {}x{} is too small",
                width, height
            )));
        }

        let dest = [
            (0.0, 0.0),
            (width as f32 - 1.0, 0.0),
            (width as f32 - 1.0, height as f32 - 1.0),
            (0.0, height as f32 - 1.0),
        ];
        let projection =
            Projection::from_control_points(quad.corners(), dest).ok_or_else(|| {
                ScanError::DegenerateQuad(format!("no projection exists for {}", quad))
            })?;

        debug!(width, height, "homography computed");
        Ok(Self {
            projection,
            width,
            height,
        })
    }

    pub fn target_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The underlying projective transform (quad space to rectangle space).
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Warp a color frame into the target rectangle with bilinear sampling.
    pub fn apply_rgba(&self, image: &RgbaImage) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        warp_into(
            image,
            &self.projection,
            Interpolation::Bilinear,
            FILL_RGBA,
            &mut out,
        );
        out
    }

    /// Warp a single-channel frame (e.g. the edge map) with the same shared
    /// transform, keeping it coordinate-consistent with the color output.
    pub fn apply_gray(&self, image: &GrayImage) -> GrayImage {
        let mut out = GrayImage::new(self.width, self.height);
        warp_into(
            image,
            &self.projection,
            Interpolation::Bilinear,
            FILL_GRAY,
            &mut out,
        );
        out
    }
}
