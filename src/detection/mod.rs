pub mod contours;
pub mod preprocessing;

use image::GrayImage;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use tracing::debug;

use crate::models::Quad;
use contours::external_contours;

/// How many of the largest contours are worth approximating. Photographs
/// rarely bury the document below the fifth-largest blob, and capping the
/// list bounds the approximation cost.
const MAX_CANDIDATES: usize = 5;

/// Polygon approximation tolerance as a fraction of the contour perimeter.
const APPROX_EPSILON_RATIO: f64 = 0.02;

/// Reduces the preprocessed foreground mask to a single ordered
/// quadrilateral, or reports that none of the candidate blobs looks like a
/// document.
#[derive(Debug, Clone)]
pub struct QuadDetector {
    /// Contours enclosing less area than this are noise, not documents.
    pub min_area: f64,
}

impl Default for QuadDetector {
    fn default() -> Self {
        Self { min_area: 1000.0 }
    }
}

impl QuadDetector {
    /// Find the document boundary in the inverted closed mask.
    ///
    /// Candidates are visited in area-descending order (ties keep contour
    /// enumeration order) and the first one whose polygon approximation has
    /// exactly 4 vertices wins. At most [`MAX_CANDIDATES`] contours are
    /// examined.
    pub fn detect(&self, mask: &GrayImage) -> Option<Quad> {
        for (rank, contour) in external_contours(mask)
            .iter()
            .take(MAX_CANDIDATES)
            .enumerate()
        {
            if contour.area < self.min_area {
                debug!(rank, area = contour.area, "contour below minimum area");
                continue;
            }

            let perimeter = arc_length(&contour.points, true);
            let approx =
                approximate_polygon_dp(&contour.points, APPROX_EPSILON_RATIO * perimeter, true);
            debug!(
                rank,
                area = contour.area,
                vertices = approx.len(),
                "candidate contour approximated"
            );

            if approx.len() == 4 {
                let quad = Quad::from_unordered([
                    (approx[0].x as f32, approx[0].y as f32),
                    (approx[1].x as f32, approx[1].y as f32),
                    (approx[2].x as f32, approx[2].y as f32),
                    (approx[3].x as f32, approx[3].y as f32),
                ]);
                debug!(%quad, "document boundary accepted");
                return Some(quad);
            }
        }

        None
    }

    /// Top candidate contours with their 4-point-or-not approximations, for
    /// the contour debug overlay.
    pub fn candidates(&self, mask: &GrayImage) -> Vec<CandidateContour> {
        external_contours(mask)
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(|contour| {
                let perimeter = arc_length(&contour.points, true);
                let approx = approximate_polygon_dp(
                    &contour.points,
                    APPROX_EPSILON_RATIO * perimeter,
                    true,
                );
                CandidateContour {
                    points: contour.points,
                    area: contour.area,
                    approx,
                }
            })
            .collect()
    }
}

/// One ranked contour plus its polygon approximation, used only for the
/// visual contour-stage artifact.
#[derive(Debug, Clone)]
pub struct CandidateContour {
    pub points: Vec<imageproc::point::Point<i32>>,
    pub area: f64,
    pub approx: Vec<imageproc::point::Point<i32>>,
}
