use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

/// An external contour of the foreground mask together with its enclosed
/// area, ready for ranking.
#[derive(Debug, Clone)]
pub struct RankedContour {
    pub points: Vec<Point<i32>>,
    pub area: f64,
}

/// Find external contours (outer borders of connected blobs) and return them
/// sorted by enclosed area, descending. The sort is stable, so blobs with
/// equal area keep the tracer's enumeration order.
pub fn external_contours(mask: &GrayImage) -> Vec<RankedContour> {
    let mut ranked: Vec<RankedContour> = find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| {
            let area = polygon_area(&c.points);
            RankedContour {
                points: c.points,
                area,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.area.total_cmp(&a.area));
    ranked
}

/// Enclosed area of a closed polygon via the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    (twice_area.abs() as f64) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn polygon_area_of_rectangle() {
        let rect = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ];
        assert_eq!(polygon_area(&rect), 50.0);
    }

    #[test]
    fn largest_blob_ranks_first() {
        let mut mask = GrayImage::new(100, 100);
        // Big blob.
        for y in 10..60 {
            for x in 10..60 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        // Small blob.
        for y in 70..80 {
            for x in 70..80 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let ranked = external_contours(&mask);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].area > ranked[1].area);
    }
}
