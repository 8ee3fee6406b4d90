use std::fmt;

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A detected document boundary: exactly four points, canonically ordered
/// top-left, top-right, bottom-right, bottom-left.
///
/// The ordering is always re-derived from unordered input via
/// [`Quad::from_unordered`]; callers must not reorder the corners between
/// detection and rectification, otherwise the warp silently mirrors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    points: [(f32, f32); 4],
}

impl Quad {
    /// Order four arbitrary points into the canonical corner layout.
    ///
    /// The point with the minimum coordinate sum (x + y) is top-left, the
    /// maximum sum is bottom-right, the minimum difference (y - x) is
    /// top-right and the maximum difference is bottom-left. Exact ties on a
    /// metric are broken by input index order (first occurrence wins), which
    /// keeps the result deterministic for degenerate inputs.
    pub fn from_unordered(points: [(f32, f32); 4]) -> Self {
        let sum = |p: (f32, f32)| p.0 + p.1;
        let diff = |p: (f32, f32)| p.1 - p.0;

        let mut tl = 0usize;
        let mut br = 0usize;
        let mut tr = 0usize;
        let mut bl = 0usize;
        for i in 1..4 {
            if sum(points[i]) < sum(points[tl]) {
                tl = i;
            }
            if sum(points[i]) > sum(points[br]) {
                br = i;
            }
            if diff(points[i]) < diff(points[tr]) {
                tr = i;
            }
            if diff(points[i]) > diff(points[bl]) {
                bl = i;
            }
        }

        Self {
            points: [points[tl], points[tr], points[br], points[bl]],
        }
    }

    /// Corners in canonical order (top-left, top-right, bottom-right,
    /// bottom-left).
    pub fn corners(&self) -> [(f32, f32); 4] {
        self.points
    }

    pub fn top_left(&self) -> (f32, f32) {
        self.points[0]
    }

    pub fn top_right(&self) -> (f32, f32) {
        self.points[1]
    }

    pub fn bottom_right(&self) -> (f32, f32) {
        self.points[2]
    }

    pub fn bottom_left(&self) -> (f32, f32) {
        self.points[3]
    }

    /// Target rectangle dimensions for rectification: the longer of the two
    /// horizontal sides by the longer of the two vertical sides, truncated to
    /// whole pixels.
    pub fn target_size(&self) -> (u32, u32) {
        let [tl, tr, br, bl] = self.points;
        let width_bottom = distance(br, bl);
        let width_top = distance(tr, tl);
        let height_right = distance(tr, br);
        let height_left = distance(tl, bl);
        let width = width_bottom.max(width_top) as u32;
        let height = height_right.max(height_left) as u32;
        (width, height)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [tl, tr, br, bl] = self.points;
        write!(
            f,
            "[({:.1},{:.1}) ({:.1},{:.1}) ({:.1},{:.1}) ({:.1},{:.1})]",
            tl.0, tl.1, tr.0, tr.1, br.0, br.1, bl.0, bl.1
        )
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Structural level of an OCR token, matching the Tesseract TSV level column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TokenLevel {
    Page,
    Block,
    Paragraph,
    Line,
    Word,
}

impl TokenLevel {
    pub fn from_tsv(level: u32) -> Option<Self> {
        match level {
            1 => Some(Self::Page),
            2 => Some(Self::Block),
            3 => Some(Self::Paragraph),
            4 => Some(Self::Line),
            5 => Some(Self::Word),
            _ => None,
        }
    }
}

/// One OCR-detected unit from the flat token stream.
///
/// Structural rows (page/block/paragraph/line) carry an empty string and a
/// confidence of -1 in the raw engine output. Confidence filtering only ever
/// applies to the visual annotation overlay, never to hierarchy construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TextToken {
    pub level: TokenLevel,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub text: String,
}

impl TextToken {
    /// Whether this token qualifies for the annotated-text overlay: a
    /// non-empty word recognized with confidence above 60.
    pub fn annotatable(&self) -> bool {
        self.level == TokenLevel::Word && !self.text.trim().is_empty() && self.confidence > 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> [(f32, f32); 4] {
        [(10.0, 10.0), (90.0, 12.0), (95.0, 80.0), (8.0, 78.0)]
    }

    #[test]
    fn order_points_is_permutation_invariant() {
        let pts = canonical();
        let expected = Quad::from_unordered(pts);

        // All 24 permutations of four points.
        let idx = [0usize, 1, 2, 3];
        for a in idx {
            for b in idx {
                for c in idx {
                    for d in idx {
                        let mut seen = [false; 4];
                        for i in [a, b, c, d] {
                            seen[i] = true;
                        }
                        if seen != [true; 4] {
                            continue;
                        }
                        let quad = Quad::from_unordered([pts[a], pts[b], pts[c], pts[d]]);
                        assert_eq!(quad, expected, "permutation {:?}", [a, b, c, d]);
                    }
                }
            }
        }
    }

    #[test]
    fn order_points_follows_rotation() {
        // Rotating the whole point set by 90 degrees relabels the corners
        // cyclically.
        let pts = canonical();
        let quad = Quad::from_unordered(pts);

        let size = 120.0f32;
        let rot90 = |p: (f32, f32)| (size - p.1, p.0);
        let rotated: Vec<(f32, f32)> = pts.iter().map(|&p| rot90(p)).collect();
        let rotated_quad = Quad::from_unordered([rotated[0], rotated[1], rotated[2], rotated[3]]);

        // Old top-left becomes new top-right, and so on around the ring.
        assert_eq!(rotated_quad.top_right(), rot90(quad.top_left()));
        assert_eq!(rotated_quad.bottom_right(), rot90(quad.top_right()));
        assert_eq!(rotated_quad.bottom_left(), rot90(quad.bottom_right()));
        assert_eq!(rotated_quad.top_left(), rot90(quad.bottom_left()));
    }

    #[test]
    fn order_points_breaks_exact_ties_by_input_index() {
        // Two points tie on the coordinate sum; the earlier one in input
        // order keeps the contested slot.
        let pts = [(0.0, 10.0), (10.0, 0.0), (20.0, 20.0), (0.0, 0.0)];
        let quad = Quad::from_unordered(pts);
        assert_eq!(quad.top_left(), (0.0, 0.0));
        assert_eq!(quad.bottom_right(), (20.0, 20.0));

        let swapped = [(10.0, 0.0), (0.0, 10.0), (20.0, 20.0), (0.0, 0.0)];
        let quad2 = Quad::from_unordered(swapped);
        assert_eq!(quad2.top_right(), (10.0, 0.0));
        assert_eq!(quad2.bottom_left(), (0.0, 10.0));
    }

    #[test]
    fn target_size_takes_longer_sides() {
        let quad = Quad::from_unordered([(0.0, 0.0), (100.0, 0.0), (90.0, 50.0), (0.0, 40.0)]);
        let (w, h) = quad.target_size();
        assert_eq!(w, 100);
        assert!(h >= 50);
    }

    #[test]
    fn annotatable_requires_word_text_and_confidence() {
        let word = |text: &str, conf: f32| TextToken {
            level: TokenLevel::Word,
            bbox: BoundingBox::new(0, 0, 10, 10),
            confidence: conf,
            text: text.to_string(),
        };
        assert!(word("total", 61.0).annotatable());
        assert!(!word("total", 60.0).annotatable());
        assert!(!word("  ", 99.0).annotatable());

        let line = TextToken {
            level: TokenLevel::Line,
            ..word("total", 99.0)
        };
        assert!(!line.annotatable());
    }
}
