//! Page geometry primitives and the coordinate transform.
//!
//! Layout engines report bounding boxes with a top-left origin; the
//! page-rendering side uses a bottom-left origin. [`RawBBox`] carries a
//! box in whichever convention it arrived in, and
//! [`RawBBox::to_page_rect`] is the single normalizing constructor into
//! page-rendering space.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page-rendering space (bottom-left origin).
///
/// Always normalized so `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// Create a normalized rectangle from two corners.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Zero-area rectangles carry no content.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// A rectangle is usable for span mapping only if it is finite and
    /// non-empty. Callers skip invalid rectangles rather than propagate
    /// a failure.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && !self.is_empty()
    }

    /// Whether two rectangles overlap with positive area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Clamp into a page of the given dimensions.
    pub fn clamped(&self, page_width: f64, page_height: f64) -> Rect {
        Rect {
            x0: self.x0.clamp(0.0, page_width),
            y0: self.y0.clamp(0.0, page_height),
            x1: self.x1.clamp(0.0, page_width),
            y1: self.y1.clamp(0.0, page_height),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }
}

/// A bounding box as produced upstream, in layout space (top-left
/// origin).
///
/// The layout engine emits structured records; some producers hand over
/// the same left/top/right/bottom values as a plain ordered 4-tuple.
/// Both deserialize transparently and both mean the same box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBBox {
    /// Structured layout-engine record: left, top, right, bottom.
    Layout { l: f64, t: f64, r: f64, b: f64 },
    /// Ordered `[left, top, right, bottom]`.
    Corners([f64; 4]),
}

impl RawBBox {
    /// Normalize into page-rendering space for a page of the given
    /// height.
    ///
    /// Both forms are flipped identically: `y0 = height - bottom`,
    /// `y1 = height - top`. Returns `None` when the resulting rectangle
    /// is empty or has non-finite extent; callers must skip such boxes.
    pub fn to_page_rect(&self, page_height: f64) -> Option<Rect> {
        let (l, t, r, b) = match *self {
            RawBBox::Layout { l, t, r, b } => (l, t, r, b),
            RawBBox::Corners([l, t, r, b]) => (l, t, r, b),
        };
        let rect = Rect::new(l, page_height - b, r, page_height - t);
        if rect.is_valid() {
            Some(rect)
        } else {
            None
        }
    }

    /// Express a page-space rectangle back in layout convention.
    pub fn from_page_rect(rect: &Rect, page_height: f64) -> Self {
        RawBBox::Layout {
            l: rect.x0,
            t: page_height - rect.y1,
            r: rect.x1,
            b: page_height - rect.y0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_transform_flips_vertical_axis() {
        let bb = RawBBox::Layout {
            l: 10.0,
            t: 20.0,
            r: 110.0,
            b: 40.0,
        };
        let rect = bb.to_page_rect(800.0).unwrap();

        assert_eq!(rect.x0, 10.0);
        assert_eq!(rect.x1, 110.0);
        assert_eq!(rect.y0, 760.0); // 800 - 40
        assert_eq!(rect.y1, 780.0); // 800 - 20
    }

    #[test]
    fn test_transform_produces_normalized_rect() {
        // For any box with top < bottom in layout space, the page rect
        // must satisfy y0 <= y1 and x0 <= x1.
        for (l, t, r, b, h) in [
            (0.0, 0.0, 5.0, 5.0, 100.0),
            (3.0, 10.0, 90.0, 95.0, 200.0),
            (50.0, 1.0, 51.0, 199.0, 200.0),
        ] {
            let rect = RawBBox::Layout { l, t, r, b }.to_page_rect(h).unwrap();
            assert!(rect.x0 <= rect.x1);
            assert!(rect.y0 <= rect.y1);
        }
    }

    #[test]
    fn test_transform_round_trip_preserves_horizontal_extent() {
        let bb = RawBBox::Layout {
            l: 12.5,
            t: 30.0,
            r: 87.5,
            b: 60.0,
        };
        let rect = bb.to_page_rect(400.0).unwrap();
        let back = RawBBox::from_page_rect(&rect, 400.0);

        match back {
            RawBBox::Layout { l, t, r, b } => {
                assert_eq!(l, 12.5);
                assert_eq!(r, 87.5);
                assert_eq!(t, 30.0);
                assert_eq!(b, 60.0);
            }
            RawBBox::Corners(_) => panic!("expected layout form"),
        }
    }

    #[test]
    fn test_corners_form_flips_like_layout_form() {
        // The same layout box in both forms must land on the same
        // page rect.
        let layout = RawBBox::Layout {
            l: 72.0,
            t: 80.0,
            r: 172.0,
            b: 92.0,
        };
        let corners = RawBBox::Corners([72.0, 80.0, 172.0, 92.0]);

        let rect = layout.to_page_rect(792.0).unwrap();
        assert_eq!(rect, Rect::new(72.0, 700.0, 172.0, 712.0));
        assert_eq!(corners.to_page_rect(792.0), Some(rect));
    }

    #[test]
    fn test_empty_box_rejected() {
        let bb = RawBBox::Layout {
            l: 10.0,
            t: 20.0,
            r: 10.0,
            b: 40.0,
        };
        assert!(bb.to_page_rect(100.0).is_none());
    }

    #[test]
    fn test_non_finite_box_rejected() {
        let bb = RawBBox::Corners([0.0, 0.0, f64::INFINITY, 10.0]);
        assert!(bb.to_page_rect(100.0).is_none());

        let bb = RawBBox::Layout {
            l: f64::NAN,
            t: 0.0,
            r: 10.0,
            b: 10.0,
        };
        assert!(bb.to_page_rect(100.0).is_none());
    }

    #[test]
    fn test_untagged_deserialization() {
        let layout: RawBBox = serde_json::from_str(r#"{"l":1.0,"t":2.0,"r":3.0,"b":4.0}"#).unwrap();
        assert!(matches!(layout, RawBBox::Layout { .. }));

        let corners: RawBBox = serde_json::from_str("[1.0,2.0,3.0,4.0]").unwrap();
        assert!(matches!(corners, RawBBox::Corners(_)));
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        let c = Rect::new(10.0, 10.0, 20.0, 20.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c)); // touching edges do not overlap
    }

    #[test]
    fn test_rect_clamped_to_page() {
        let r = Rect::new(-5.0, -5.0, 700.0, 900.0).clamped(612.0, 792.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 612.0, 792.0));
    }
}
