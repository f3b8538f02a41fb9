//! A pen which records the drawing commands it receives

use kurbo::{BezPath, PathEl, Point};
use skrifa::outline::OutlinePen;

/// Records every drawing command as a [`kurbo::PathEl`].
///
/// Nothing is simplified or dropped; a glyph which issues a lone `move_to`
/// still leaves one recorded element.
#[derive(Debug, Default, Clone)]
pub struct RecordingPen {
    path: BezPath,
}

impl RecordingPen {
    /// Create a new, empty pen
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded drawing commands, in order
    pub fn value(&self) -> &[PathEl] {
        self.path.elements()
    }

    /// `true` if no commands have been recorded
    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }
}

fn pt(x: f32, y: f32) -> Point {
    Point::new(x as f64, y as f64)
}

impl OutlinePen for RecordingPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(pt(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(pt(x, y));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path.quad_to(pt(cx0, cy0), pt(x, y));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to(pt(cx0, cy0), pt(cx1, cy1), pt(x, y));
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}
