//! Baseline geometry
//!
//! Points, baseline segments and 2D matrices, plus the rise compensation that
//! every fragment goes through before its position is used for line
//! reconstruction.

use crate::event::TextRenderEvent;

/// 2D affine matrix `[a, b, c, d, e, f]` representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
pub type Matrix = [f32; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// A point in user space (PDF coordinates, origin at bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle, `(x, y)` is the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A straight segment, used for glyph-run baselines
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Shift both endpoints by `(dx, dy)`
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            start: Point::new(self.start.x + dx, self.start.y + dy),
            end: Point::new(self.end.x + dx, self.end.y + dy),
        }
    }

    /// Map both endpoints through an affine matrix
    pub fn transform(&self, m: &Matrix) -> Self {
        Self {
            start: transform_point(self.start, m),
            end: transform_point(self.end, m),
        }
    }

    pub fn length(&self) -> f32 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect {
            x: self.start.x.min(self.end.x),
            y: self.start.y.min(self.end.y),
            width: (self.end.x - self.start.x).abs(),
            height: (self.end.y - self.start.y).abs(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }
}

/// Multiply two 2D transformation matrices (`m1` applied first)
pub fn multiply_matrices(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

pub fn transform_point(p: Point, m: &Matrix) -> Point {
    Point::new(
        p.x * m[0] + p.y * m[2] + m[4],
        p.x * m[1] + p.y * m[3] + m[5],
    )
}

/// Length of a text-space horizontal distance once mapped into user space
pub fn user_space_width(width: f32, m: &Matrix) -> f32 {
    LineSegment::new(Point::new(0.0, 0.0), Point::new(width, 0.0))
        .transform(m)
        .length()
}

/// Text-space vertical distance mapped into user space, keeping its sign
pub fn user_space_height(height: f32, m: &Matrix) -> f32 {
    let length = LineSegment::new(Point::new(0.0, 0.0), Point::new(0.0, height))
        .transform(m)
        .length();
    if height < 0.0 {
        -length
    } else {
        length
    }
}

/// The event's baseline with the glyph rise taken back out.
///
/// Rises at or below `rise_threshold` (in absolute value) are treated as zero.
pub fn baseline_segment(event: &TextRenderEvent, rise_threshold: f32) -> LineSegment {
    if event.rise.abs() > rise_threshold {
        event.baseline.translate(0.0, -event.rise)
    } else {
        event.baseline
    }
}

/// Scalar key for the physical line a segment sits on: top of its bounding box
pub fn line_height(segment: &LineSegment) -> f32 {
    let rect = segment.bounding_rect();
    rect.y + rect.height
}
