//! Axis-aligned geometry in CSS pixels
//!
//! Screen coordinates: origin top-left, y grows downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Width and height of an element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True if either side is zero, negative or not finite
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::from_ltrb(left, top, left + width, top + height)
    }

    /// Box of `size` with its top-left corner at `origin`
    pub fn at(origin: Vec2, size: Size) -> Self {
        Self::from_ltwh(origin.x, origin.y, size.width, size.height)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    #[inline]
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite()
    }

    /// Zero-area, inverted or non-finite
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.size().is_degenerate()
    }

    /// Grow (or shrink, with a negative amount) on every side
    pub fn inflate(&self, amount: f32) -> Self {
        Self::from_ltrb(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }

    /// Strict interior overlap; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Overlap with `other` grown by `margin` on every side
    pub fn intersects_padded(&self, other: &Rect, margin: f32) -> bool {
        self.intersects(&other.inflate(margin))
    }

    /// Point inside the box grown by `margin`, edges included
    pub fn contains_padded(&self, p: Vec2, margin: f32) -> bool {
        p.x >= self.left - margin
            && p.x <= self.right + margin
            && p.y >= self.top - margin
            && p.y <= self.bottom + margin
    }

    /// Move the box so its top-left sits at `origin`
    pub fn moved_to(&self, origin: Vec2) -> Self {
        Self::at(origin, self.size())
    }
}

/// Range of valid top-left positions for a box of `size` kept `padding` inside `container`.
///
/// Returns `(min, max)` or `None` when the box does not fit.
pub fn placement_range(container: &Rect, size: Size, padding: f32) -> Option<(Vec2, Vec2)> {
    let min = Vec2::new(container.left + padding, container.top + padding);
    let max = Vec2::new(
        container.right - size.width - padding,
        container.bottom - size.height - padding,
    );
    if !(min.is_finite() && max.is_finite()) || max.x < min.x || max.y < min.y {
        return None;
    }
    Some((min, max))
}
