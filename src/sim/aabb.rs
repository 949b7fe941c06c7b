//! Axis-aligned box geometry
//!
//! Every entity and obstacle in the world is an `Aabb`: a top-left corner plus
//! a size, in screen pixels with y growing downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::CONTACT_EPSILON;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub min: Vec2,
    /// Width and height (always positive)
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        debug_assert!(size.x > 0.0 && size.y > 0.0, "Aabb size must be positive: {size}");
        Self { min, size }
    }

    /// Build a box centred on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size / 2.0, size)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.min.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.min += delta;
    }

    pub fn set_left(&mut self, x: f32) {
        self.min.x = x;
    }

    pub fn set_right(&mut self, x: f32) {
        self.min.x = x - self.size.x;
    }

    pub fn set_top(&mut self, y: f32) {
        self.min.y = y;
    }

    pub fn set_bottom(&mut self, y: f32) {
        self.min.y = y - self.size.y;
    }

    /// Resize around the current centre
    pub fn set_size_centered(&mut self, size: Vec2) {
        let center = self.center();
        self.size = size;
        self.min = center - size / 2.0;
    }

    /// Strict overlap: boxes that only share an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }

    /// Strict horizontal overlap
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.left() < other.right() && self.right() > other.left()
    }

    /// Strict vertical overlap
    pub fn overlaps_y(&self, other: &Aabb) -> bool {
        self.top() < other.bottom() && self.bottom() > other.top()
    }

    /// True when this box rests flush on top of `other`
    pub fn rests_on(&self, other: &Aabb) -> bool {
        self.overlaps_x(other) && (self.bottom() - other.top()).abs() <= CONTACT_EPSILON
    }

    /// Shortest distance this box must move along each axis to leave `other`
    /// (zero when separated on that axis). A box sunk deep inside a wide
    /// obstacle reports the full distance to the nearer edge.
    pub fn penetration(&self, other: &Aabb) -> Vec2 {
        if !self.overlaps(other) {
            return Vec2::ZERO;
        }
        let x = (self.right() - other.left()).min(other.right() - self.left());
        let y = (self.bottom() - other.top()).min(other.bottom() - self.top());
        Vec2::new(x, y)
    }
}
