//! Box geometry shared by actors and platforms.
//!
//! Every ray starts [`SKIN_WIDTH`] inside the box so that a box resting flush
//! against a surface still gets a positive hit distance.

use bevy::prelude::*;

/// Inset applied to every ray origin.
pub const SKIN_WIDTH: f32 = 0.015;

/// Axis-aligned box described by its center and half-extents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct BoundingBox {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl BoundingBox {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Box with the given full size.
    pub fn from_size(center: Vec2, size: Vec2) -> Self {
        Self::new(center, size * 0.5)
    }

    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// The box shrunk by `amount` on every side. Never inverts.
    pub fn shrunk(&self, amount: f32) -> Self {
        Self {
            center: self.center,
            half_extents: (self.half_extents - Vec2::splat(amount)).max(Vec2::ZERO),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }
}

/// Number of parallel rays cast along each edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct RayCounts {
    /// Rays cast sideways, distributed along the box height.
    pub horizontal: usize,
    /// Rays cast up or down, distributed along the box width.
    pub vertical: usize,
}

impl Default for RayCounts {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl RayCounts {
    pub fn new(horizontal: usize, vertical: usize) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Counts raised to the minimum of two rays per edge.
    pub fn clamped(self) -> Self {
        Self {
            horizontal: self.horizontal.max(2),
            vertical: self.vertical.max(2),
        }
    }
}

/// Corners of the skin-shrunk box, recomputed before every pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RayOrigins {
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_left: Vec2,
    pub bottom_right: Vec2,
}

impl RayOrigins {
    pub fn from_bounds(bounds: &BoundingBox) -> Self {
        let inner = bounds.shrunk(SKIN_WIDTH);
        let min = inner.min();
        let max = inner.max();
        Self {
            top_left: Vec2::new(min.x, max.y),
            top_right: max,
            bottom_left: min,
            bottom_right: Vec2::new(max.x, min.y),
        }
    }

    /// Bottom corner on the side `direction_x` points to.
    pub fn bottom_leading(&self, direction_x: f32) -> Vec2 {
        if direction_x < 0.0 {
            self.bottom_left
        } else {
            self.bottom_right
        }
    }

    /// Horizontal edge rays start from when moving in `direction_y`.
    pub fn vertical_leading(&self, direction_y: f32) -> Vec2 {
        if direction_y < 0.0 {
            self.bottom_left
        } else {
            self.top_left
        }
    }
}

/// Distance between neighbouring parallel rays.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct RaySpacing {
    /// Gap between horizontal rays, measured along the vertical axis.
    pub horizontal: f32,
    /// Gap between vertical rays, measured along the horizontal axis.
    pub vertical: f32,
    /// Counts the spacing was computed for, clamped to at least two.
    pub counts: RayCounts,
}

impl RaySpacing {
    pub fn compute(bounds: &BoundingBox, counts: RayCounts) -> Self {
        let counts = counts.clamped();
        let size = bounds.shrunk(SKIN_WIDTH).size();
        Self {
            horizontal: size.y / (counts.horizontal - 1) as f32,
            vertical: size.x / (counts.vertical - 1) as f32,
            counts,
        }
    }
}

/// Sign of `value`, treating zero as positive.
#[inline]
pub(crate) fn direction(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}
