//! Viewport-to-surface coordinate mapping.
//!
//! The square drawing surface shows a scaled-down picture of the whole
//! viewport. The viewport keeps its aspect ratio: the longer side spans the
//! full surface and the shorter side is centered with equal padding on both
//! ends (letterboxing).

use kurbo::{Point, Size, Vec2};

/// Letterbox transform from viewport space into surface space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Viewport pixels per surface pixel, per axis.
    pub ratio: Vec2,
    /// Padding added after scaling, in surface pixels.
    pub offset: Vec2,
}

impl Letterbox {
    /// Compute the transform for a viewport shown on a `surface_size` square.
    ///
    /// Callers must pass a viewport with nonzero width and height. A zero
    /// dimension yields non-finite ratios.
    pub fn fit(viewport: Size, surface_size: f64) -> Self {
        let mut local = Size::new(surface_size, surface_size);
        let offset;

        if viewport.width > viewport.height {
            local.height = viewport.height * surface_size / viewport.width;
            offset = Vec2::new(0.0, (surface_size - local.height) / 2.0);
        } else {
            // Square viewports land here too.
            local.width = viewport.width * surface_size / viewport.height;
            offset = Vec2::new((surface_size - local.width) / 2.0, 0.0);
        }

        Self {
            ratio: Vec2::new(viewport.width / local.width, viewport.height / local.height),
            offset,
        }
    }

    /// Map a viewport point into surface space.
    pub fn apply(&self, raw: Point) -> Point {
        Point::new(
            raw.x / self.ratio.x + self.offset.x,
            raw.y / self.ratio.y + self.offset.y,
        )
    }
}

/// Map a raw viewport coordinate onto a `surface_size` square surface.
pub fn map_point(raw: Point, viewport: Size, surface_size: f64) -> Point {
    Letterbox::fit(viewport, surface_size).apply(raw)
}
