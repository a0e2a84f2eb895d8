//! Dragging the widget around and docking it to a viewport edge.

use crate::surface::{SNAP_TRANSITION, Transition};
use kurbo::{Point, Size, Vec2};

/// Gap kept between a docked widget and the viewport edge, in pixels.
pub const EDGE_MARGIN: f64 = 2.0;

/// Where a drag ended up after docking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOutcome {
    /// New resting offset.
    pub offset: Point,
    /// Transition to animate the move with; the caller clears it afterwards.
    pub transition: Transition,
}

/// Compute the docked resting offset for a widget of size `widget` at `offset`.
///
/// The horizontal test uses half the widget width while the vertical test
/// uses the full height. When the widget is in the vertical middle band, the
/// horizontal result is replaced by the side its center is closest to.
pub fn snap_offset(offset: Point, viewport: Size, widget: Size) -> Point {
    let (w, h) = (widget.width, widget.height);
    let mut x = offset.x;
    let mut y = offset.y;

    if offset.x < w / 2.0 {
        x = EDGE_MARGIN;
    } else if offset.x + w > viewport.width - w / 2.0 {
        x = viewport.width - w - EDGE_MARGIN;
    }

    if offset.y < h {
        y = EDGE_MARGIN;
    } else if offset.y + h > viewport.height - h {
        y = viewport.height - h - EDGE_MARGIN;
    } else {
        x = if offset.x + w / 2.0 > viewport.width / 2.0 {
            viewport.width - w - EDGE_MARGIN
        } else {
            EDGE_MARGIN
        };
    }

    Point::new(x, y)
}

/// Tracks the widget offset through drags.
#[derive(Debug, Clone)]
pub struct DockController {
    offset: Point,
    /// Pointer position relative to the widget's top-left corner, kept
    /// from the most recent drag start.
    grab: Vec2,
    dragging: bool,
    snap: bool,
}

impl DockController {
    pub fn new(initial_offset: Point, snap: bool) -> Self {
        Self {
            offset: initial_offset,
            grab: Vec2::ZERO,
            dragging: false,
            snap,
        }
    }

    /// Current top-left position in viewport space.
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Start a drag with the pointer at `pointer`.
    ///
    /// Only call this for pointer-downs on the widget's own surface.
    pub fn on_drag_start(&mut self, pointer: Point) {
        self.grab = pointer - self.offset;
        self.dragging = true;
        log::debug!("Drag started at {:?}", pointer);
    }

    /// Follow the pointer, keeping the grab point under it. Returns the new offset.
    pub fn on_drag_move(&mut self, pointer: Point) -> Point {
        self.offset = pointer - self.grab;
        self.offset
    }

    /// Finish the drag, docking to an edge when snapping is on.
    ///
    /// Returns `None` when snapping is disabled; the offset stays put.
    pub fn on_drag_end(&mut self, viewport: Size, widget: Size) -> Option<SnapOutcome> {
        self.dragging = false;
        if !self.snap {
            return None;
        }

        self.offset = snap_offset(self.offset, viewport, widget);
        log::debug!("Docked at {:?}", self.offset);
        Some(SnapOutcome {
            offset: self.offset,
            transition: SNAP_TRANSITION,
        })
    }
}
