//! Drawing surface abstraction.
//!
//! The widget never touches a platform canvas directly. It draws through
//! [`DrawContext`], positions itself through [`DrawingSurface`], and obtains
//! the surface from a [`SurfaceHost`].

mod recording;

pub use recording::{DrawCommand, RecordingHost, RecordingSurface};

use crate::config::Container;
use crate::viewport::ViewportMetrics;
use kurbo::{Point, Rect};
use peniko::Color;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Surface creation errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Container not found: {0}")]
    ContainerNotFound(String),
    #[error("2D context unavailable")]
    ContextUnavailable,
    #[error("Surface error: {0}")]
    Other(String),
}

/// Identity of a pointer-event target.
///
/// Hosts assign one to every surface they create and stamp it on pointer
/// events that land on that surface. Identities are unique per process, so
/// widgets on separate hosts never claim each other's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);

impl TargetId {
    /// Target of events that landed outside any known surface.
    pub const OTHER: TargetId = TargetId(0);

    /// Allocate a fresh identity for a new surface.
    pub fn next() -> TargetId {
        TargetId(NEXT_TARGET.fetch_add(1, Ordering::Relaxed))
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    /// Canvas 2D `lineCap` keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

/// Stroke parameters applied before a `stroke()`.
#[derive(Debug, Clone, Copy)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    pub cap: LineCap,
}

/// Easing curve of a position transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    EaseInOut,
}

impl Easing {
    /// CSS timing-function keyword.
    pub fn as_css(self) -> &'static str {
        match self {
            Easing::EaseInOut => "ease-in-out",
        }
    }
}

/// Animated repositioning applied to the next transform change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub duration: Duration,
    pub easing: Easing,
}

/// Transition used when the widget docks to an edge.
pub const SNAP_TRANSITION: Transition = Transition {
    duration: Duration::from_millis(200),
    easing: Easing::EaseInOut,
};

/// Path-based 2D drawing primitives, modelled on the canvas 2D context.
pub trait DrawContext {
    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point);
    fn line_to(&mut self, point: Point);
    /// Add a circular arc around `center`, angles in radians.
    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64);
    fn set_stroke_style(&mut self, style: StrokeStyle);
    fn stroke(&mut self);
    fn set_fill_color(&mut self, color: Color);
    fn fill(&mut self);
    fn clear_rect(&mut self, rect: Rect);
}

/// A square, absolutely positioned drawable owned by one widget.
pub trait DrawingSurface: DrawContext {
    /// Identity stamped on pointer events that hit this surface.
    fn target(&self) -> TargetId;

    /// Side length in pixels.
    fn size(&self) -> f64;

    /// Swap the idle background image; `None` shows the plain fill.
    fn set_background_image(&mut self, url: Option<&str>);

    /// Move the surface so its top-left corner sits at `offset`.
    fn set_transform(&mut self, offset: Point);

    /// Set or clear the transition applied to transform changes.
    fn set_transition(&mut self, transition: Option<Transition>);

    /// Clear the transition once `after` has elapsed. Fire and forget.
    fn schedule_transition_reset(&mut self, after: Duration);

    fn set_visible(&mut self, visible: bool);
}

/// Everything needed to create a surface.
#[derive(Debug, Clone)]
pub struct SurfaceSpec {
    pub size: f64,
    pub background: Color,
    pub idle_image: String,
    pub offset: Point,
    pub corner_radius: f64,
    pub z_index: i32,
    /// CSS class of the surface element, if any.
    pub class_name: Option<String>,
    /// Pin the surface's fixed position to the top-left corner before the
    /// transform is applied.
    pub anchor_top_left: bool,
    pub container: Container,
}

/// Creates surfaces inside a container and reports the viewport around them.
pub trait SurfaceHost: ViewportMetrics {
    type Surface: DrawingSurface;

    fn create_surface(&self, spec: &SurfaceSpec) -> Result<Self::Surface, SurfaceError>;
}
