//! In-memory surface that records every call.
//!
//! Useful for headless replay and for testing widget behavior without a
//! browser. The command log is replayed by the rasterizer in `gkvisor-render`.

use super::{
    DrawContext, DrawingSurface, StrokeStyle, SurfaceError, SurfaceHost, SurfaceSpec, TargetId,
    Transition,
};
use crate::viewport::ViewportMetrics;
use kurbo::{Point, Rect, Size};
use peniko::Color;
use std::cell::Cell;
use std::time::Duration;

/// One recorded drawing call.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    SetStrokeStyle(StrokeStyle),
    Stroke,
    SetFillColor(Color),
    Fill,
    ClearRect(Rect),
}

/// A surface that keeps its drawing log and visual state in memory.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    target: TargetId,
    spec: SurfaceSpec,
    commands: Vec<DrawCommand>,
    background_image: Option<String>,
    offset: Point,
    transition: Option<Transition>,
    pending_resets: Vec<Duration>,
    visible: bool,
}

impl RecordingSurface {
    /// Create a surface from a spec, with the given event target identity.
    pub fn new(target: TargetId, spec: SurfaceSpec) -> Self {
        Self {
            target,
            background_image: Some(spec.idle_image.clone()),
            offset: spec.offset,
            spec,
            commands: Vec::new(),
            transition: None,
            pending_resets: Vec::new(),
            visible: true,
        }
    }

    /// The spec the surface was created from.
    pub fn spec(&self) -> &SurfaceSpec {
        &self.spec
    }

    /// All drawing calls so far, oldest first.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hand over the command log, leaving it empty. Visual state is untouched.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of `stroke()` calls recorded.
    pub fn stroke_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke))
            .count()
    }

    /// Number of `fill()` calls recorded.
    pub fn fill_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill))
            .count()
    }

    pub fn background_image(&self) -> Option<&str> {
        self.background_image.as_deref()
    }

    /// Current top-left position.
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    /// Transition resets scheduled but not yet fired.
    pub fn pending_resets(&self) -> &[Duration] {
        &self.pending_resets
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Run every scheduled transition reset, as if their timers elapsed.
    pub fn fire_timers(&mut self) {
        if !self.pending_resets.is_empty() {
            self.pending_resets.clear();
            self.transition = None;
        }
    }
}

impl DrawContext for RecordingSurface {
    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, point: Point) {
        self.commands.push(DrawCommand::MoveTo(point));
    }

    fn line_to(&mut self, point: Point) {
        self.commands.push(DrawCommand::LineTo(point));
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn set_stroke_style(&mut self, style: StrokeStyle) {
        self.commands.push(DrawCommand::SetStrokeStyle(style));
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetFillColor(color));
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill);
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::ClearRect(rect));
    }
}

impl DrawingSurface for RecordingSurface {
    fn target(&self) -> TargetId {
        self.target
    }

    fn size(&self) -> f64 {
        self.spec.size
    }

    fn set_background_image(&mut self, url: Option<&str>) {
        self.background_image = url.map(str::to_string);
    }

    fn set_transform(&mut self, offset: Point) {
        self.offset = offset;
    }

    fn set_transition(&mut self, transition: Option<Transition>) {
        self.transition = transition;
    }

    fn schedule_transition_reset(&mut self, after: Duration) {
        self.pending_resets.push(after);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Host handing out [`RecordingSurface`]s inside a resizable fixed viewport.
#[derive(Debug)]
pub struct RecordingHost {
    viewport: Cell<Size>,
}

impl RecordingHost {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Cell::new(Size::new(width, height)),
        }
    }

    /// Simulate a viewport resize.
    pub fn set_viewport(&self, size: Size) {
        self.viewport.set(size);
    }
}

impl ViewportMetrics for RecordingHost {
    fn viewport_size(&self) -> Size {
        self.viewport.get()
    }
}

impl SurfaceHost for RecordingHost {
    type Surface = RecordingSurface;

    fn create_surface(&self, spec: &SurfaceSpec) -> Result<RecordingSurface, SurfaceError> {
        if !(spec.size.is_finite() && spec.size > 0.0) {
            return Err(SurfaceError::Other(format!("invalid size {}", spec.size)));
        }
        Ok(RecordingSurface::new(TargetId::next(), spec.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Container;

    fn spec() -> SurfaceSpec {
        SurfaceSpec {
            size: 40.0,
            background: Color::BLACK,
            idle_image: "idle.png".to_string(),
            offset: Point::new(2.0, 2.0),
            corner_radius: 10.0,
            z_index: 999,
            class_name: None,
            anchor_top_left: false,
            container: Container::Body,
        }
    }

    #[test]
    fn test_targets_unique_across_hosts() {
        let a = RecordingHost::new(800.0, 600.0).create_surface(&spec()).unwrap();
        let b = RecordingHost::new(800.0, 600.0).create_surface(&spec()).unwrap();
        assert_ne!(a.target(), b.target());
        assert_ne!(a.target(), TargetId::OTHER);
    }

    #[test]
    fn test_take_commands_empties_log() {
        let mut surface = RecordingSurface::new(TargetId::next(), spec());
        surface.begin_path();
        surface.stroke();
        surface.set_background_image(None);

        let taken = surface.take_commands();
        assert_eq!(taken.len(), 2);
        assert!(surface.commands().is_empty());
        assert_eq!(surface.background_image(), None);
    }

    #[test]
    fn test_rejects_empty_size() {
        let mut bad = spec();
        bad.size = 0.0;
        assert!(RecordingHost::new(10.0, 10.0).create_surface(&bad).is_err());
    }
}
