//! Live gesture trail drawing.

use crate::config::Variant;
use crate::events::{TouchId, TouchSample};
use crate::mapper::Letterbox;
use crate::surface::{DrawingSurface, LineCap, StrokeStyle};
use kurbo::{Point, Rect, Size};
use peniko::Color;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Width of trail segments, in surface pixels.
pub const TRAIL_WIDTH: f64 = 3.0;

/// Radius of the dot marking where a contact started.
pub const MARKER_RADIUS: f64 = 3.5;

/// Dot drawn at the first sample of a contact.
#[derive(Debug, Clone, Copy)]
pub struct MarkerStyle {
    pub radius: f64,
    pub color: Color,
}

/// How trails are drawn.
#[derive(Debug, Clone, Copy)]
pub struct TrailStyle {
    pub stroke: StrokeStyle,
    /// `None` draws nothing for the first sample of a contact.
    pub marker: Option<MarkerStyle>,
}

impl TrailStyle {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            stroke: StrokeStyle {
                color: Color::WHITE,
                width: TRAIL_WIDTH,
                cap: LineCap::Round,
            },
            marker: variant.marks_touch_start().then_some(MarkerStyle {
                radius: MARKER_RADIUS,
                color: Color::WHITE,
            }),
        }
    }
}

/// Whether a gesture session is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailState {
    #[default]
    Idle,
    Drawing,
}

/// Draws touch samples as connected segments, one polyline per contact.
#[derive(Debug, Clone)]
pub struct TrailRenderer {
    style: TrailStyle,
    idle_image: String,
    /// Last mapped point per contact since the session started.
    last_points: HashMap<TouchId, Point>,
    state: TrailState,
}

impl TrailRenderer {
    /// Create a renderer that restores `idle_image` between sessions.
    pub fn new(style: TrailStyle, idle_image: impl Into<String>) -> Self {
        Self {
            style,
            idle_image: idle_image.into(),
            last_points: HashMap::new(),
            state: TrailState::Idle,
        }
    }

    pub fn state(&self) -> TrailState {
        self.state
    }

    /// Last drawn point of a contact, in surface space.
    pub fn last_point(&self, id: TouchId) -> Option<Point> {
        self.last_points.get(&id).copied()
    }

    /// Number of contacts seen this session.
    pub fn active_contacts(&self) -> usize {
        self.last_points.len()
    }

    /// Draw one event's worth of samples, in order.
    pub fn on_samples<S>(&mut self, samples: &[TouchSample], viewport: Size, surface: &mut S)
    where
        S: DrawingSurface + ?Sized,
    {
        if self.state == TrailState::Idle {
            log::debug!("Trail session started");
        }
        self.state = TrailState::Drawing;
        surface.set_background_image(None);

        let letterbox = Letterbox::fit(viewport, surface.size());

        for sample in samples {
            let point = letterbox.apply(sample.position());

            match self.last_points.get(&sample.identifier) {
                Some(&last) => {
                    surface.begin_path();
                    surface.move_to(last);
                    surface.line_to(point);
                    surface.set_stroke_style(self.style.stroke);
                    surface.stroke();
                }
                None => {
                    if let Some(marker) = self.style.marker {
                        surface.begin_path();
                        surface.arc(point, marker.radius, 0.0, 2.0 * PI);
                        surface.set_fill_color(marker.color);
                        surface.fill();
                    }
                }
            }

            self.last_points.insert(sample.identifier, point);
        }
    }

    /// Wipe the surface and forget every contact. Safe to call repeatedly.
    pub fn on_session_end<S>(&mut self, surface: &mut S)
    where
        S: DrawingSurface + ?Sized,
    {
        self.last_points.clear();
        let size = surface.size();
        surface.clear_rect(Rect::new(0.0, 0.0, size, size));
        surface.set_background_image(Some(&self.idle_image));
        if self.state == TrailState::Drawing {
            log::debug!("Trail session ended");
        }
        self.state = TrailState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Container;
    use crate::surface::{DrawCommand, RecordingSurface, SurfaceSpec, TargetId};

    /// A 100x100 surface over a 100x100 viewport maps points one to one.
    fn surface() -> RecordingSurface {
        RecordingSurface::new(
            TargetId(1),
            SurfaceSpec {
                size: 100.0,
                background: Color::BLACK,
                idle_image: "idle.png".to_string(),
                offset: Point::ZERO,
                corner_radius: 10.0,
                z_index: 999,
                class_name: None,
                anchor_top_left: false,
                container: Container::Body,
            },
        )
    }

    const VIEWPORT: Size = Size::new(100.0, 100.0);

    #[test]
    fn test_two_samples_draw_one_segment() {
        let mut surface = surface();
        let mut trail = TrailRenderer::new(TrailStyle::for_variant(Variant::Visor), "idle.png");

        trail.on_samples(&[TouchSample::new(7, 10.0, 10.0)], VIEWPORT, &mut surface);
        assert_eq!(surface.stroke_count(), 0);
        assert_eq!(surface.fill_count(), 0);

        trail.on_samples(&[TouchSample::new(7, 20.0, 20.0)], VIEWPORT, &mut surface);
        assert_eq!(surface.stroke_count(), 1);

        let cmds = surface.commands();
        assert!(cmds.iter().any(|c| matches!(c, DrawCommand::MoveTo(p) if *p == Point::new(10.0, 10.0))));
        assert!(cmds.iter().any(|c| matches!(c, DrawCommand::LineTo(p) if *p == Point::new(20.0, 20.0))));
        assert!(cmds.iter().any(|c| matches!(
            c,
            DrawCommand::SetStrokeStyle(s) if s.cap == LineCap::Round && (s.width - TRAIL_WIDTH).abs() < f64::EPSILON
        )));
        assert_eq!(trail.last_point(TouchId(7)), Some(Point::new(20.0, 20.0)));
    }

    #[test]
    fn test_contacts_are_tracked_separately() {
        let mut surface = surface();
        let mut trail = TrailRenderer::new(TrailStyle::for_variant(Variant::Visor), "idle.png");

        trail.on_samples(
            &[TouchSample::new(1, 0.0, 0.0), TouchSample::new(2, 50.0, 50.0)],
            VIEWPORT,
            &mut surface,
        );
        assert_eq!(surface.stroke_count(), 0);
        assert_eq!(trail.active_contacts(), 2);

        trail.on_samples(
            &[TouchSample::new(1, 5.0, 0.0), TouchSample::new(2, 55.0, 50.0)],
            VIEWPORT,
            &mut surface,
        );
        assert_eq!(surface.stroke_count(), 2);
        assert_eq!(trail.last_point(TouchId(2)), Some(Point::new(55.0, 50.0)));
    }

    #[test]
    fn test_helper_marks_touch_start() {
        let mut surface = surface();
        let mut trail = TrailRenderer::new(TrailStyle::for_variant(Variant::Helper), "idle.png");

        trail.on_samples(&[TouchSample::new(1, 30.0, 40.0)], VIEWPORT, &mut surface);
        assert_eq!(surface.fill_count(), 1);
        assert!(surface.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Arc { center, radius, .. }
                if *center == Point::new(30.0, 40.0) && (*radius - MARKER_RADIUS).abs() < f64::EPSILON
        )));
    }

    #[test]
    fn test_drawing_hides_idle_image() {
        let mut surface = surface();
        let mut trail = TrailRenderer::new(TrailStyle::for_variant(Variant::Visor), "idle.png");
        assert_eq!(trail.state(), TrailState::Idle);

        trail.on_samples(&[TouchSample::new(1, 1.0, 1.0)], VIEWPORT, &mut surface);
        assert_eq!(trail.state(), TrailState::Drawing);
        assert_eq!(surface.background_image(), None);

        trail.on_session_end(&mut surface);
        assert_eq!(trail.state(), TrailState::Idle);
        assert_eq!(surface.background_image(), Some("idle.png"));
    }

    #[test]
    fn test_session_end_is_idempotent() {
        let mut surface = surface();
        let mut trail = TrailRenderer::new(TrailStyle::for_variant(Variant::Visor), "idle.png");
        trail.on_samples(&[TouchSample::new(1, 1.0, 1.0)], VIEWPORT, &mut surface);

        trail.on_session_end(&mut surface);
        assert_eq!(trail.active_contacts(), 0);
        trail.on_session_end(&mut surface);
        assert_eq!(trail.active_contacts(), 0);
        assert_eq!(trail.state(), TrailState::Idle);

        // A new session starts fresh: the first sample draws no segment.
        trail.on_samples(&[TouchSample::new(1, 9.0, 9.0)], VIEWPORT, &mut surface);
        assert_eq!(surface.stroke_count(), 0);
    }
}
