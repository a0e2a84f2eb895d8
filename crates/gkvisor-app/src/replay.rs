//! Headless replay of recorded gesture event traces.
//!
//! A trace is a JSON document holding the viewport size, the widget options,
//! and the events in delivery order. Replaying it drives a real widget over a
//! recording surface and snapshots the trail at the end of every session.

use gkvisor_core::config::{ConfigError, Variant, WidgetConfig, WidgetOptions};
use gkvisor_core::events::{EventSource, GestureEvent, LocalEventSource, PointerEvent, TouchSample};
use gkvisor_core::surface::{DrawCommand, DrawingSurface, RecordingHost, TargetId};
use gkvisor_core::trail::TrailState;
use gkvisor_core::tutorial::RecordingPanel;
use gkvisor_core::widget::{OverlayWidget, WidgetError};
use gkvisor_render::{PngRenderResult, RasterError, render_surface};
use kurbo::Point;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid trace: {0}")]
    Trace(#[from] serde_json::Error),
    #[error("Viewport must be non-empty, got {0}x{1}")]
    EmptyViewport(f64, f64),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Widget(#[from] WidgetError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}

/// A recorded event trace.
#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    pub viewport: TraceViewport,
    #[serde(default)]
    pub options: serde_json::Value,
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TraceViewport {
    pub width: f64,
    pub height: f64,
}

/// Where a recorded pointer event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceTarget {
    Surface,
    #[default]
    #[serde(other)]
    Other,
}

/// One recorded event, tagged with its wire name.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TraceEvent {
    PointerStart {
        #[serde(default)]
        target: TraceTarget,
        touches: Vec<TouchSample>,
    },
    PointerMove {
        #[serde(default)]
        target: TraceTarget,
        touches: Vec<TouchSample>,
    },
    PointerEnd {
        #[serde(default)]
        target: TraceTarget,
        #[serde(default)]
        touches: Vec<TouchSample>,
    },
    GestureMotion {
        touches: Vec<TouchSample>,
    },
    GestureEnd,
}

impl TraceEvent {
    /// Build the live event, stamping `surface` on events recorded on the widget.
    fn to_event(&self, surface: TargetId) -> GestureEvent {
        let pointer = |target: &TraceTarget, touches: &[TouchSample]| {
            let target = match target {
                TraceTarget::Surface => surface,
                TraceTarget::Other => TargetId::OTHER,
            };
            PointerEvent::new(target, touches.to_vec())
        };

        match self {
            TraceEvent::PointerStart { target, touches } => GestureEvent::PointerStart(pointer(target, touches)),
            TraceEvent::PointerMove { target, touches } => GestureEvent::PointerMove(pointer(target, touches)),
            TraceEvent::PointerEnd { target, touches } => GestureEvent::PointerEnd(pointer(target, touches)),
            TraceEvent::GestureMotion { touches } => GestureEvent::GestureMotion {
                touches: touches.clone(),
            },
            TraceEvent::GestureEnd => GestureEvent::GestureEnd,
        }
    }
}

/// What one gesture session drew.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub index: usize,
    pub strokes: usize,
    pub markers: usize,
    /// Snapshot file, when an output directory was given.
    pub image: Option<PathBuf>,
}

/// Outcome of a replay.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub final_offset: Point,
    pub sessions: Vec<SessionSummary>,
    pub events_delivered: usize,
    pub tutorial_open: bool,
}

/// Replay `trace` through a fresh widget of `variant`.
///
/// With `out_dir`, every completed session is rasterized at `scale` and
/// written there as `session-N.png`.
pub fn replay(
    trace: &Trace,
    variant: Variant,
    out_dir: Option<&Path>,
    scale: f64,
) -> Result<ReplaySummary, ReplayError> {
    let TraceViewport { width, height } = trace.viewport;
    if !(width > 0.0 && height > 0.0) {
        return Err(ReplayError::EmptyViewport(width, height));
    }

    let options = WidgetOptions::from_value(&trace.options)?;
    let config = WidgetConfig::resolve(options, variant);
    let source = Rc::new(LocalEventSource::new());
    let events: Rc<dyn EventSource> = source.clone();
    let widget = OverlayWidget::new(config, variant, RecordingHost::new(width, height), events)?;
    if variant.has_tutorial() {
        widget.borrow_mut().attach_tutorial(Box::new(RecordingPanel::default()));
    }
    let target = widget.borrow().surface().target();

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut sessions = Vec::new();
    let mut delivered = 0;

    for recorded in &trace.events {
        let mut event = recorded.to_event(target);

        // Snapshot right before the session's end wipes the surface.
        let closes_session = matches!(event, GestureEvent::GestureEnd)
            && source.is_enabled()
            && widget.borrow().trail().state() == TrailState::Drawing;
        if closes_session {
            let mut w = widget.borrow_mut();
            let index = sessions.len();
            let image = match out_dir {
                Some(dir) => {
                    let path = dir.join(format!("session-{}.png", index));
                    write_png(&render_surface(w.surface(), scale)?, &path)?;
                    Some(path)
                }
                None => None,
            };
            // Each session's log starts fresh so snapshots only replay their own strokes.
            let (strokes, markers) = session_counts(&w.surface_mut().take_commands());
            log::info!("Session {}: {} segments, {} markers", index, strokes, markers);
            sessions.push(SessionSummary {
                index,
                strokes,
                markers,
                image,
            });
        }

        delivered += source.dispatch(&mut event);
    }

    let w = widget.borrow();
    let summary = ReplaySummary {
        final_offset: w.offset(),
        sessions,
        events_delivered: delivered,
        tutorial_open: w.tutorial().is_some_and(|t| t.is_open()),
    };
    log::info!("Replay finished at offset ({}, {})", summary.final_offset.x, summary.final_offset.y);
    Ok(summary)
}

/// Strokes and fills in one session's command log.
fn session_counts(commands: &[DrawCommand]) -> (usize, usize) {
    commands.iter().fold((0, 0), |(strokes, fills), c| match c {
        DrawCommand::Stroke => (strokes + 1, fills),
        DrawCommand::Fill => (strokes, fills + 1),
        _ => (strokes, fills),
    })
}

/// Encode rendered pixels as a PNG file.
pub fn encode_png(image: &PngRenderResult) -> Result<Vec<u8>, ReplayError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.rgba_data)?;
        writer.finish()?;
    }
    Ok(png_data)
}

fn write_png(image: &PngRenderResult, path: &Path) -> Result<(), ReplayError> {
    std::fs::write(path, encode_png(image)?)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"{
        "viewport": {"width": 800, "height": 600},
        "options": {"size": 60},
        "events": [
            {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 100, "pageY": 100}]},
            {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 300, "pageY": 200}]},
            {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 500, "pageY": 400}]},
            {"type": "gestureend"},
            {"type": "pointerstart", "target": "surface", "touches": [{"identifier": 0, "pageX": 10, "pageY": 10}]},
            {"type": "pointermove", "target": "surface", "touches": [{"identifier": 0, "pageX": 408, "pageY": 308}]},
            {"type": "pointerend", "target": "surface"}
        ]
    }"#;

    #[test]
    fn test_replay_counts_sessions_and_docks() {
        let trace = Trace::from_json(TRACE).unwrap();
        let summary = replay(&trace, Variant::Visor, None, 1.0).unwrap();

        assert_eq!(summary.sessions.len(), 1);
        assert_eq!(summary.sessions[0].strokes, 2);
        assert_eq!(summary.sessions[0].markers, 0);
        assert!(summary.sessions[0].image.is_none());
        assert_eq!(summary.final_offset, Point::new(738.0, 300.0));
        assert_eq!(summary.events_delivered, 7);
        assert!(!summary.tutorial_open);
    }

    #[test]
    fn test_replay_writes_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let trace = Trace::from_json(TRACE).unwrap();
        let summary = replay(&trace, Variant::Helper, Some(dir.path()), 2.0).unwrap();

        let path = summary.sessions[0].image.clone().unwrap();
        assert_eq!(path, dir.path().join("session-0.png"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(summary.sessions[0].markers, 1);
    }

    #[test]
    fn test_sessions_are_counted_separately() {
        let trace = Trace::from_json(
            r#"{
                "viewport": {"width": 800, "height": 600},
                "events": [
                    {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 100, "pageY": 100}]},
                    {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 200, "pageY": 100}]},
                    {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 300, "pageY": 100}]},
                    {"type": "gestureend"},
                    {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 100, "pageY": 300}]},
                    {"type": "gesturemotion", "touches": [{"identifier": 0, "pageX": 100, "pageY": 400}]},
                    {"type": "gestureend"}
                ]
            }"#,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let summary = replay(&trace, Variant::Visor, Some(dir.path()), 1.0).unwrap();

        let strokes: Vec<usize> = summary.sessions.iter().map(|s| s.strokes).collect();
        assert_eq!(strokes, vec![2, 1]);
        assert!(dir.path().join("session-1.png").exists());
    }

    #[test]
    fn test_helper_tap_in_trace_opens_tutorial() {
        let trace = Trace::from_json(
            r#"{
                "viewport": {"width": 800, "height": 600},
                "events": [
                    {"type": "pointerstart", "target": "surface", "touches": [{"identifier": 0, "pageX": 10, "pageY": 70}]},
                    {"type": "pointerend", "target": "surface"}
                ]
            }"#,
        )
        .unwrap();
        let summary = replay(&trace, Variant::Helper, None, 1.0).unwrap();
        assert!(summary.tutorial_open);
    }

    #[test]
    fn test_foreign_targets_do_not_drag() {
        let trace = Trace::from_json(
            r#"{
                "viewport": {"width": 800, "height": 600},
                "events": [
                    {"type": "pointerstart", "target": "page", "touches": [{"identifier": 0, "pageX": 10, "pageY": 10}]},
                    {"type": "pointermove", "touches": [{"identifier": 0, "pageX": 400, "pageY": 300}]},
                    {"type": "pointerend"}
                ]
            }"#,
        )
        .unwrap();
        let summary = replay(&trace, Variant::Visor, None, 1.0).unwrap();
        assert_eq!(summary.final_offset, Point::new(2.0, 2.0));
    }

    #[test]
    fn test_rejects_bad_input() {
        let trace = Trace::from_json(r#"{"viewport": {"width": 0, "height": 600}, "events": []}"#).unwrap();
        assert!(matches!(
            replay(&trace, Variant::Visor, None, 1.0),
            Err(ReplayError::EmptyViewport(..))
        ));

        let trace =
            Trace::from_json(r#"{"viewport": {"width": 10, "height": 10}, "options": {"snap": 1}, "events": []}"#)
                .unwrap();
        assert!(matches!(
            replay(&trace, Variant::Visor, None, 1.0),
            Err(ReplayError::Config(_))
        ));

        assert!(matches!(Trace::from_json("{}"), Err(ReplayError::Trace(_))));
    }
}
