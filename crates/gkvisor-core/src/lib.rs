//! GestureKit Visor Core Library
//!
//! Platform-agnostic logic for the floating gesture overlay: mapping
//! pointer coordinates onto the widget, drawing the live trail, and docking
//! the widget to a viewport edge after a drag.

pub mod config;
pub mod dock;
pub mod events;
pub mod mapper;
pub mod surface;
pub mod trail;
pub mod tutorial;
pub mod viewport;
pub mod widget;

pub use config::{ConfigError, Container, Variant, WidgetConfig, WidgetOptions};
pub use dock::{DockController, SnapOutcome, snap_offset};
pub use events::{EventKind, EventSource, GestureEvent, LocalEventSource, PointerEvent, TouchId, TouchSample};
pub use mapper::{Letterbox, map_point};
pub use surface::{
    DrawCommand, DrawContext, DrawingSurface, RecordingHost, RecordingSurface, SurfaceError, SurfaceHost,
    SurfaceSpec, TargetId, Transition,
};
pub use trail::{TrailRenderer, TrailState, TrailStyle};
pub use tutorial::{GestureHelp, RecordingPanel, TutorialError, TutorialView};
pub use viewport::ViewportMetrics;
pub use widget::{OverlayWidget, PointerPhase, WidgetError};
