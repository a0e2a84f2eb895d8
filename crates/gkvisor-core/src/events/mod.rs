//! Events consumed from the gesture event source.
//!
//! The widget only ever listens; it never emits. The event source is
//! injected at construction through the [`EventSource`] trait.

mod local;

pub use local::LocalEventSource;

use crate::surface::TargetId;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of one finger for the duration of its contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TouchId(pub i64);

/// One contact's position at one event tick, in viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchSample {
    pub identifier: TouchId,
    #[serde(rename = "pageX")]
    pub x: f64,
    #[serde(rename = "pageY")]
    pub y: f64,
}

impl TouchSample {
    pub fn new(identifier: i64, x: f64, y: f64) -> Self {
        Self {
            identifier: TouchId(identifier),
            x,
            y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Payload of the pointer events.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// Surface the pointer landed on.
    pub target: TargetId,
    pub touches: Vec<TouchSample>,
    default_prevented: bool,
}

impl PointerEvent {
    pub fn new(target: TargetId, touches: Vec<TouchSample>) -> Self {
        Self {
            target,
            touches,
            default_prevented: false,
        }
    }

    /// Single-touch convenience constructor.
    pub fn at(target: TargetId, x: f64, y: f64) -> Self {
        Self::new(target, vec![TouchSample::new(0, x, y)])
    }

    /// Position of the first touch, which drives dragging.
    pub fn primary(&self) -> Option<Point> {
        self.touches.first().map(TouchSample::position)
    }

    /// Ask the platform not to scroll or select for this pointer stream.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Everything the event source can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    PointerStart(PointerEvent),
    PointerMove(PointerEvent),
    PointerEnd(PointerEvent),
    GestureMotion { touches: Vec<TouchSample> },
    GestureEnd,
}

impl GestureEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GestureEvent::PointerStart(_) => EventKind::PointerStart,
            GestureEvent::PointerMove(_) => EventKind::PointerMove,
            GestureEvent::PointerEnd(_) => EventKind::PointerEnd,
            GestureEvent::GestureMotion { .. } => EventKind::GestureMotion,
            GestureEvent::GestureEnd => EventKind::GestureEnd,
        }
    }

    /// Pointer payload, for the three pointer events.
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            GestureEvent::PointerStart(p) | GestureEvent::PointerMove(p) | GestureEvent::PointerEnd(p) => {
                Some(p)
            }
            _ => None,
        }
    }
}

/// Names of the events, as the event source spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerStart,
    PointerMove,
    PointerEnd,
    GestureMotion,
    GestureEnd,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::PointerStart,
        EventKind::PointerMove,
        EventKind::PointerEnd,
        EventKind::GestureMotion,
        EventKind::GestureEnd,
    ];

    /// Wire name used by the event source.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::PointerStart => "pointerstart",
            EventKind::PointerMove => "pointermove",
            EventKind::PointerEnd => "pointerend",
            EventKind::GestureMotion => "gesturemotion",
            EventKind::GestureEnd => "gestureend",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether the event comes out of gesture recognition, which
    /// [`EventSource::disable`] suspends.
    pub fn is_recognition(self) -> bool {
        matches!(self, EventKind::GestureMotion | EventKind::GestureEnd)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callback registered with an event source.
pub type Handler = Box<dyn FnMut(&mut GestureEvent)>;

/// The gesture event source the widget listens to.
///
/// Everything runs on one UI thread, so methods take `&self` and
/// implementations use interior mutability.
pub trait EventSource {
    /// Register `handler` for every future event of `kind`.
    fn subscribe(&self, kind: EventKind, handler: Handler);

    /// Suspend gesture recognition. Pointer events keep flowing.
    fn disable(&self);

    /// Resume gesture recognition.
    fn enable(&self);

    fn is_enabled(&self) -> bool;
}
