//! The overlay widget.
//!
//! Composes the trail renderer and the dock controller around one drawing
//! surface, and wires them to the gesture event source:
//! - gesture motion draws the trail, gesture end wipes it
//! - pointer down / move / up on the surface drags and docks the widget
//! - on the helper, a tap on the surface opens the tutorial panel

mod overlay;
mod state;

pub use overlay::{OverlayWidget, WidgetError};
pub use state::PointerPhase;
