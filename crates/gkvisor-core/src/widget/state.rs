//! Pointer interaction state of the overlay.

/// Where the pointer is in a press-move-release cycle on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPhase {
    /// No pointer is down on the surface.
    #[default]
    Idle,
    /// Pointer went down on the surface and has not moved yet.
    Pressed,
    /// Pointer moved since it went down; the widget is being dragged.
    Dragging,
}

impl PointerPhase {
    /// A release in this phase is a tap rather than the end of a drag.
    pub fn is_tap(self) -> bool {
        !matches!(self, PointerPhase::Dragging)
    }
}
