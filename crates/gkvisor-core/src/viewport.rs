//! Viewport metrics.

use kurbo::Size;

/// Read-only access to the dimensions of the display area hosting the widget.
///
/// Implementations answer from live state on every call; nothing is cached.
pub trait ViewportMetrics {
    /// Current viewport size in CSS pixels.
    fn viewport_size(&self) -> Size;
}
