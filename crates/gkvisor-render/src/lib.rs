//! GestureKit Visor Render Library
//!
//! Turns the command log of a recorded overlay surface into pixels, so
//! headless replays can be inspected as images.

mod raster;

pub use raster::{PngRenderResult, RasterError, Rasterizer, render_surface};
