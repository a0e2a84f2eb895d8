//! GestureKit Visor Application
//!
//! Shells around the core widget: a headless trace replayer for native
//! targets and the browser bindings for WebAssembly.

#[cfg(not(target_arch = "wasm32"))]
pub mod replay;

#[cfg(not(target_arch = "wasm32"))]
pub use replay::{ReplayError, ReplaySummary, SessionSummary, Trace, replay};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{Helper, Visor};
