//! Message types for inter-layer communication in the actor-based architecture.
//!
//! Key presses flow from the terminal thread to the app actor as [`UiEvent`],
//! background outcomes arrive as [`NetworkResponse`], and the actor answers
//! the terminal thread with [`RenderState`] snapshots.

pub mod ui_events;
pub mod network;
pub mod render;

pub use ui_events::UiEvent;
pub use network::NetworkResponse;
pub use render::RenderState;
