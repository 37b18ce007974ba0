//! App layer - central state management and command processing
//!
//! The App actor receives UI events and network responses, drives the UI
//! regions through the event bus, and emits render state.

pub mod state;
pub mod actor;
pub mod commands;
pub mod regions;

pub use state::AppState;
pub use actor::AppActor;
pub use commands::{validate_request, ValidationError};
