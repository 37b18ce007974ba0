//! # Courier TUI
//!
//! A terminal HTTP request tester that keeps every completed exchange.
//!
//! ## Features
//! - HTTP methods: GET, POST, PUT, PATCH, DELETE, HEAD
//! - Request body editor and multi-valued headers
//! - Durable request history (SQLite)
//! - JSON syntax highlighting with selectable themes
//! - Optional update check on start-up
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - its own thread, draws snapshots and forwards keys
//! - App Layer - single actor owning the event bus, UI regions and stores
//! - Network Layer (Tokio) - one task per request, results sent back to the actor

pub mod app;
pub mod bus;
pub mod config;
pub mod constants;
pub mod highlight;
pub mod messages;
pub mod models;
pub mod network;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use app::AppActor;
pub use bus::{AppEvent, EventBus, Topic};
pub use config::Config;
pub use messages::{NetworkResponse, RenderState, UiEvent};
pub use models::{HistoryEntry, HttpMethod, RequestInput, RequestResponse, RequestResult};
pub use network::{Dispatcher, HttpClient, ReqwestClient};
pub use storage::{Database, HistoryStore, Settings, SettingsStore};
