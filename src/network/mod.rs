//! Network layer - HTTP client wrapper and the request dispatcher
//!
//! The dispatcher runs each call on its own tokio task and hands the outcome
//! back to the app actor as a [`NetworkResponse`](crate::messages::NetworkResponse).

pub mod client;
pub mod dispatcher;
pub mod update;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{ClientError, HttpClient, ReqwestClient, ResponseMeta};
pub use dispatcher::Dispatcher;
