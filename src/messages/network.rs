//! Network messages - outcomes marshaled from background tasks to the app actor

use crate::models::{RequestInput, RequestResult};
use crate::network::ClientError;

/// Sent exactly once per background task
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// The server answered (any status code)
    Success {
        id: u64,
        request: RequestInput,
        result: RequestResult,
    },
    /// No response was obtained
    Error { id: u64, error: ClientError },
    /// Startup version check finished; `Some` carries a newer version
    UpdateChecked { latest: Option<String> },
}

