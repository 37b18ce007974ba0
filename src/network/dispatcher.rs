//! Request dispatcher - one background task per request, outcome sent back to the actor

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::messages::NetworkResponse;
use crate::models::{RequestInput, RequestResult};
use crate::network::HttpClient;

/// Owns every in-flight request task.
///
/// Tasks never touch UI state: each one sends a single [`NetworkResponse`]
/// and exits. Completions arrive in whatever order the network delivers them.
pub struct Dispatcher<C: HttpClient> {
    client: Arc<C>,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    tasks: JoinSet<()>,
    limit: Option<Arc<Semaphore>>,
    next_id: u64,
}

impl<C: HttpClient> Dispatcher<C> {
    pub fn new(client: C, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        Dispatcher {
            client: Arc::new(client),
            response_tx,
            tasks: JoinSet::new(),
            limit: None,
            next_id: 1,
        }
    }

    /// Allow at most `max_in_flight` network calls at once; extra requests wait
    pub fn with_limit(mut self, max_in_flight: usize) -> Self {
        self.limit = Some(Arc::new(Semaphore::new(max_in_flight.max(1))));
        self
    }

    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// Channel back to the actor, for other background work that reports in
    pub fn response_sender(&self) -> mpsc::UnboundedSender<NetworkResponse> {
        self.response_tx.clone()
    }

    /// Start a request; the inputs are owned by the task from here on
    pub fn dispatch(&mut self, request: RequestInput) -> u64 {
        self.reap();

        let id = self.next_id;
        self.next_id += 1;

        let client = Arc::clone(&self.client);
        let response_tx = self.response_tx.clone();
        let limit = self.limit.clone();

        self.tasks.spawn(async move {
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };

            tracing::info!(id, url = %request.path, method = request.method.as_str(), "Executing request");
            let start = Instant::now();
            let outcome = client
                .send(&request.path, request.method, &request.headers, &request.body)
                .await;
            let duration = start.elapsed();

            let response = match outcome {
                Ok((meta, body)) => {
                    tracing::info!(id, status = meta.status, ?duration, "Request completed");
                    NetworkResponse::Success {
                        id,
                        request,
                        result: RequestResult {
                            status_code: meta.status,
                            headers: meta.headers,
                            response_body: body,
                            duration,
                        },
                    }
                }
                Err(error) => {
                    tracing::warn!(id, %error, "Request failed");
                    NetworkResponse::Error { id, error }
                }
            };

            let _ = response_tx.send(response);
        });

        id
    }

    /// Requests started and not yet finished
    pub fn in_flight(&mut self) -> usize {
        self.reap();
        self.tasks.len()
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Request task did not finish cleanly");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeaderMap, HttpMethod};
    use crate::network::fake::FakeClient;
    use crate::network::ClientError;
    use std::time::Duration;

    fn input(method: HttpMethod, url: &str, body: &str) -> RequestInput {
        let mut headers = HeaderMap::new();
        headers.insert("Accept".into(), vec!["text/plain".into()]);
        RequestInput {
            method,
            path: url.to_string(),
            headers,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn success_is_marshaled_back_with_captured_input() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = FakeClient::ok(200, "text/plain", "OK");
        let mut dispatcher = Dispatcher::new(client.clone(), tx);

        let sent = input(HttpMethod::POST, "https://example.com/ok", "payload");
        let id = dispatcher.dispatch(sent.clone());

        match rx.recv().await.unwrap() {
            NetworkResponse::Success {
                id: got,
                request,
                result,
            } => {
                assert_eq!(got, id);
                assert_eq!(request, sent);
                assert_eq!(result.status_code, 200);
                assert_eq!(result.response_body, b"OK");
                assert_eq!(result.content_type(), "text/plain");
            }
            other => panic!("unexpected {other:?}"),
        }

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body, "payload");
        assert_eq!(calls[0].headers, sent.headers);
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let refused = ClientError::Connect("refused".into());
        let mut dispatcher = Dispatcher::new(FakeClient::failing(refused.clone()), tx);

        let id = dispatcher.dispatch(input(HttpMethod::GET, "http://unreachable.invalid", ""));

        match rx.recv().await.unwrap() {
            NetworkResponse::Error { id: got, error } => {
                assert_eq!(got, id);
                assert_eq!(error, refused);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn ids_increase_and_dispatch_is_unbounded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = FakeClient::ok(200, "text/plain", "OK").with_delay(Duration::from_millis(50));
        let mut dispatcher = Dispatcher::new(client.clone(), tx);

        let ids: Vec<u64> = (0..3)
            .map(|_| dispatcher.dispatch(input(HttpMethod::GET, "https://example.com", "")))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        for _ in 0..3 {
            rx.recv().await.unwrap();
        }
        assert_eq!(client.peak_concurrency(), 3);
    }

    #[tokio::test]
    async fn optional_limit_caps_concurrency() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = FakeClient::ok(200, "text/plain", "OK").with_delay(Duration::from_millis(20));
        let mut dispatcher = Dispatcher::new(client.clone(), tx).with_limit(1);

        for _ in 0..3 {
            dispatcher.dispatch(input(HttpMethod::GET, "https://example.com", ""));
        }
        for _ in 0..3 {
            rx.recv().await.unwrap();
        }
        assert_eq!(client.peak_concurrency(), 1);
    }
}
