//! Scripted in-process client for dispatcher and actor tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{HeaderMap, HttpMethod};
use crate::network::{ClientError, HttpClient, ResponseMeta};

pub(crate) type Reply = Result<(ResponseMeta, Vec<u8>), ClientError>;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordedCall {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HeaderMap,
    pub body: String,
}

/// Replies are consumed in order; the last one repeats once the script runs out
#[derive(Clone, Default)]
pub(crate) struct FakeClient {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay: Duration,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeClient {
    pub fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
        FakeClient {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            ..Self::default()
        }
    }

    pub fn ok(status: u16, content_type: &str, body: &str) -> Self {
        Self::replying([Ok((meta(status, content_type), body.as_bytes().to_vec()))])
    }

    pub fn failing(error: ClientError) -> Self {
        Self::replying([Err(error)])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of calls observed in flight at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ClientError::Request("no scripted reply".into())))
        }
    }
}

pub(crate) fn meta(status: u16, content_type: &str) -> ResponseMeta {
    let mut headers = HeaderMap::new();
    headers.insert("content-type".into(), vec![content_type.to_string()]);
    ResponseMeta { status, headers }
}

impl HttpClient for FakeClient {
    async fn send(&self, url: &str, method: HttpMethod, headers: &HeaderMap, body: &str) -> Reply {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            method,
            headers: headers.clone(),
            body: body.to_string(),
        });

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        self.next_reply()
    }
}
