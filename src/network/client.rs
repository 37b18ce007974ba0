//! HTTP client wrapper - issues exactly one call per request and buffers the body

use std::future::Future;

use thiserror::Error;

use crate::models::{HeaderMap, HttpMethod};

/// Status line and headers of a response; header names are lower-cased
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: HeaderMap,
}

/// Why a request produced no response
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Error reading body: {0}")]
    Body(String),
}

/// Seam between the dispatcher and the network.
///
/// No retry, no timeout, no redirect policy beyond the client default.
pub trait HttpClient: Send + Sync + 'static {
    fn send(
        &self,
        url: &str,
        method: HttpMethod,
        headers: &HeaderMap,
        body: &str,
    ) -> impl Future<Output = Result<(ResponseMeta, Vec<u8>), ClientError>> + Send;
}

/// [`HttpClient`] backed by reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        ReqwestClient {
            client: create_client(),
        }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestClient {
    async fn send(
        &self,
        url: &str,
        method: HttpMethod,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<(ResponseMeta, Vec<u8>), ClientError> {
        tracing::info!(
            %url,
            method = method.as_str(),
            ?headers,
            body_len = body.len(),
            "Sending request"
        );

        let resp = build_request(&self.client, url, method, headers, body)
            .send()
            .await
            .map_err(classify_error)?;

        let meta = ResponseMeta {
            status: resp.status().as_u16(),
            headers: lowercase_headers(resp.headers()),
        };
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Body(e.to_string()))?;

        Ok((meta, bytes.to_vec()))
    }
}

/// Build a request; GET and HEAD never get a body
fn build_request(
    client: &reqwest::Client,
    url: &str,
    method: HttpMethod,
    headers: &HeaderMap,
    body: &str,
) -> reqwest::RequestBuilder {
    let mut req_builder = match method {
        HttpMethod::GET => client.get(url),
        HttpMethod::POST => client.post(url),
        HttpMethod::PUT => client.put(url),
        HttpMethod::PATCH => client.patch(url),
        HttpMethod::DELETE => client.delete(url),
        HttpMethod::HEAD => client.head(url),
    };

    // One append per value, duplicates kept
    for (name, values) in headers {
        for value in values {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }
    }

    if method.has_body() {
        req_builder = req_builder.body(body.to_owned());
    }

    req_builder
}

fn classify_error(e: reqwest::Error) -> ClientError {
    if e.is_builder() {
        ClientError::InvalidRequest(e.to_string())
    } else if e.is_connect() {
        ClientError::Connect(e.to_string())
    } else {
        ClientError::Request(e.to_string())
    }
}

fn lowercase_headers(headers: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_ascii_lowercase())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(verb: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method(verb))
            .and(path("/ok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/plain")
                    .set_body_string("OK"),
            )
            .mount(&server)
            .await;
        server
    }

    async fn received_body(server: &MockServer) -> Vec<u8> {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "exactly one call must be issued");
        requests[0].body.clone()
    }

    #[tokio::test]
    async fn get_drops_the_body_and_buffers_response() {
        let server = server_with("GET").await;
        let url = format!("{}/ok", server.uri());

        let (meta, body) = ReqwestClient::new()
            .send(&url, HttpMethod::GET, &HeaderMap::new(), "should not be sent")
            .await
            .unwrap();

        assert_eq!(meta.status, 200);
        assert_eq!(meta.headers["content-type"], vec!["text/plain"]);
        assert_eq!(body, b"OK");
        assert!(received_body(&server).await.is_empty());
    }

    #[tokio::test]
    async fn head_drops_the_body() {
        let server = server_with("HEAD").await;
        let url = format!("{}/ok", server.uri());

        ReqwestClient::new()
            .send(&url, HttpMethod::HEAD, &HeaderMap::new(), "ignored")
            .await
            .unwrap();

        assert!(received_body(&server).await.is_empty());
    }

    #[tokio::test]
    async fn other_methods_send_body_verbatim() {
        let payload = "{\"name\": \"ünïcode\"}\n";
        for (verb, m) in [
            ("POST", HttpMethod::POST),
            ("PUT", HttpMethod::PUT),
            ("PATCH", HttpMethod::PATCH),
            ("DELETE", HttpMethod::DELETE),
        ] {
            let server = server_with(verb).await;
            let url = format!("{}/ok", server.uri());

            ReqwestClient::new()
                .send(&url, m, &HeaderMap::new(), payload)
                .await
                .unwrap();

            assert_eq!(received_body(&server).await, payload.as_bytes(), "{verb}");
        }
    }

    #[tokio::test]
    async fn duplicate_header_values_are_all_forwarded() {
        let server = server_with("GET").await;
        let url = format!("{}/ok", server.uri());
        let mut headers = HeaderMap::new();
        headers.insert("X-Multi".into(), vec!["one".into(), "two".into()]);

        ReqwestClient::new()
            .send(&url, HttpMethod::GET, &headers, "")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let values: Vec<_> = requests[0]
            .headers
            .get_all("x-multi")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error_value() {
        let result = ReqwestClient::new()
            .send("http://127.0.0.1:1/", HttpMethod::GET, &HeaderMap::new(), "")
            .await;

        assert!(matches!(result, Err(ClientError::Connect(_))));
    }

    #[tokio::test]
    async fn invalid_header_name_is_rejected_before_sending() {
        let mut headers = HeaderMap::new();
        headers.insert("bad header".into(), vec!["x".into()]);

        let result = ReqwestClient::new()
            .send("http://127.0.0.1:1/", HttpMethod::GET, &headers, "")
            .await;

        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn repeated_response_headers_keep_arrival_order() {
        let mut raw = reqwest::header::HeaderMap::new();
        raw.append("set-cookie", "a=1".parse().unwrap());
        raw.append("set-cookie", "b=2".parse().unwrap());

        let map = lowercase_headers(&raw);
        assert_eq!(map["set-cookie"], vec!["a=1", "b=2"]);
    }
}
