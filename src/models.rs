use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Header name to every value sent or received under that name
pub type HeaderMap = BTreeMap<String, Vec<String>>;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::PATCH,
        HttpMethod::DELETE,
        HttpMethod::HEAD,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
        }
    }

    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::PUT,
            HttpMethod::PUT => HttpMethod::PATCH,
            HttpMethod::PATCH => HttpMethod::DELETE,
            HttpMethod::DELETE => HttpMethod::HEAD,
            HttpMethod::HEAD => HttpMethod::GET,
        }
    }

    /// GET and HEAD never carry a body, whatever the editor contains
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::GET | HttpMethod::HEAD)
    }
}

/// One editable header row in the path bar
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

/// Collapse enabled header rows into a multi-valued map, keeping row order per name
pub fn header_map(rows: &[Header]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for row in rows.iter().filter(|h| h.enabled && !h.key.is_empty()) {
        map.entry(row.key.clone()).or_default().push(row.value.clone());
    }
    map
}

/// Expand a header map back into editable rows
pub fn header_rows(map: &HeaderMap) -> Vec<Header> {
    map.iter()
        .flat_map(|(name, values)| values.iter().map(move |v| Header::new(name.clone(), v.clone())))
        .collect()
}

/// Everything captured from the path bar when a request is dispatched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    pub method: HttpMethod,
    pub path: String,
    pub headers: HeaderMap,
    #[serde(default)]
    pub body: String,
}

/// What came back from the server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    pub status_code: u16,
    pub headers: HeaderMap,
    #[serde(with = "body_base64")]
    pub response_body: Vec<u8>,
    pub duration: Duration,
}

impl RequestResult {
    /// First `content-type` value, or an empty string
    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|values| values.first())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A completed exchange; the unit of persistence, immutable once built
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestResponse {
    pub request: RequestInput,
    pub response: RequestResult,
}

/// A stored exchange with its history key
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub key: String,
    pub record: RequestResponse,
}

mod body_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_get_and_head_are_bodiless() {
        let bodiless: Vec<_> = HttpMethod::ALL.iter().filter(|m| !m.has_body()).collect();
        assert_eq!(bodiless, vec![&HttpMethod::GET, &HttpMethod::HEAD]);
    }

    #[test]
    fn method_cycle_visits_every_method() {
        let mut method = HttpMethod::GET;
        for expected in HttpMethod::ALL.iter().skip(1) {
            method = method.next();
            assert_eq!(&method, expected);
        }
        assert_eq!(method.next(), HttpMethod::GET);
    }

    #[test]
    fn header_map_groups_duplicates_and_skips_disabled() {
        let mut disabled = Header::new("X-Off", "1");
        disabled.enabled = false;
        let rows = vec![
            Header::new("Accept", "text/plain"),
            disabled,
            Header::new("Accept", "application/json"),
            Header::new("", "orphan"),
        ];

        let map = header_map(&rows);
        assert_eq!(map.len(), 1);
        assert_eq!(map["Accept"], vec!["text/plain", "application/json"]);
        assert_eq!(header_rows(&map).len(), 2);
    }

    #[test]
    fn content_type_reads_first_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type".into(),
            vec!["application/json".into(), "text/plain".into()],
        );
        let result = RequestResult {
            status_code: 200,
            headers,
            response_body: Vec::new(),
            duration: Duration::ZERO,
        };
        assert_eq!(result.content_type(), "application/json");
    }

    #[test]
    fn binary_body_survives_json_encoding() {
        let result = RequestResult {
            status_code: 200,
            headers: HeaderMap::new(),
            response_body: vec![0, 159, 146, 150, 255],
            duration: Duration::from_millis(12),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"response_body\":\"AJ+Slv8=\""));
        let back: RequestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
