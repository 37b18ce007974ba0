//! Startup check for a newer published release

use std::sync::Arc;

use semver::Version;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::constants::UPDATE_URL;
use crate::messages::NetworkResponse;
use crate::models::{HeaderMap, HttpMethod};
use crate::network::HttpClient;

/// Latest version per platform, as published at [`UPDATE_URL`]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct VersionResult {
    windows: String,
    ubuntu: String,
    mac: String,
}

impl VersionResult {
    fn for_os(&self, os: &str) -> Option<&str> {
        match os {
            "windows" => Some(&self.windows),
            "linux" => Some(&self.ubuntu),
            "macos" => Some(&self.mac),
            _ => None,
        }
    }
}

/// The published version for `os` if it is newer than `current`
pub fn newer_version(body: &[u8], os: &str, current: &str) -> Option<String> {
    let versions: VersionResult = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed version response");
            return None;
        }
    };

    let Some(published) = versions.for_os(os) else {
        tracing::warn!(os, "No published version for this platform");
        return None;
    };
    let latest = match Version::parse(published.trim_start_matches('v')) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(published, error = %e, "Invalid version from server");
            return None;
        }
    };
    let current = Version::parse(current).ok()?;

    (latest > current).then(|| latest.to_string())
}

pub async fn check_latest<C: HttpClient>(client: &C, current: &str) -> Option<String> {
    match client
        .send(UPDATE_URL, HttpMethod::GET, &HeaderMap::new(), "")
        .await
    {
        Ok((meta, body)) if (200..300).contains(&meta.status) => {
            newer_version(&body, std::env::consts::OS, current)
        }
        Ok((meta, _)) => {
            tracing::warn!(status = meta.status, "Version check rejected");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Version check failed");
            None
        }
    }
}

/// Run the check on a background task and report back over `response_tx`
pub fn spawn_check<C: HttpClient>(
    client: Arc<C>,
    current: &'static str,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
) {
    tokio::spawn(async move {
        let latest = check_latest(&*client, current).await;
        let _ = response_tx.send(NetworkResponse::UpdateChecked { latest });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::fake::FakeClient;
    use crate::network::ClientError;

    const BODY: &[u8] = br#"{"Windows": "1.2.0", "Ubuntu": "v0.9.1", "Mac": "0.1.0"}"#;

    #[test]
    fn picks_the_running_platform() {
        assert_eq!(newer_version(BODY, "windows", "1.1.9").as_deref(), Some("1.2.0"));
        assert_eq!(newer_version(BODY, "linux", "0.9.0").as_deref(), Some("0.9.1"));
        assert_eq!(newer_version(BODY, "macos", "0.1.0"), None);
    }

    #[test]
    fn unknown_platform_or_garbage_yields_nothing() {
        assert_eq!(newer_version(BODY, "freebsd", "0.0.1"), None);
        assert_eq!(newer_version(b"not json", "linux", "0.0.1"), None);
        assert_eq!(newer_version(br#"{"Ubuntu": "soon"}"#, "linux", "0.0.1"), None);
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let client = FakeClient::failing(ClientError::Connect("offline".into()));
        assert_eq!(check_latest(&client, "0.1.0").await, None);
        assert_eq!(client.calls()[0].url, UPDATE_URL);
    }

    #[tokio::test]
    async fn spawned_check_reports_back() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let body = r#"{"Windows":"99.0.0","Ubuntu":"99.0.0","Mac":"99.0.0"}"#;
        let client = Arc::new(FakeClient::ok(200, "application/json", body));

        spawn_check(client, "0.1.0", tx);

        match rx.recv().await.unwrap() {
            NetworkResponse::UpdateChecked { latest } => {
                let expected = matches!(std::env::consts::OS, "windows" | "linux" | "macos")
                    .then(|| "99.0.0".to_string());
                assert_eq!(latest, expected);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
