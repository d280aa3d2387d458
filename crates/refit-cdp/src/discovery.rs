//! Target discovery over the debugging endpoint's HTTP surface.

use serde::Deserialize;

use crate::error::CdpError;

/// One debuggable target as listed by the discovery endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetInfo {
    #[serde(rename = "type", default)]
    pub target_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetInfo {
    /// Whether this target is a page whose URL mentions the fragment.
    pub fn is_host_page(&self, url_fragment: &str) -> bool {
        self.target_type == "page" && self.url.contains(url_fragment)
    }
}

/// Client for the discovery endpoint (`http://host:port`).
pub struct DiscoveryClient {
    endpoint: String,
    http: reqwest::Client,
}

impl DiscoveryClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// List all debuggable targets.
    pub async fn targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let url = format!("{}/json", self.endpoint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| CdpError::Transport(err.to_string()))?;
        response
            .json::<Vec<TargetInfo>>()
            .await
            .map_err(|err| CdpError::Protocol(err.to_string()))
    }

    /// Find the host-document page target and its debugger URL.
    pub async fn find_host_target(&self, url_fragment: &str) -> Result<(TargetInfo, String), CdpError> {
        let targets = self.targets().await?;
        let target = targets
            .into_iter()
            .find(|t| t.is_host_page(url_fragment))
            .ok_or_else(|| CdpError::NoTarget {
                endpoint: self.endpoint.clone(),
            })?;
        let ws_url = target
            .web_socket_debugger_url
            .clone()
            .ok_or_else(|| CdpError::NoDebuggerUrl {
                title: target.title.clone(),
            })?;
        Ok((target, ws_url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn target_list_parses_and_filters() {
        let json = r#"[
            {"type": "service_worker", "title": "worker", "url": "https://app.example.test/sw.js"},
            {"type": "page", "title": "Workspace",
             "url": "https://app.example.test/client/T1",
             "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/AB12"}
        ]"#;
        let targets: Vec<TargetInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(targets.len(), 2);
        assert!(!targets[0].is_host_page("app"));
        assert!(targets[1].is_host_page("app"));
        assert_eq!(
            targets[1].web_socket_debugger_url.as_deref(),
            Some("ws://127.0.0.1:9222/devtools/page/AB12")
        );
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let json = r#"[{"title": "bare"}]"#;
        let targets: Vec<TargetInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(targets[0].target_type, "");
        assert!(targets[0].web_socket_debugger_url.is_none());
    }

    #[test]
    fn endpoint_is_normalized() {
        let client = DiscoveryClient::new("http://127.0.0.1:9222/");
        assert_eq!(client.endpoint(), "http://127.0.0.1:9222");
    }
}
