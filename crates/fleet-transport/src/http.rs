use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::Result;
use crate::transport::Transport;

/// Delivers messages by `POST`ing the serialized payload to a configured
/// per-robot HTTP endpoint (spec §4.8): connection/read timeout 30s,
/// configurable bearer token, bridge version and user-agent headers.
pub struct HttpTransport {
    client: Client,
    endpoint_template: String,
    bearer_token: Option<String>,
    app_version: String,
}

impl HttpTransport {
    pub fn new(endpoint_template: impl Into<String>, bearer_token: Option<String>, app_version: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builds with static config");
        HttpTransport {
            client,
            endpoint_template: endpoint_template.into(),
            bearer_token,
            app_version: app_version.into(),
        }
    }

    /// Substitutes `{serial}` in the configured template, falling back to
    /// the literal `endpoint` argument when it already looks like a URL.
    fn resolve_endpoint(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            self.endpoint_template.replace("{serial}", endpoint)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn publish(&self, endpoint: &str, payload: &[u8]) -> Result<()> {
        let url = self.resolve_endpoint(endpoint);
        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-bridge-version", &self.app_version)
            .header("user-agent", format!("fleet-bridge/{}", self.app_version))
            .body(payload.to_vec());

        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        request.send().await?.error_for_status()?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        // HTTP is connectionless between publishes; always reports
        // available so the registry's selection logic never routes around
        // it for this reason alone.
        true
    }
}
