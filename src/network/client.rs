// HTTP network client
// Author: kelexine (https://github.com/kelexine)

use super::{is_hop_by_hop, Network};
use crate::config::NetworkConfig;
use crate::error::{AgentError, Result};
use crate::models::{same_origin, AgentRequest, AgentResponse, RequestMode, ResponseType};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Url};
use std::time::Duration;
use tracing::debug;

/// Fetches requests from the real network.
///
/// Responses are classified against the application origin: same-origin is
/// `basic`, cross-origin `no-cors` is `opaque` and everything else is `cors`.
pub struct HttpNetwork {
    http_client: Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(config: &NetworkConfig, origin: Url) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            // 3xx goes back to the requester as-is and is never cached
            .redirect(Policy::none())
            .use_rustls_tls()
            .build()
            .map_err(|e| AgentError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client for origin {}", origin);

        Ok(Self { http_client, origin })
    }

    fn classify(&self, request: &AgentRequest, final_url: &Url) -> ResponseType {
        if same_origin(&self.origin, final_url) {
            ResponseType::Basic
        } else if request.mode == RequestMode::NoCors {
            ResponseType::Opaque
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            AgentError::InvalidRequest(format!("Invalid method '{}'", request.method))
        })?;

        let mut builder = self.http_client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::Network(format!("{} {}: {}", request.method, request.url, e)))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let response_type = self.classify(request, &final_url);
        debug!(
            "Network {} {} -> {} ({})",
            request.method,
            request.url,
            status,
            response_type.as_str()
        );

        if response_type == ResponseType::Opaque {
            return Ok(AgentResponse::opaque());
        }

        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| AgentError::Network(format!("Reading body of {}: {}", final_url, e)))?;

        Ok(AgentResponse {
            status,
            response_type,
            url: Some(final_url.to_string()),
            headers,
            body,
        })
    }
}
