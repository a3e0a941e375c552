// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::agent::{
    ActivateReport, AgentEvent, EventOutcome, FetchResult, InstallReport, LifecycleState,
};
use crate::cache::StoreSummary;
use crate::error::{AgentError, Result};
use crate::metrics::gather_metrics;
use crate::models::{AgentRequest, Destination, RequestMode};
use crate::network::is_hop_by_hop;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Response header naming where a proxied response came from.
pub const SOURCE_HEADER: &str = "x-offline-agent-source";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub lifecycle: LifecycleState,
    pub version: String,
    pub origin: String,
    pub stores: Vec<StoreSummary>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Activated and the current store exists
    Healthy,
    /// Still installing or activating
    Degraded,
    /// Cache stores cannot be read
    Unhealthy,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let lifecycle = state.agent.state();
    let version = state.agent.version().to_string();

    let (status, stores) = match state.agent.storage().summaries().await {
        Ok(stores) => {
            let has_current = stores.iter().any(|s| s.name == version);
            let status = if lifecycle == LifecycleState::Activated && has_current {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            };
            (status, stores)
        }
        Err(e) => {
            warn!("Health check could not read cache stores: {}", e);
            (HealthStatus::Unhealthy, Vec::new())
        }
    };

    Json(HealthResponse {
        status,
        lifecycle,
        version,
        origin: state.config.agent.origin.clone(),
        stores,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

fn unexpected(outcome: EventOutcome) -> AgentError {
    AgentError::Internal(format!("Unexpected event outcome: {:?}", outcome))
}

pub async fn install_handler(State(state): State<AppState>) -> Result<Json<InstallReport>> {
    match state.agent.handle_event(AgentEvent::Install).await? {
        EventOutcome::Installed(report) => Ok(Json(report)),
        other => Err(unexpected(other)),
    }
}

pub async fn activate_handler(State(state): State<AppState>) -> Result<Json<ActivateReport>> {
    match state.agent.handle_event(AgentEvent::Activate).await? {
        EventOutcome::Activated(report) => Ok(Json(report)),
        other => Err(unexpected(other)),
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub handled: bool,
}

pub async fn sync_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    match state.agent.handle_event(AgentEvent::Sync { tag: req.tag }).await? {
        EventOutcome::Synced { handled } => Ok(Json(SyncResponse { handled })),
        other => Err(unexpected(other)),
    }
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub id: Uuid,
}

/// Raw text body is the push payload; an empty body means no payload.
pub async fn push_handler(State(state): State<AppState>, body: String) -> Result<Json<PushResponse>> {
    let data = if body.is_empty() { None } else { Some(body) };
    match state.agent.handle_event(AgentEvent::Push { data }).await? {
        EventOutcome::NotificationShown(id) => Ok(Json(PushResponse { id })),
        other => Err(unexpected(other)),
    }
}

#[derive(Debug, Deserialize)]
pub struct NotificationClickRequest {
    pub id: Uuid,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationClickResponse {
    pub opened: Option<String>,
}

pub async fn notification_click_handler(
    State(state): State<AppState>,
    Json(req): Json<NotificationClickRequest>,
) -> Result<Json<NotificationClickResponse>> {
    let event = AgentEvent::NotificationClick {
        id: req.id,
        action: req.action,
    };
    match state.agent.handle_event(event).await? {
        EventOutcome::NotificationClicked { opened } => {
            Ok(Json(NotificationClickResponse { opened }))
        }
        other => Err(unexpected(other)),
    }
}

/// Intercept any other request as a fetch signal.
pub async fn proxy_handler(State(state): State<AppState>, req: Request) -> Result<Response> {
    let limit = state.config.server.max_body_bytes;
    let request = to_agent_request(state.agent.origin(), req, limit).await?;
    debug!("Intercepted {} {}", request.method, request.url);

    match state.agent.handle_event(AgentEvent::Fetch(request)).await? {
        EventOutcome::Fetched(fetched) => into_http_response(fetched),
        other => Err(unexpected(other)),
    }
}

/// Translate an incoming HTTP request into the agent's request model.
///
/// Origin-form targets (`/path?query`) resolve against the application
/// origin; absolute-form targets are taken as-is.
async fn to_agent_request(origin: &Url, req: Request, limit: usize) -> Result<AgentRequest> {
    let (parts, body) = req.into_parts();
    let url = target_url(origin, &parts.uri)?;

    let destination = header_str(&parts.headers, "sec-fetch-dest")
        .map(Destination::from_header)
        .unwrap_or_else(|| {
            // Without fetch metadata, treat HTML-accepting GETs as navigations
            let accepts_html = header_str(&parts.headers, "accept").is_some_and(|a| a.contains("text/html"));
            if parts.method == axum::http::Method::GET && accepts_html {
                Destination::Document
            } else {
                Destination::Empty
            }
        });
    let mode = header_str(&parts.headers, "sec-fetch-mode")
        .map(RequestMode::from_header)
        .unwrap_or(if destination == Destination::Document {
            RequestMode::Navigate
        } else {
            RequestMode::SameOrigin
        });

    let headers = parts
        .headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| AgentError::InvalidRequest(format!("Failed to read request body: {}", e)))?;

    Ok(AgentRequest {
        method: parts.method.as_str().to_string(),
        url,
        destination,
        mode,
        headers,
        body: if bytes.is_empty() { None } else { Some(bytes) },
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn target_url(origin: &Url, uri: &Uri) -> Result<Url> {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Url::parse(&uri.to_string())
            .map_err(|e| AgentError::InvalidRequest(format!("Invalid target {}: {}", uri, e)));
    }
    // Set the path directly: joining would read `//host/...` as a new authority
    let mut url = origin.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());
    url.set_fragment(None);
    Ok(url)
}

/// Build the HTTP response for a fetch result. The detached cache write, if
/// any, keeps running after this returns.
fn into_http_response(fetched: FetchResult) -> Result<Response> {
    let FetchResult { response, source, .. } = fetched;

    // Opaque responses carry no status the requester may see
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        if !is_hop_by_hop(name) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    builder
        .header(SOURCE_HEADER, source.as_str())
        .body(Body::from(response.body))
        .map_err(|e| AgentError::Internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://app.example.com").unwrap()
    }

    #[test]
    fn test_target_url_origin_form() {
        let uri: Uri = "/path/page?q=1".parse().unwrap();
        let url = target_url(&origin(), &uri).unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/path/page?q=1");
    }

    #[test]
    fn test_target_url_absolute_form() {
        let uri: Uri = "http://cdn.example.net/lib.js".parse().unwrap();
        let url = target_url(&origin(), &uri).unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.net"));
    }

    #[test]
    fn test_target_url_stays_on_origin_for_double_slash_path() {
        let uri: Uri = "//evil.example.net/steal?x=1".parse().unwrap();
        let url = target_url(&origin(), &uri).unwrap();
        assert_eq!(url.host_str(), Some("app.example.com"));
        assert!(url.path().ends_with("/steal"));
        assert_eq!(url.query(), Some("x=1"));
    }

    #[tokio::test]
    async fn test_iframe_is_not_a_document() {
        let req = axum::http::Request::builder()
            .uri("/embed")
            .header("sec-fetch-dest", "iframe")
            .header("sec-fetch-mode", "navigate")
            .header("accept", "text/html")
            .body(Body::empty())
            .unwrap();
        let agent_req = to_agent_request(&origin(), req, 1024).await.unwrap();
        assert_eq!(agent_req.destination, Destination::Iframe);
        assert!(!agent_req.is_document());
    }

    #[tokio::test]
    async fn test_navigation_inferred_from_accept() {
        let req = axum::http::Request::builder()
            .uri("/about")
            .header("accept", "text/html,application/xhtml+xml")
            .body(Body::empty())
            .unwrap();
        let agent_req = to_agent_request(&origin(), req, 1024).await.unwrap();
        assert_eq!(agent_req.destination, Destination::Document);
        assert_eq!(agent_req.mode, RequestMode::Navigate);
        assert!(agent_req.body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_metadata_wins() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/api")
            .header("sec-fetch-dest", "empty")
            .header("sec-fetch-mode", "cors")
            .header("accept", "text/html")
            .body(Body::from("x=1"))
            .unwrap();
        let agent_req = to_agent_request(&origin(), req, 1024).await.unwrap();
        assert_eq!(agent_req.method, "POST");
        assert_eq!(agent_req.destination, Destination::Empty);
        assert_eq!(agent_req.mode, RequestMode::Cors);
        assert_eq!(agent_req.body.as_deref(), Some(&b"x=1"[..]));
    }
}
