// HTTP middleware
// Author: kelexine (https://github.com/kelexine)

use crate::config::ServerConfig;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Create request ID layers so proxied and admin requests can be correlated
/// in the trace output
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// Cap bodies of requests forwarded to the network
pub fn body_limit_layer(config: &ServerConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_bytes)
}
