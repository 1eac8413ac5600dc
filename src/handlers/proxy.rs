use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Result as ActixResult};
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::obfuscation::decode_token;
use crate::settings::RelaySettings;
use crate::utils::responses;

/// Header carrying the obfuscated bearer token
pub const TOKEN_HEADER: &str = "x-encrypted-token";
/// Header carrying the target upstream path, query string included
pub const ENDPOINT_HEADER: &str = "x-oblio-endpoint";

/// HTTP client shared by all forwarded requests
pub(crate) static CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// Forwarding endpoint: `{GET,POST,PUT,DELETE} /api/oblio/proxy`
///
/// The target upstream path and the obfuscated bearer token arrive as
/// request metadata (headers), never in the body. For POST/PUT the body is
/// `{"data": <payload>}` and `<payload>` becomes the upstream JSON body;
/// GET and DELETE never carry one. The reply wraps the upstream JSON
/// together with an echo of the payload that was sent:
/// `{"response": ..., "request": <payload or null>}`.
///
/// # Errors
///
/// Never returns `Err`; missing headers map to 400 and anything unexpected
/// to 500.
pub async fn proxy(
    req: HttpRequest,
    body: web::Bytes,
    settings: web::Data<RelaySettings>,
) -> ActixResult<HttpResponse> {
    let token_header = header_value(&req, TOKEN_HEADER);
    let endpoint = header_value(&req, ENDPOINT_HEADER);

    let (Some(token_header), Some(endpoint)) = (token_header, endpoint) else {
        return Ok(responses::missing_headers());
    };

    let Ok(token) = decode_token(&token_header) else {
        warn!("Failed to decode obfuscated token");
        return Ok(responses::internal_server_error());
    };

    let Ok(upstream_url) = build_upstream_url(&settings.upstream.base_url, &endpoint) else {
        warn!("Refusing to forward to unparseable endpoint {endpoint}");
        return Ok(responses::internal_server_error());
    };

    let method = req.method();
    let Some(reqwest_method) = convert_http_method(method) else {
        return Ok(responses::internal_server_error());
    };

    // GET and DELETE never carry a body
    let payload = if matches!(method.as_str(), "POST" | "PUT") {
        let Ok(envelope) = serde_json::from_slice::<Value>(&body) else {
            warn!("Proxy body for {method} request is not JSON");
            return Ok(responses::internal_server_error());
        };
        Some(envelope.get("data").cloned().unwrap_or(Value::Null))
    } else {
        None
    };

    debug!("Forwarding {method} to {upstream_url}");

    let mut request_builder = CLIENT
        .request(reqwest_method, upstream_url)
        .bearer_auth(token);
    if let Some(ref payload) = payload {
        request_builder = request_builder.json(payload);
    }

    let upstream_response = match request_builder.send().await {
        Ok(response) => response,
        Err(err) => {
            error!("Upstream request failed: {err}");
            return Ok(responses::internal_server_error());
        }
    };

    let status = StatusCode::from_u16(upstream_response.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match upstream_response.json::<Value>().await {
        Ok(upstream_json) => Ok(HttpResponse::build(status).json(serde_json::json!({
            "response": upstream_json,
            "request": payload,
        }))),
        Err(err) => {
            error!("Failed to parse upstream response: {err}");
            Ok(responses::internal_server_error())
        }
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Map the incoming actix method onto the reqwest equivalent
///
/// Only the four methods the proxy routes accept are supported; anything
/// else answers `None`.
#[must_use]
pub fn convert_http_method(method: &actix_web::http::Method) -> Option<reqwest::Method> {
    match method.as_str() {
        "GET" => Some(reqwest::Method::GET),
        "POST" => Some(reqwest::Method::POST),
        "PUT" => Some(reqwest::Method::PUT),
        "DELETE" => Some(reqwest::Method::DELETE),
        _ => None,
    }
}

/// Join the upstream base URL with a forwarded endpoint path
///
/// Plain concatenation, not `Url::join`: the endpoint always starts with a
/// slash and must keep the base's `/api` path segment and its own query
/// string intact. The result is parsed once to reject garbage.
///
/// # Errors
///
/// Returns an error if the combined string is not a valid URL.
pub fn build_upstream_url(base_url: &str, endpoint: &str) -> Result<Url, url::ParseError> {
    let combined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    Url::parse(&combined)
}
