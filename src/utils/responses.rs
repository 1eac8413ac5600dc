//! HTTP response construction for the relay endpoints
//!
//! The relay emits a small, fixed set of JSON error bodies. They are
//! pre-serialized once at startup and reused, keeping every handler's error
//! path byte-identical.

use actix_web::{http::header, http::StatusCode, HttpResponse};
use serde_json::json;

/// Global instance of pre-serialized error bodies
static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

struct CachedResponses {
    missing_credentials: String,
    missing_headers: String,
    authentication_failed: String,
    internal_server_error: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            missing_credentials: Self::create_json("Missing credentials"),
            missing_headers: Self::create_json("Missing required headers"),
            authentication_failed: Self::create_json("Authentication failed"),
            internal_server_error: Self::create_json("Internal server error"),
        }
    }

    fn create_json(error: &str) -> String {
        serde_json::to_string(&json!({ "error": error })).expect("Failed to serialize JSON")
    }
}

fn json_error(status: StatusCode, body: &str) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .body(body.to_string())
}

/// 400 response for an authenticate call without credentials
#[must_use]
pub fn missing_credentials() -> HttpResponse {
    json_error(
        StatusCode::BAD_REQUEST,
        &CACHED_RESPONSES.missing_credentials,
    )
}

/// 400 response for a proxy call lacking the token or endpoint header
#[must_use]
pub fn missing_headers() -> HttpResponse {
    json_error(StatusCode::BAD_REQUEST, &CACHED_RESPONSES.missing_headers)
}

/// Pass the upstream's rejection status through with a fixed body
#[must_use]
pub fn authentication_failed(status: StatusCode) -> HttpResponse {
    json_error(status, &CACHED_RESPONSES.authentication_failed)
}

/// 500 response for anything unexpected
#[must_use]
pub fn internal_server_error() -> HttpResponse {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        &CACHED_RESPONSES.internal_server_error,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;

    fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().try_into_bytes().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn error_bodies_match_the_wire_contract() {
        let response = missing_credentials();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response), r#"{"error":"Missing credentials"}"#);

        let response = missing_headers();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response),
            r#"{"error":"Missing required headers"}"#
        );

        let response = authentication_failed(StatusCode::UNAUTHORIZED);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_string(response),
            r#"{"error":"Authentication failed"}"#
        );

        let response = internal_server_error();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response),
            r#"{"error":"Internal server error"}"#
        );
    }
}
