use actix_web::{http::StatusCode, web, HttpResponse, Result as ActixResult};
use log::{debug, error, warn};
use serde_json::Value;

use crate::handlers::proxy::CLIENT;
use crate::obfuscation::decode_credentials;
use crate::settings::RelaySettings;
use crate::utils::responses;

/// Token exchange endpoint: `POST /api/oblio/authenticate`
///
/// Accepts `{"encryptedCredentials": "<obfuscated pair>"}`, decodes it, and
/// trades the client id/secret for a bearer token at the upstream
/// `/authorize/token` endpoint. The upstream token JSON is passed through
/// unchanged on success.
///
/// # Errors
///
/// Never returns `Err`; every failure maps to a JSON error response
/// (400 for missing credentials, upstream status for rejections, 500
/// otherwise).
pub async fn authenticate(
    body: web::Bytes,
    settings: web::Data<RelaySettings>,
) -> ActixResult<HttpResponse> {
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        warn!("Authentication request body is not JSON");
        return Ok(responses::internal_server_error());
    };

    let Some(encrypted_credentials) = payload
        .get("encryptedCredentials")
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
    else {
        return Ok(responses::missing_credentials());
    };

    let Ok(credentials) = decode_credentials(encrypted_credentials) else {
        warn!("Failed to decode obfuscated credentials");
        return Ok(responses::internal_server_error());
    };

    let token_url = format!(
        "{}/authorize/token",
        settings.upstream.base_url.trim_end_matches('/')
    );
    debug!("Exchanging credentials for token at {token_url}");

    let upstream_response = match CLIENT
        .post(&token_url)
        .json(&serde_json::json!({
            "client_id": credentials.client_id,
            "client_secret": credentials.client_secret,
        }))
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            error!("Token exchange request failed: {err}");
            return Ok(responses::internal_server_error());
        }
    };

    let status = upstream_response.status();
    if !status.is_success() {
        warn!("Upstream rejected credentials with status {status}");
        let status = StatusCode::from_u16(status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Ok(responses::authentication_failed(status));
    }

    match upstream_response.json::<Value>().await {
        Ok(token_json) => Ok(HttpResponse::Ok().json(token_json)),
        Err(err) => {
            error!("Failed to parse upstream token response: {err}");
            Ok(responses::internal_server_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, web::Data};

    async fn call(body: &str) -> HttpResponse {
        let settings = Data::new(RelaySettings::default());
        authenticate(web::Bytes::copy_from_slice(body.as_bytes()), settings)
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn missing_credentials_field_is_a_client_error() {
        let response = call("{}").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Missing credentials"}"#);
    }

    #[actix_web::test]
    async fn empty_credentials_field_is_a_client_error() {
        let response = call(r#"{"encryptedCredentials": ""}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn non_json_body_is_a_server_error() {
        let response = call("not json at all").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn undecodable_credentials_are_a_server_error() {
        let response = call(r#"{"encryptedCredentials": "!!not-base64!!"}"#).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
