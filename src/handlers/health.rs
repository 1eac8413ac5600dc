use actix_web::{HttpResponse, Result};

use crate::models::HealthResponse;

/// Health check endpoint
///
/// # Errors
///
/// Never fails; the `Result` satisfies the actix handler signature.
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Oblio relay is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
