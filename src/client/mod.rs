//! Upstream client for the Oblio business operations
//!
//! One method per upstream operation. Every method builds the upstream
//! endpoint path, hands it to the relay's forwarding endpoint together with
//! the obfuscated access token, and returns the `{response, request}`
//! exchange the relay replies with. The client holds a snapshot of the
//! session and no other state; construct a fresh one per batch of calls.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::handlers::proxy::{ENDPOINT_HEADER, TOKEN_HEADER};
use crate::models::{
    ApiExchange, ApiResponse, ClientInfo, Company, DocumentKind, DocumentSeries, Invoice, Product,
    Session, TokenResponse, VatRate, Webhook, WebhookRegistration,
};
use crate::obfuscation::{encode_credentials, encode_token};

/// Errors surfaced by the upstream client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The held session has no token; raised before any network call
    #[error("No access token available")]
    NoAccessToken,
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    /// The relay answered 2xx but the token payload was unusable
    #[error("Invalid response from server")]
    InvalidResponse,
    /// The relay (or upstream, via passthrough) answered a failure status
    #[error("Request failed: {0}")]
    RequestFailed(StatusCode),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for one batch of calls against the relay
///
/// Cheap to construct; never cache one across user actions.
pub struct OblioClient {
    http: Client,
    relay_base_url: String,
    session: Session,
}

impl OblioClient {
    /// Snapshot `session` and target the relay at `relay_base_url`
    #[must_use]
    pub fn new(relay_base_url: impl Into<String>, session: Session) -> Self {
        Self {
            http: Client::new(),
            relay_base_url: relay_base_url.into(),
            session,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Exchange the held credential pair for a bearer token
    ///
    /// Returns the authenticated session (credentials plus token and
    /// absolute expiry). Persisting it is the caller's job; nothing is
    /// stored on failure.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` when the relay rejects the credentials,
    /// `InvalidResponse` when the token payload lacks a token, `Transport`
    /// on network failure.
    pub async fn authenticate(&self) -> Result<Session, ClientError> {
        let encrypted_credentials = encode_credentials(&self.session.credentials());

        let response = self
            .http
            .post(format!("{}/api/oblio/authenticate", self.relay_base_url))
            .json(&json!({ "encryptedCredentials": encrypted_credentials }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| "Authentication failed".to_string());
            return Err(ClientError::AuthenticationFailed(message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| ClientError::InvalidResponse)?;
        if token.access_token.is_empty() {
            return Err(ClientError::InvalidResponse);
        }

        Ok(self
            .session
            .clone()
            .with_token(token.access_token, token.expires_in))
    }

    /// Send one operation through the relay's forwarding endpoint
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<Value>,
    ) -> Result<ApiExchange<T>, ClientError> {
        let token = self
            .session
            .access_token
            .as_deref()
            .ok_or(ClientError::NoAccessToken)?;

        let mut request_builder = self
            .http
            .request(method, format!("{}/api/oblio/proxy", self.relay_base_url))
            .header(TOKEN_HEADER, encode_token(token))
            .header(ENDPOINT_HEADER, endpoint);
        if let Some(payload) = payload {
            request_builder = request_builder.json(&json!({ "data": payload }));
        }

        let response = request_builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::RequestFailed(status));
        }

        Ok(response.json().await?)
    }

    // -- Nomenclature lookups ------------------------------------------------

    /// List the companies the credential pair has access to
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_companies(
        &self,
    ) -> Result<ApiExchange<ApiResponse<Vec<Company>>>, ClientError> {
        self.request(Method::GET, "/nomenclature/companies", None)
            .await
    }

    /// VAT rates configured for the company identified by `cif`
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_vat_rates(
        &self,
        cif: &str,
    ) -> Result<ApiExchange<ApiResponse<Vec<VatRate>>>, ClientError> {
        let endpoint = format!("/nomenclature/vat_rates?cif={}", urlencoding::encode(cif));
        self.request(Method::GET, &endpoint, None).await
    }

    /// Page through the company's client registry
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_clients(
        &self,
        cif: &str,
        offset: u32,
    ) -> Result<ApiExchange<ApiResponse<Vec<ClientInfo>>>, ClientError> {
        let endpoint = format!(
            "/nomenclature/clients?cif={}&offset={offset}",
            urlencoding::encode(cif)
        );
        self.request(Method::GET, &endpoint, None).await
    }

    /// Page through the company's product registry
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_products(
        &self,
        cif: &str,
        offset: u32,
    ) -> Result<ApiExchange<ApiResponse<Vec<Product>>>, ClientError> {
        let endpoint = format!(
            "/nomenclature/products?cif={}&offset={offset}",
            urlencoding::encode(cif)
        );
        self.request(Method::GET, &endpoint, None).await
    }

    /// Document series defined for the company
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_series(
        &self,
        cif: &str,
    ) -> Result<ApiExchange<ApiResponse<Vec<DocumentSeries>>>, ClientError> {
        let endpoint = format!("/nomenclature/series?cif={}", urlencoding::encode(cif));
        self.request(Method::GET, &endpoint, None).await
    }

    /// Document languages the upstream supports
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_languages(&self) -> Result<ApiExchange, ClientError> {
        self.request(Method::GET, "/nomenclature/languages", None)
            .await
    }

    /// Stock management locations for the company
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_management(&self, cif: &str) -> Result<ApiExchange, ClientError> {
        let endpoint = format!("/nomenclature/management?cif={}", urlencoding::encode(cif));
        self.request(Method::GET, &endpoint, None).await
    }

    // -- Document creation ---------------------------------------------------

    /// Issue an invoice
    ///
    /// # Errors
    ///
    /// See [`ClientError`]; also fails if the payload cannot be serialized.
    pub async fn create_invoice(&self, invoice: &Invoice) -> Result<ApiExchange, ClientError> {
        let payload = serde_json::to_value(invoice).map_err(|_| ClientError::InvalidResponse)?;
        self.request(Method::POST, "/docs/invoice", Some(payload))
            .await
    }

    /// Issue a proforma
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn create_proforma(&self, proforma: &Invoice) -> Result<ApiExchange, ClientError> {
        let payload = serde_json::to_value(proforma).map_err(|_| ClientError::InvalidResponse)?;
        self.request(Method::POST, "/docs/proforma", Some(payload))
            .await
    }

    /// Issue a delivery notice
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn create_notice(&self, notice: &Invoice) -> Result<ApiExchange, ClientError> {
        let payload = serde_json::to_value(notice).map_err(|_| ClientError::InvalidResponse)?;
        self.request(Method::POST, "/docs/notice", Some(payload))
            .await
    }

    // -- Document retrieval and lifecycle ------------------------------------

    /// Fetch one invoice by series and number
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_invoice(
        &self,
        cif: &str,
        series_name: &str,
        number: &str,
    ) -> Result<ApiExchange, ClientError> {
        let endpoint = document_endpoint(DocumentKind::Invoice, cif, series_name, number);
        self.request(Method::GET, &endpoint, None).await
    }

    /// List invoices, optionally narrowed by upstream filter parameters
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn list_invoices(
        &self,
        cif: &str,
        filters: &[(&str, &str)],
    ) -> Result<ApiExchange, ClientError> {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("cif", cif);
        for (key, value) in filters {
            query.append_pair(key, value);
        }
        let endpoint = format!("/docs/invoice/list?{}", query.finish());
        self.request(Method::GET, &endpoint, None).await
    }

    /// Record a collection (payment) against an invoice
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn collect_invoice(&self, payload: Value) -> Result<ApiExchange, ClientError> {
        self.request(Method::PUT, "/docs/invoice/collect", Some(payload))
            .await
    }

    /// Cancel a document; it can be restored later
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn cancel_document(
        &self,
        kind: DocumentKind,
        payload: Value,
    ) -> Result<ApiExchange, ClientError> {
        let endpoint = format!("/docs/{}/cancel", kind.as_str());
        self.request(Method::PUT, &endpoint, Some(payload)).await
    }

    /// Restore a previously cancelled document
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn restore_document(
        &self,
        kind: DocumentKind,
        payload: Value,
    ) -> Result<ApiExchange, ClientError> {
        let endpoint = format!("/docs/{}/restore", kind.as_str());
        self.request(Method::PUT, &endpoint, Some(payload)).await
    }

    /// Permanently delete a document
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn delete_document(
        &self,
        kind: DocumentKind,
        cif: &str,
        series_name: &str,
        number: &str,
    ) -> Result<ApiExchange, ClientError> {
        let endpoint = document_endpoint(kind, cif, series_name, number);
        self.request(Method::DELETE, &endpoint, None).await
    }

    // -- Electronic invoicing ------------------------------------------------

    /// Submit an issued invoice to the e-invoicing system
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn send_einvoice(&self, payload: Value) -> Result<ApiExchange, ClientError> {
        self.request(Method::POST, "/docs/einvoice", Some(payload))
            .await
    }

    /// Check the e-invoice status of a document
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get_einvoice(
        &self,
        cif: &str,
        series_name: &str,
        number: &str,
    ) -> Result<ApiExchange, ClientError> {
        let endpoint = format!(
            "/docs/einvoice?cif={}&seriesName={}&number={}",
            urlencoding::encode(cif),
            urlencoding::encode(series_name),
            urlencoding::encode(number)
        );
        self.request(Method::GET, &endpoint, None).await
    }

    // -- Webhooks ------------------------------------------------------------

    /// List registered webhook subscriptions
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn list_webhooks(
        &self,
    ) -> Result<ApiExchange<ApiResponse<Vec<Webhook>>>, ClientError> {
        self.request(Method::GET, "/webhooks", None).await
    }

    /// Register a webhook subscription
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn create_webhook(
        &self,
        registration: &WebhookRegistration,
    ) -> Result<ApiExchange, ClientError> {
        let payload =
            serde_json::to_value(registration).map_err(|_| ClientError::InvalidResponse)?;
        self.request(Method::POST, "/webhooks", Some(payload)).await
    }

    /// Remove a webhook subscription by id
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn delete_webhook(&self, id: &str) -> Result<ApiExchange, ClientError> {
        let endpoint = format!("/webhooks/{}", urlencoding::encode(id));
        self.request(Method::DELETE, &endpoint, None).await
    }
}

fn document_endpoint(kind: DocumentKind, cif: &str, series_name: &str, number: &str) -> String {
    format!(
        "/docs/{}?cif={}&seriesName={}&number={}",
        kind.as_str(),
        urlencoding::encode(cif),
        urlencoding::encode(series_name),
        urlencoding::encode(number)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CredentialPair;

    fn tokenless_client() -> OblioClient {
        OblioClient::new(
            "http://127.0.0.1:1",
            Session::from_credentials(CredentialPair {
                client_id: "a@b.com".to_string(),
                client_secret: "s3cret".to_string(),
            }),
        )
    }

    #[actix_web::test]
    async fn operations_fail_fast_without_a_token() {
        // The relay base URL is unroutable; reaching the network would hang
        // or error differently, so NoAccessToken proves no call was issued.
        let client = tokenless_client();

        let err = client.get_companies().await.unwrap_err();
        assert!(matches!(err, ClientError::NoAccessToken));

        let err = client.list_webhooks().await.unwrap_err();
        assert!(matches!(err, ClientError::NoAccessToken));

        let err = client
            .delete_document(DocumentKind::Proforma, "RO123", "PRF", "7")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NoAccessToken));
    }

    #[test]
    fn document_endpoints_encode_their_query_values() {
        let endpoint = document_endpoint(DocumentKind::Invoice, "RO 123", "FCT/A", "42");
        assert_eq!(
            endpoint,
            "/docs/invoice?cif=RO%20123&seriesName=FCT%2FA&number=42"
        );
    }

    #[test]
    fn no_access_token_error_matches_the_console_message() {
        assert_eq!(
            ClientError::NoAccessToken.to_string(),
            "No access token available"
        );
    }
}
