//! Data model for the relay and the upstream Oblio API
//!
//! Wire shapes use camelCase field names so that payloads match what the
//! upstream API sends and expects; the Rust structs keep snake_case.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// The long-lived API credential pair the user enters once
///
/// The secret is never displayed again after entry; it only travels to the
/// relay in obfuscated form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub client_id: String,
    pub client_secret: String,
}

/// Locally persisted login state: credentials plus the derived token
///
/// `access_token` and `token_expiry` are absent before the first successful
/// authentication. `token_expiry` is a Unix timestamp in milliseconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub client_id: String,
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<i64>,
}

impl Session {
    /// Create a fresh, not-yet-authenticated session from a credential pair
    #[must_use]
    pub fn from_credentials(credentials: CredentialPair) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            access_token: None,
            token_expiry: None,
        }
    }

    /// Clone out the credential pair held by this session
    #[must_use]
    pub fn credentials(&self) -> CredentialPair {
        CredentialPair {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    /// Attach a freshly issued token, computing its absolute expiry from the
    /// upstream's lifetime-in-seconds
    #[must_use]
    pub fn with_token(mut self, access_token: String, expires_in_secs: i64) -> Self {
        self.access_token = Some(access_token);
        self.token_expiry = Some(Utc::now().timestamp_millis() + expires_in_secs * 1000);
        self
    }
}

/// Token response from the upstream `/authorize/token` endpoint
///
/// Oblio returns `expires_in` as a JSON string; other client-credentials
/// issuers use a number. Both are accepted.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("expires_in out of range")),
        Value::String(s) => s
            .parse()
            .map_err(|_| serde::de::Error::custom("expires_in is not numeric")),
        other => Err(serde::de::Error::custom(format!(
            "expires_in has unexpected type: {other}"
        ))),
    }
}

/// Response envelope every upstream business endpoint wraps its data in
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = Value> {
    pub status: u16,
    #[serde(default)]
    pub status_message: String,
    pub data: T,
}

/// What the proxy hands back for one forwarded call: the upstream response
/// plus an echo of the exact payload that was transmitted (None for
/// read-only operations)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiExchange<T = Value> {
    pub response: T,
    pub request: Option<Value>,
}

/// Document families that share the cancel/restore/delete lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Invoice,
    Proforma,
    Notice,
}

impl DocumentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Proforma => "proforma",
            Self::Notice => "notice",
        }
    }
}

// ---------------------------------------------------------------------------
// Typed upstream payload shapes. The relay itself treats payloads as opaque
// JSON; these exist for callers that want stricter shapes per operation.
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub cif: String,
    pub topic: String,
    pub endpoint: String,
}

/// Body for registering a new webhook subscription
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    pub cif: String,
    pub topic: String,
    pub endpoint: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub cif: String,
    pub name: String,
    #[serde(rename = "type")]
    pub company_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub cif: String,
    pub name: String,
    #[serde(default)]
    pub rc: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub vat_payer: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub vat: f64,
    #[serde(default)]
    pub um: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VatRate {
    pub id: String,
    pub name: String,
    pub percentage: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSeries {
    pub name: String,
    pub next_number: i64,
}

/// Client block embedded inside a document creation payload
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceClient {
    pub cif: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_payer: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Collect {
    #[serde(rename = "type")]
    pub collect_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDocument {
    #[serde(rename = "type")]
    pub document_type: String,
    pub series_name: String,
    pub number: String,
}

/// Payload for invoice/proforma/notice creation
///
/// Only `cif`, `client`, `issue_date`, `series_name` and `products` are
/// always required by the upstream; everything else is per-document-type.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub cif: String,
    pub client: InvoiceClient,
    pub issue_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    pub series_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect: Option<Collect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_document: Option<ReferenceDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub products: Vec<InvoiceProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deputy_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deputy_identity_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deputy_auto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_stock: Option<u8>,
    #[serde(rename = "useETransport", skip_serializing_if = "Option::is_none")]
    pub use_e_transport: Option<bool>,
    #[serde(rename = "sendEInvoice", skip_serializing_if = "Option::is_none")]
    pub send_e_invoice: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measuring_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_included: Option<bool>,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_pair_uses_wire_field_names() {
        let credentials = CredentialPair {
            client_id: "a@b.com".to_string(),
            client_secret: "s3cret".to_string(),
        };

        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json["clientId"], "a@b.com");
        assert_eq!(json["clientSecret"], "s3cret");
    }

    #[test]
    fn session_omits_absent_token_fields() {
        let session = Session::from_credentials(CredentialPair {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        });

        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("accessToken").is_none());
        assert!(json.get("tokenExpiry").is_none());
    }

    #[test]
    fn with_token_computes_expiry_from_lifetime() {
        let before = Utc::now().timestamp_millis();
        let session = Session::from_credentials(CredentialPair {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        })
        .with_token("tok123".to_string(), 3600);
        let after = Utc::now().timestamp_millis();

        assert_eq!(session.access_token.as_deref(), Some("tok123"));
        let expiry = session.token_expiry.unwrap();
        assert!(expiry >= before + 3_600_000);
        assert!(expiry <= after + 3_600_000);
    }

    #[test]
    fn token_response_accepts_string_and_numeric_lifetimes() {
        let from_string: TokenResponse =
            serde_json::from_str(r#"{"access_token": "tok123", "expires_in": "3600"}"#).unwrap();
        assert_eq!(from_string.expires_in, 3600);

        let from_number: TokenResponse =
            serde_json::from_str(r#"{"access_token": "tok123", "expires_in": 7200}"#).unwrap();
        assert_eq!(from_number.expires_in, 7200);

        let malformed = serde_json::from_str::<TokenResponse>(
            r#"{"access_token": "tok123", "expires_in": true}"#,
        );
        assert!(malformed.is_err());
    }

    #[test]
    fn invoice_payload_skips_unset_optionals() {
        let invoice = Invoice {
            cif: "RO123".to_string(),
            client: InvoiceClient {
                cif: "RO456".to_string(),
                name: "Client SRL".to_string(),
                ..InvoiceClient::default()
            },
            issue_date: "2026-08-29".to_string(),
            due_date: None,
            delivery_date: None,
            series_name: "FCT".to_string(),
            collect: None,
            reference_document: None,
            language: None,
            precision: None,
            currency: None,
            products: vec![InvoiceProduct {
                name: "Service".to_string(),
                code: None,
                description: None,
                price: 100.0,
                measuring_unit: None,
                currency: None,
                vat_name: None,
                vat_percentage: Some(19.0),
                vat_included: None,
                quantity: 1.0,
                product_type: None,
                discount_value: None,
                discount_percentage: None,
            }],
            issuer_name: None,
            issuer_id: None,
            notice_number: None,
            internal_note: None,
            deputy_name: None,
            deputy_identity_card: None,
            deputy_auto: None,
            sale_date: None,
            work_station: None,
            use_stock: None,
            use_e_transport: None,
            send_e_invoice: None,
        };

        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["seriesName"], "FCT");
        assert!(json.get("dueDate").is_none());
        assert_eq!(json["products"][0]["vatPercentage"], 19.0);
        assert!(json["products"][0].get("discountValue").is_none());
    }
}
