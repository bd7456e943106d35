//! Request and response types for the portal API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}

/// Client project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub status: String,
    pub client_id: String,
    #[serde(default)]
    pub assigned_to_id: Option<String>,
    #[serde(deserialize_with = "amount")]
    pub budget: f64,
    pub currency: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice line item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    #[serde(deserialize_with = "amount")]
    pub unit_price: f64,
    #[serde(deserialize_with = "amount")]
    pub total: f64,
}

/// Invoice issued for a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub project_id: String,
    pub invoice_number: String,
    #[serde(deserialize_with = "amount")]
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment processor behind a checkout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentProvider {
    Stripe,
    Chapa,
    Telebirr,
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentProvider::Stripe => "STRIPE",
            PaymentProvider::Chapa => "CHAPA",
            PaymentProvider::Telebirr => "TELEBIRR",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STRIPE" => Ok(PaymentProvider::Stripe),
            "CHAPA" => Ok(PaymentProvider::Chapa),
            "TELEBIRR" => Ok(PaymentProvider::Telebirr),
            other => Err(format!("unknown payment provider: {other}")),
        }
    }
}

/// Recorded payment against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    #[serde(deserialize_with = "amount")]
    pub amount: f64,
    pub currency: String,
    pub provider: PaymentProvider,
    pub status: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filters for the payment history
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentHistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<PaymentProvider>,
}

impl PaymentHistoryQuery {
    /// Encoded query string, empty when no filter is set
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(status) = &self.status {
            serializer.append_pair("status", status);
        }
        if let Some(provider) = &self.provider {
            serializer.append_pair("provider", &provider.to_string());
        }
        serializer.finish()
    }
}

/// Checkout request for an invoice
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub invoice_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<PaymentProvider>,
}

impl CreateCheckoutRequest {
    pub fn new(invoice_id: impl Into<String>) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            success_url: None,
            cancel_url: None,
            provider: None,
        }
    }
}

/// Hosted checkout the user is sent to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub payment_url: String,
    pub provider: PaymentProvider,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Monetary amounts arrive as JSON numbers or as decimal strings
fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(value) => Ok(value),
        Amount::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoice_with_decimal_strings() {
        let invoice: Invoice = serde_json::from_value(json!({
            "id": "inv_1",
            "projectId": "prj_1",
            "invoiceNumber": "INV-2024-001",
            "amount": "1500.50",
            "currency": "USD",
            "status": "SENT",
            "dueDate": "2024-03-01T00:00:00.000Z",
            "items": [
                { "description": "Design", "quantity": 2, "unitPrice": 500, "total": "1000" }
            ],
            "createdAt": "2024-02-01T00:00:00.000Z",
            "updatedAt": "2024-02-01T00:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(invoice.amount, 1500.50);
        assert_eq!(invoice.items[0].total, 1000.0);
        assert!(invoice.paid_at.is_none());
    }

    #[test]
    fn test_checkout_request_omits_unset_fields() {
        let mut request = CreateCheckoutRequest::new("inv_1");
        request.provider = Some(PaymentProvider::Chapa);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, json!({ "invoiceId": "inv_1", "provider": "CHAPA" }));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("stripe".parse::<PaymentProvider>(), Ok(PaymentProvider::Stripe));
        assert_eq!(PaymentProvider::Telebirr.to_string(), "TELEBIRR");
        assert!("paypal".parse::<PaymentProvider>().is_err());
    }

    #[test]
    fn test_history_query_string() {
        assert_eq!(PaymentHistoryQuery::default().to_query_string(), "");

        let query = PaymentHistoryQuery {
            status: Some("COMPLETED".into()),
            provider: Some(PaymentProvider::Stripe),
        };
        assert_eq!(query.to_query_string(), "status=COMPLETED&provider=STRIPE");
    }
}
