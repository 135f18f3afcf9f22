//! HTTP client for a Stripe-compatible hosted-checkout API.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::provider::{CheckoutProvider, CreateSessionRequest, HostedSession, ProviderError};

const STRIPE_API_BASE: &str = "https://api.stripe.com";

pub struct StripeCheckout {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl fmt::Debug for StripeCheckout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeCheckout")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl StripeCheckout {
    pub fn new(secret_key: String) -> Self {
        Self::with_api_base(secret_key, STRIPE_API_BASE.to_string())
    }

    pub fn with_api_base(secret_key: String, api_base: String) -> Self {
        let http = Client::builder()
            .user_agent("tutorhub/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_base,
            secret_key,
        }
    }

    fn into_session(payload: SessionResponse) -> HostedSession {
        HostedSession {
            id: payload.id,
            url: payload.url.unwrap_or_default(),
            metadata: payload.metadata,
        }
    }
}

/// Build the form body for `POST /v1/checkout/sessions`.
fn session_form(request: &CreateSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.amount.minor().to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.description.clone(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
    ];
    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }
    form
}

#[async_trait]
impl CheckoutProvider for StripeCheckout {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<HostedSession, ProviderError> {
        let endpoint = format!("{}/v1/checkout/sessions", self.api_base);
        let form = session_form(&request);
        debug!(endpoint = %endpoint, "creating hosted checkout session");

        let res = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!(
                "create session returned {status}: {body}"
            )));
        }

        let payload: SessionResponse = res
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(format!("invalid session response: {e}")))?;
        Ok(Self::into_session(payload))
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<HostedSession, ProviderError> {
        let endpoint = format!("{}/v1/checkout/sessions/{session_id}", self.api_base);

        let res = self
            .http
            .get(&endpoint)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::UnknownSession(session_id.to_string()));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!(
                "retrieve session returned {status}: {body}"
            )));
        }

        let payload: SessionResponse = res
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(format!("invalid session response: {e}")))?;
        Ok(Self::into_session(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorhub_core::Amount;

    #[test]
    fn form_encodes_line_item_and_metadata() {
        let request = CreateSessionRequest {
            amount: Amount::positive(2500).unwrap(),
            currency: "usd".into(),
            description: "1:1 session".into(),
            metadata: HashMap::from([("course_id".to_string(), "abc".to_string())]),
            success_url: "https://app.invalid/ok".into(),
            cancel_url: "https://app.invalid/cancel".into(),
        };
        let form = session_form(&request);
        assert!(form.contains(&(
            "line_items[0][price_data][unit_amount]".to_string(),
            "2500".to_string()
        )));
        assert!(form.contains(&("metadata[course_id]".to_string(), "abc".to_string())));
        assert!(form.contains(&("mode".to_string(), "payment".to_string())));
    }
}
