//! Provider-agnostic hosted-checkout contract.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use tutorhub_core::{Amount, DomainError};

/// Everything needed to open one hosted payment session.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub amount: Amount,
    pub currency: String,
    pub description: String,
    pub metadata: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted session as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedSession {
    pub id: String,
    /// Redirect target for the browser. Providers may omit it on retrieval
    /// of an already-completed session.
    pub url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown checkout session: {0}")]
    UnknownSession(String),

    #[error("provider request failed: {0}")]
    Upstream(String),
}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UnknownSession(id) => {
                DomainError::not_found(format!("checkout session {id}"))
            }
            ProviderError::Upstream(msg) => DomainError::upstream(msg),
        }
    }
}

/// Opaque hosted-checkout provider: open a session, read it back later.
///
/// `retrieve_session` is a pure read and safe to call repeatedly.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Provider name, recorded as the payment method on fulfilled bookings.
    fn name(&self) -> &'static str;

    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<HostedSession, ProviderError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<HostedSession, ProviderError>;
}
