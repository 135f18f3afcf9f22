//! In-memory checkout provider for dev/test.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::provider::{CheckoutProvider, CreateSessionRequest, HostedSession, ProviderError};

/// Holds hosted sessions in a map; every created session is immediately
/// retrievable, standing in for a completed payment.
#[derive(Debug, Default)]
pub struct InMemoryCheckout {
    sessions: Mutex<HashMap<String, HostedSession>>,
}

impl InMemoryCheckout {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckoutProvider for InMemoryCheckout {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<HostedSession, ProviderError> {
        let id = format!("cs_test_{}", Uuid::now_v7().simple());
        let session = HostedSession {
            id: id.clone(),
            url: format!("https://checkout.invalid/pay/{id}"),
            metadata: request.metadata,
        };
        self.sessions.lock().unwrap().insert(id, session.clone());
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<HostedSession, ProviderError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownSession(session_id.to_string()))
    }
}
