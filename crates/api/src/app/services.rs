use std::env;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use tutorhub_infra::{CheckoutService, InMemoryStore, MarketplaceStore, PostgresStore};
use tutorhub_payments::{CheckoutProvider, InMemoryCheckout, StripeCheckout};

/// Service container handed to every handler via an extension.
pub struct AppServices {
    store: Arc<dyn MarketplaceStore>,
    checkout: CheckoutService,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn MarketplaceStore>,
        provider: Arc<dyn CheckoutProvider>,
        public_base_url: &str,
    ) -> Self {
        let checkout = CheckoutService::new(
            store.clone(),
            provider,
            format!("{public_base_url}/payment/success?session_id={{CHECKOUT_SESSION_ID}}"),
            format!("{public_base_url}/payment/cancel"),
        );
        Self { store, checkout }
    }

    pub fn store(&self) -> &Arc<dyn MarketplaceStore> {
        &self.store
    }

    pub fn checkout(&self) -> &CheckoutService {
        &self.checkout
    }
}

/// Assemble services from the environment.
///
/// `USE_PERSISTENT_STORES=true` selects Postgres (requires `DATABASE_URL`);
/// otherwise everything is in-memory. `STRIPE_SECRET_KEY` selects the real
/// hosted-checkout provider; without it a local mock provider is used.
pub async fn build_services() -> anyhow::Result<AppServices> {
    let store: Arc<dyn MarketplaceStore> = if env_flag("USE_PERSISTENT_STORES") {
        let url = env::var("DATABASE_URL").context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .context("connecting to postgres")?;
        info!("using postgres store");
        Arc::new(PostgresStore::new(pool))
    } else {
        info!("using in-memory store");
        Arc::new(InMemoryStore::new())
    };

    let provider: Arc<dyn CheckoutProvider> = match env::var("STRIPE_SECRET_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            info!("using stripe checkout provider");
            Arc::new(StripeCheckout::new(key))
        }
        _ => {
            warn!("STRIPE_SECRET_KEY not set; using in-memory checkout provider");
            Arc::new(InMemoryCheckout::new())
        }
    };

    let public_base_url =
        env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

    Ok(AppServices::new(store, provider, &public_base_url))
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
