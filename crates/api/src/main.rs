use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use tutorhub_api::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tutorhub_observability::init();

    let jwt_secret = match env::var("JWT_SECRET") {
        Ok(secret) if !secret.trim().is_empty() => secret,
        _ => {
            warn!("JWT_SECRET not set; using an insecure development secret");
            "insecure-dev-secret".to_string()
        }
    };

    let services = Arc::new(app::services::build_services().await?);
    let router = app::build_app(jwt_secret.as_bytes(), services);

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(%bind_addr, "tutorhub api listening");

    axum::serve(listener, router).await.context("serving http")?;
    Ok(())
}
