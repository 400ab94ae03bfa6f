//! Accessory Storefront - cart, coupon and order service

use accessory_storefront::http::{router, AppState};
use accessory_storefront::services::{AllowListAdminGate, EventPublisher};
use accessory_storefront::store::PgStore;
use accessory_storefront::AppConfig;
use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = AppConfig::from_env()?;
    let store = PgStore::connect(&config.database_url, config.max_connections).await?;
    store.migrate().await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events will not be published");
                None
            }
        },
        None => None,
    };
    if config.admin_user_ids.is_empty() {
        tracing::warn!("ADMIN_USER_IDS is empty, order status updates are disabled");
    }

    let state = AppState::new(
        Arc::new(store),
        Arc::new(AllowListAdminGate::new(config.admin_user_ids.iter().cloned())),
        config.shipping.clone(),
        EventPublisher::new(nats),
    );
    let app = router(state);

    tracing::info!(port = config.port, "accessory storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
