use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use pandizot_api::{app, AppState, AuthConfig};
use pandizot_catalog::PricingEngine;
use pandizot_core::{OrderRepository, PricingRuleRepository};
use pandizot_store::app_config::Config;
use pandizot_store::{seed, DbClient, InMemoryStore, StoreOrderRepository, StorePricingRuleRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pandizot_api=debug,pandizot_core=debug,pandizot_store=info,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Pandizot API on port {}", config.server.port);

    let (rules, orders): (Arc<dyn PricingRuleRepository>, Arc<dyn OrderRepository>) =
        match &config.database.url {
            Some(url) => {
                let db = DbClient::new(url, config.database.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                if config.database.run_migrations {
                    db.migrate().await.context("Failed to run migrations")?;
                }
                let rules: Arc<dyn PricingRuleRepository> =
                    Arc::new(StorePricingRuleRepository::new(db.pool.clone()));
                let orders: Arc<dyn OrderRepository> = Arc::new(StoreOrderRepository::new(db.pool));
                (rules, orders)
            }
            None => {
                tracing::warn!("No database configured, using the in-memory store");
                let store = Arc::new(InMemoryStore::new());
                let rules: Arc<dyn PricingRuleRepository> = store.clone();
                let orders: Arc<dyn OrderRepository> = store;
                (rules, orders)
            }
        };

    if config.store.seed_examples {
        seed::seed_examples(rules.as_ref())
            .await
            .context("Failed to seed example pricing rules")?;
    }

    let app_state = AppState::new(
        rules,
        orders,
        PricingEngine::new(config.pricing.clone()),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
