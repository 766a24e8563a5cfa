use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use ticketdesk_api::{app, AppState, AuthConfig};
use ticketdesk_store::app_config::Config;
use ticketdesk_store::{seed, DbClient, MemoryStore, PgBookingRepository, PgRouteRepository, PgUserRepository};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticketdesk_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    info!("Starting Ticketdesk API on port {}", config.server.port);

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };

    let state = match config.database.url.as_deref() {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let routes = PgRouteRepository::new(db.pool.clone());
            if let Some(path) = config.database.seed_routes.as_deref() {
                let seeded = seed::load_routes(path).map_err(|e| anyhow::anyhow!("Failed to load seed routes: {}", e))?;
                let mut inserted = 0;
                for route in &seeded {
                    if routes
                        .insert_route_if_absent(route)
                        .await
                        .map_err(|e| anyhow::anyhow!("Failed to seed route {}: {}", route.id, e))?
                    {
                        inserted += 1;
                    }
                }
                info!("Seeded {} of {} routes from {}", inserted, seeded.len(), path);
            }

            AppState::new(
                Arc::new(PgBookingRepository::new(db.pool.clone())),
                Arc::new(routes),
                Arc::new(PgBookingRepository::new(db.pool.clone())),
                Arc::new(PgUserRepository::new(db.pool.clone())),
                &config.business_rules,
                auth,
            )
        }
        None => {
            warn!("No database URL configured, using the in-memory store");
            let store = MemoryStore::new();
            if let Some(path) = config.database.seed_routes.as_deref() {
                store
                    .seed_routes_from_file(path)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to load seed routes: {}", e))?;
            }
            AppState::in_memory(store, &config.business_rules, auth)
        }
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C signal");
}
