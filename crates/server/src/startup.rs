use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, auth::{CookieSettings, ServerState}};
use service::auth::{
    notifier::{Notifier, SmtpNotifier},
    repo::SeaOrmUserStore,
    repository::UserStore,
    service::AuthConfig,
};
use service::reviews::{repository::ReviewRepository, seaorm::SeaOrmReviewRepository};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire stores, notifier and services from validated configuration.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    let users: Arc<dyn UserStore> = Arc::new(SeaOrmUserStore::new(db.clone()));
    let notifier: Arc<dyn Notifier> = Arc::new(SmtpNotifier::new(&cfg.email)?);
    let reviews: Arc<dyn ReviewRepository> = Arc::new(SeaOrmReviewRepository::new(db));

    Ok(ServerState::new(
        users,
        notifier,
        reviews,
        AuthConfig::from_settings(&cfg.auth)?,
        CookieSettings::from_settings(&cfg.auth),
    ))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::load_and_validate()?;
    info!(environment = %cfg.auth.environment, jwt_expires_in = %cfg.auth.jwt_expires_in, "configuration loaded");

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
