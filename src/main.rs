use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_api::config::Config;
use blog_api::db::{Database, PgUserStore, UserStore};
use blog_api::security::revocation::{RedisRevocationStore, RevocationStore};
use blog_api::security::token::TokenCodec;
use blog_api::security::KeyMaterial;
use blog_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::connect(&config).await?;
    tracing::info!("Database connections established");

    db.run_migrations().await?;

    // Without usable key material the service can neither issue nor
    // validate a token, so this aborts startup.
    let keys = KeyMaterial::load(
        &config.auth.private_key_path,
        &config.auth.public_key_path,
        &config.environment,
    )?;
    tracing::info!(fingerprint = %keys.fingerprint(), "Key material loaded");

    let codec = Arc::new(TokenCodec::from_config(Arc::new(keys), &config.auth)?);
    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db.pg.clone()));
    let revocations: Arc<dyn RevocationStore> =
        Arc::new(RedisRevocationStore::new(db.redis.clone(), &config.auth));

    let state = AppState {
        db,
        config: config.clone(),
        codec,
        users,
        revocations,
    };

    let app = blog_api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
