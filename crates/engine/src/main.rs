use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use domain::models::Actor;
use persistence::{CacheLayer, PgOverrideStore};
use settings_engine::{config::Config, defaults, logging, RequestContext, SettingsEngine};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    logging::init_logging(&config.logging)?;

    info!("Starting settings engine v{}", env!("CARGO_PKG_VERSION"));

    let registry = defaults::load_registry(&config.defaults)?;

    let pool = persistence::db::create_pool(&config.pool_config()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let engine = SettingsEngine::new(
        Arc::new(PgOverrideStore::new(pool)),
        Arc::new(registry),
        CacheLayer::from_config(&config.cache_config()),
    );

    if config.defaults.seed_on_start {
        let seeded = engine
            .seed_global_defaults(&RequestContext::system(Actor::system()))
            .await?;
        info!(seeded = ?seeded, "Seeded global defaults");
    }

    info!(
        registry_version = engine.registry().version(),
        settings = engine.registry().len(),
        "Settings engine ready"
    );
    Ok(())
}
