//! # agora binary
//!
//! The composition root: loads configuration, connects the adapters
//! selected at compile time, runs the cold-start reputation pass, spawns
//! the daily refresh job, and serves the API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::ExposeSecret;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api_adapters::{router, AppState, CookieSettings};
use auth_adapters::JwtSessionManager;
use configs::AppConfig;
use domains::{CategoryRepo, CommentRepo, ThreadRepo, UserRepo};
use services::{InteractionService, ReputationService};
use storage_adapters::postgres::{
    connect, PgCategoryRepo, PgCommentRepo, PgInteractionRepo, PgThreadRepo, PgUserRepo,
};

const REPUTATION_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(config.server.environment.is_production());

    let pool = connect(
        config.database.url.expose_secret(),
        config.database.max_connections,
    )
    .await
    .context("connecting to postgres")?;

    let users: Arc<dyn UserRepo> = Arc::new(PgUserRepo::new(pool.clone()));
    let threads: Arc<dyn ThreadRepo> = Arc::new(PgThreadRepo::new(pool.clone()));
    let comments: Arc<dyn CommentRepo> = Arc::new(PgCommentRepo::new(pool.clone()));
    let categories: Arc<dyn CategoryRepo> = Arc::new(PgCategoryRepo::new(pool.clone()));

    let interactions = Arc::new(InteractionService::new(Arc::new(PgInteractionRepo::new(
        pool.clone(),
    ))));
    let reputation = Arc::new(ReputationService::new(
        users.clone(),
        threads.clone(),
        comments.clone(),
    ));

    // Cold-start consistency pass; a failed run is retried by the daily
    // job, never fatal to startup.
    match reputation.run_batch().await {
        Ok(outcome) => info!(
            updated = outcome.updated,
            skipped = outcome.skipped,
            "startup reputation pass complete"
        ),
        Err(err) => error!(error = %err, "startup reputation pass failed"),
    }
    spawn_reputation_job(reputation.clone());

    let state = AppState {
        users,
        threads,
        comments,
        categories,
        interactions,
        reputation,
        sessions: Arc::new(JwtSessionManager::new(&config.auth)),
        cookies: CookieSettings::from_auth_config(&config.auth),
    };

    let app = router(state, &config.server.frontend_origin)
        .map_err(|err| anyhow::anyhow!("building router: {err}"))?;

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
            .await
            .context("binding listener")?;
    info!(host = %config.server.host, port = config.server.port, "agora listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}

/// Daily reputation refresh. Read-mostly, so it shares the pool with live
/// traffic without holding anything the ledger contends on.
fn spawn_reputation_job(reputation: Arc<ReputationService>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REPUTATION_REFRESH_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; startup already ran a pass.
        interval.tick().await;

        loop {
            interval.tick().await;
            match reputation.run_batch().await {
                Ok(outcome) => info!(
                    updated = outcome.updated,
                    skipped = outcome.skipped,
                    "scheduled reputation pass complete"
                ),
                Err(err) => error!(error = %err, "scheduled reputation pass failed; will retry"),
            }
        }
    });
}

fn init_tracing(production: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if production {
        builder.json().init();
    } else {
        builder.init();
    }
}
