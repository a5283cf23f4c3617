//! recs-service: HTTP entry point for the store recommendation service.

use std::time::Duration;

use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stamp_recs::catalog::CatalogHandle;
use stamp_recs::config::{ConfigLoader, DatabaseConfig, ServiceConfig, SnapshotConfig};
use stamp_recs::handlers::{health_check, recommendations, AppState};
use stamp_recs::recommender::RecommendationService;
use stamp_recs::visits::{NoVisitHistory, PostgresVisitHistory, VisitHistory};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .init();

    let service_config = ServiceConfig::from_env()?;
    let snapshot_config = SnapshotConfig::from_env()?;

    let history: Box<dyn VisitHistory> = match DatabaseConfig::from_env_optional()? {
        Some(db) => {
            let pool = PgPoolOptions::new()
                .max_connections(db.max_connections)
                .acquire_timeout(Duration::from_secs(db.connect_timeout_secs))
                .connect(&db.url)
                .await?;
            info!("Connected to visit history database");
            Box::new(PostgresVisitHistory::new(pool))
        }
        None => {
            warn!("No database configured, serving without stored visit history");
            Box::new(NoVisitHistory)
        }
    };

    let service = RecommendationService::new(CatalogHandle::new(snapshot_config.path), history);
    let state = web::Data::new(AppState { service });

    info!(
        "Starting recs-service on {}:{}",
        service_config.host, service_config.port
    );
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(health_check)
            .service(recommendations)
    })
    .bind((service_config.host.as_str(), service_config.port))?
    .run()
    .await?;

    Ok(())
}
