#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime watch application.
//!
//! Serves the REST API for filing and querying crime reports,
//! community voting, and the geospatial read paths (heatmap,
//! statistics, nearby alerts). Authentication is an external
//! collaborator: the transport forwards the authenticated caller's
//! identity in the `X-User-Id` header, and every owner-scoped
//! operation reads it from there.

mod handlers;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crime_watch_blob::{BlobStore, MemoryBlobStore, S3BlobStore};
use crime_watch_reports::ReportService;

/// Shared application state.
pub struct AppState {
    /// The report service: lifecycle, voting, and reads.
    pub service: Arc<ReportService>,
    /// Evidence blob store, used to classify inline attachment
    /// payloads on ingestion.
    pub blob: Arc<dyn BlobStore>,
}

/// Default interval between periodic full rescoring sweeps.
const DEFAULT_RESCORE_INTERVAL_SECS: u64 = 3600;

/// Starts the crime watch API server.
///
/// Opens the `SQLite` report database (`DATABASE_PATH`, defaulting to
/// `data/crime_watch.db`), connects the evidence blob store from
/// `S3_*` environment variables (falling back to an in-memory store
/// when unconfigured), spawns the periodic rescoring sweep, and serves
/// the HTTP API. This is a regular async function — the caller
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to
/// bind or encounters a runtime error.
///
/// # Panics
///
/// Panics if the report database cannot be opened.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let db_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| crime_watch_database::DEFAULT_DB_PATH.to_string());
    log::info!("Opening reports database at {db_path}...");
    let db = crime_watch_database::open_db(Some(Path::new(&db_path)))
        .await
        .expect("Failed to open reports database");

    let blob: Arc<dyn BlobStore> = match S3BlobStore::from_env() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::warn!("Evidence blob store not configured ({e}); storing evidence in memory");
            Arc::new(MemoryBlobStore::new())
        }
    };

    let service = Arc::new(ReportService::new(Arc::from(db), Arc::clone(&blob)));

    spawn_rescore_sweep(Arc::clone(&service));

    let state = web::Data::new(AppState {
        service,
        blob,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/categories", web::get().to(handlers::categories))
                    .route("/reports", web::get().to(handlers::list_reports))
                    .route("/reports", web::post().to(handlers::create_report))
                    .route("/reports/heatmap", web::get().to(handlers::heatmap))
                    .route("/reports/statistics", web::get().to(handlers::statistics))
                    .route("/reports/nearby", web::get().to(handlers::nearby))
                    .route("/reports/mine", web::get().to(handlers::my_reports))
                    .route(
                        "/reports/district/{district}",
                        web::get().to(handlers::by_district),
                    )
                    .route(
                        "/reports/city/{province}",
                        web::get().to(handlers::by_province),
                    )
                    .route("/reports/{id}", web::get().to(handlers::get_report))
                    .route("/reports/{id}", web::patch().to(handlers::update_report))
                    .route("/reports/{id}", web::delete().to(handlers::delete_report))
                    .route(
                        "/reports/{id}/vote-status",
                        web::get().to(handlers::vote_status),
                    )
                    .route("/reports/{id}/confirm", web::post().to(handlers::confirm))
                    .route("/reports/{id}/dispute", web::post().to(handlers::dispute))
                    .route("/reports/{id}/verify", web::post().to(handlers::verify)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Spawns the periodic rescoring sweep.
///
/// Freshness decays with time, so trust scores drift without any
/// triggering mutation; the sweep keeps persisted scores current.
fn spawn_rescore_sweep(service: Arc<ReportService>) {
    let interval_secs = std::env::var("RESCORE_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RESCORE_INTERVAL_SECS);

    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(interval_secs));
        // The first tick fires immediately; skip it so startup stays quick
        interval.tick().await;
        loop {
            interval.tick().await;
            match service.rescore_all().await {
                Ok(count) => log::debug!("Periodic rescore swept {count} report(s)"),
                Err(e) => log::error!("Periodic rescoring failed: {e}"),
            }
        }
    });
}
