pub mod auth;
pub mod authoring;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod logging;
pub mod mail;
pub mod markdown;
pub mod media;
pub mod models;
pub mod pagination;
pub mod queries;
pub mod routes;
pub mod search;

pub const STATIC_HASH: &str = env!("STATIC_HASH");

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::{response::Redirect, routing::get, Router};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::mail::Mailer;
use crate::media::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub keys: JwtKeys,
    pub mailer: Arc<dyn Mailer>,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config);
        Self {
            db,
            config: Arc::new(config),
            keys,
            mailer,
            media,
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on the pool
/// beforehand. Uploaded images are served from `config.media_root`.
pub fn build_app(state: AppState) -> Router {
    let media_root = state.config.media_root.clone();
    let max_upload_bytes = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(|| async { Redirect::permanent("/blog/") }))
        .route("/health", get(health))
        .merge(routes::blog::router())
        .merge(routes::comments::router())
        .merge(routes::share::router())
        .merge(routes::search::router())
        .merge(routes::feeds::router())
        .merge(routes::auth::router())
        .merge(routes::api::router())
        .merge(routes::images::router(max_upload_bytes))
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .nest_service("/media", ServeDir::new(media_root))
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
