#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]
#![doc = include_str!("../README.md")]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum_client_ip::ClientIpSource;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::api::Error;
use crate::api::JwtKeys;
use crate::api::router;
use crate::config::AppConfig;
use crate::realtime::EventHub;
use crate::realtime::SessionRegistry;
use crate::service::NoteService;
use crate::storage::Memory;
use crate::storage::Storage;

pub mod activity;
pub mod actors;
pub mod api;
pub mod blocks;
pub mod client;
mod client_ip;
pub mod comments;
pub mod config;
pub mod graceful_shutdown;
pub mod guard;
pub mod notes;
pub mod pipeline;
pub mod realtime;
pub mod restore;
pub mod revisions;
pub mod service;
pub mod shares;
pub mod storage;
#[cfg(test)]
mod tests;

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load, like the database connection
pub async fn setup_app(config: AppConfig) -> Result<Router> {
    let jwt_keys = JwtKeys::new(config.jwt_secret.as_bytes());

    match config.storage {
        storage::Config::Memory => Ok(create_router(Memory::new(), jwt_keys)),
        #[cfg(feature = "postgres")]
        storage_config => {
            let storage = storage::Postgres::from_config(storage_config).await?;

            Ok(create_router(storage, jwt_keys))
        }
    }
}

/// Serve the app until `shutdown` is cancelled or a terminate signal comes in
///
/// # Errors
///
/// Will return `Err` when the address can not be bound
pub async fn serve(app: Router, address: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(address).await?;

    tracing::info!("Listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown::handler(shutdown))
    .await?;

    Ok(())
}

/// Create the router for Scribe
fn create_router<S: Storage>(storage: S, jwt_keys: JwtKeys) -> Router {
    let service = NoteService::new(storage.clone(), EventHub::default(), SessionRegistry::new());

    Router::new()
        .nest("/api", router::<S>())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(service))
        .layer(Extension(jwt_keys))
        .layer(ClientIpSource::ConnectInfo.into_extension())
}

/// Fallback for everything outside the API
async fn not_found() -> Error {
    Error::not_found("Not found")
}
