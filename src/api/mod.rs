//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;

use crate::storage::Storage;

pub use activity_log::ActivityLog;
pub use current_actor::CurrentActor;
pub use current_actor::JwtKeys;
pub use current_actor::Token;
pub use current_actor::generate_token;
pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use response::Error;
pub use response::Success;

mod activity;
mod activity_log;
mod comments;
mod current_actor;
mod notes;
mod participants;
mod request;
mod response;
mod revisions;
mod shares;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let revisions = Router::new()
        .route("/", get(revisions::list::<S>))
        .route("/{revision}", get(revisions::single::<S>))
        .route("/{revision}/restore", post(revisions::restore::<S>));

    let participants = Router::new()
        .route("/", get(participants::list::<S>))
        .route("/", post(participants::join::<S>))
        .route("/{connection}", delete(participants::leave::<S>));

    let comments = Router::new()
        .route("/", get(comments::list::<S>))
        .route("/", post(comments::create::<S>))
        .route("/{comment}", delete(comments::delete::<S>))
        .route("/{comment}/resolve", post(comments::resolve::<S>))
        .route("/{comment}/unresolve", post(comments::unresolve::<S>));

    let share = Router::new()
        .route("/", get(shares::single::<S>))
        .route("/", post(shares::create::<S>))
        .route("/", delete(shares::delete::<S>));

    let notes = Router::new()
        .route("/", get(notes::list::<S>))
        .route("/", post(notes::create::<S>))
        .route("/search", get(notes::search::<S>))
        .route("/{note}", get(notes::single::<S>))
        .route("/{note}", patch(notes::update::<S>))
        .route("/{note}", delete(notes::delete::<S>))
        .nest("/{note}/revisions", revisions)
        .nest("/{note}/participants", participants)
        .nest("/{note}/comments", comments)
        .nest("/{note}/share", share)
        .route("/{note}/activity", get(activity::list_for_note::<S>));

    let workspaces = Router::new()
        .nest("/notes", notes)
        .route("/activity", get(activity::list::<S>));

    Router::new()
        .nest("/workspaces/{workspace}", workspaces)
        .route("/share/{token}", get(shares::shared::<S>))
        .fallback(not_found)
}

/// Fallback for routes that do not exist
async fn not_found() -> Error {
    Error::not_found("Not found")
}
