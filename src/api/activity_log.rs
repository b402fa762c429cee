//! Activity log service

use std::net::IpAddr;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::activity::ActivityEntry;
use crate::client_ip::ClientIp;
use crate::storage::Storage;

use super::CurrentActor;
use super::Error;

/// Activity log service
pub struct ActivityLog<S: Storage> {
    /// Storage in where the log is saved
    storage: S,

    /// The actor doing things
    current_actor: CurrentActor,

    /// The IP address associated with the request
    ip_address: Option<IpAddr>,
}

impl<S: Storage> ActivityLog<S> {
    /// Register an entry on the activity log
    ///
    /// Failing to do so is logged, the request itself already succeeded
    pub async fn register(&self, entry: ActivityEntry<'_>) {
        let result = self
            .storage
            .register_activity(&self.current_actor, &entry, self.ip_address.as_ref())
            .await;

        if let Err(err) = result {
            tracing::error!("Could not register activity entry: {err}");
        }
    }
}

impl<B, S: Storage> FromRequestParts<B> for ActivityLog<S>
where
    B: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        let Extension(storage) = parts
            .extract::<Extension<S>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get a storage pool"))?;

        let current_actor = CurrentActor::from_request_parts(parts, state).await?;

        let ip_address = parts
            .extract::<Option<ClientIp>>()
            .await
            .map_err(|_| Error::internal_server_error("Missing address"))?
            .map(|client_ip| client_ip.ip_address);

        Ok(Self {
            storage,
            current_actor,
            ip_address,
        })
    }
}
