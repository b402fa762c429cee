//! Configuration from the environment

use std::env::var;
use std::net::SocketAddr;

use anyhow::Result;
use uuid::Uuid;

use crate::storage;

/// Address to listen on when `ADDRESS` is not set
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

/// Log filter when `RUST_LOG` is not set
pub const DEFAULT_RUST_LOG: &str = "scribe=debug,tower_http=debug";

/// Everything the app needs to start
pub struct AppConfig {
    /// Where notes are kept
    pub storage: storage::Config,

    /// Secret to sign and verify API tokens with
    pub jwt_secret: String,
}

impl AppConfig {
    /// Read the configuration from the environment
    ///
    /// Without `JWT_SECRET` a temporary secret is generated, tokens will not survive a restart
    pub fn from_env() -> Self {
        let jwt_secret = env_var_or_else("JWT_SECRET", || {
            let jwt_secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
            tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
            jwt_secret
        });

        Self {
            storage: storage::Config::from_env(),
            jwt_secret,
        }
    }
}

/// Get the value of ENV var, or a default
///
/// Only when:
/// - It is set
/// - It is not empty
pub fn env_var_or_else(var_name: &'static str, or_else: fn() -> String) -> String {
    match var(var_name) {
        Ok(value) if !value.is_empty() => value,
        _ => or_else(),
    }
}

/// The address to listen on, from `ADDRESS` and `PORT`
///
/// # Errors
///
/// Will return `Err` when either of them can not be parsed
pub fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Ok(port) = var("PORT") {
        // only check non-empty strings
        if !port.is_empty() {
            address.set_port(port.parse::<u16>()?);
        }
    }

    Ok(address)
}
