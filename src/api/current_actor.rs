//! Current actor service
//!
//! Get the current actor from the request based on the Authorization header. Accounts live
//! elsewhere, the token carries everything needed: who the actor is and which workspaces they
//! belong to.

use std::ops::Deref;
use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::actors::Actor;

use super::Error;

/// How long a token is valid, in seconds
const TOKEN_EXPIRES_IN: i64 = 3600;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims to identify an actor
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The actor ID
    sub: Uuid,

    /// Display name
    name: String,

    /// Workspaces the actor is a member of
    workspaces: Vec<Uuid>,

    /// When does the token expire, as a timestamp
    exp: i64,
}

/// Token information served to the outside world
#[derive(Debug, Serialize)]
pub struct Token {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)] // `type` is a reserved keyword
    pub token_type: String,

    /// In how many seconds does the token expire
    pub expires_in: i64,

    /// The access token to provide to follow up requests in the Authorization header
    #[allow(clippy::struct_field_names)] // `access_token` is the name of the field
    pub access_token: String,
}

impl Token {
    /// Create a new token response
    fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            expires_in,
            access_token,
        }
    }
}

/// Current actor service
#[derive(Clone)]
pub struct CurrentActor {
    /// The actual actor
    actor: Arc<Actor>,
}

impl Deref for CurrentActor {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.actor
    }
}

/// Generate a token for the outside world for a given actor
///
/// # Errors
///
/// Will return `Err` when the token can not be encoded
pub fn generate_token(jwt_keys: &JwtKeys, actor: &Actor) -> Result<Token, Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let claims = Claims {
        sub: actor.id,
        name: actor.name.clone(),
        workspaces: actor.workspaces.clone(),
        exp: chrono::Utc::now().timestamp() + TOKEN_EXPIRES_IN,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(Token::new(access_token, TOKEN_EXPIRES_IN))
}

impl<B> FromRequestParts<B> for CurrentActor
where
    B: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        use jsonwebtoken::Validation;
        use jsonwebtoken::decode;

        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::forbidden("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let token_data = decode::<Claims>(bearer.token(), &jwt_keys.decoding, &Validation::default())
            .map_err(|err| Error::forbidden(format!("Invalid token: {err}")))?;

        let claims = token_data.claims;

        Ok(Self {
            actor: Arc::new(Actor {
                id: claims.sub,
                name: claims.name,
                workspaces: claims.workspaces,
            }),
        })
    }
}
