//! Share links
//!
//! A note can be shared read-only with anyone holding its token. A note has at most one link,
//! sharing it again replaces the token.

use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// Prefix of the URL a shared note is read from
pub const SHARE_URL_PREFIX: &str = "/api/share/";

/// A share link of a note
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareLink {
    /// The shared note
    pub note_id: Uuid,

    /// Secret token, 64 hex characters
    pub token: String,

    /// Who shared the note
    pub created_by: Uuid,

    /// When the note was shared
    pub created_at: NaiveDateTime,

    /// After this the link stops working, never when missing
    pub expires_at: Option<NaiveDateTime>,
}

impl ShareLink {
    /// Where the shared note can be read
    pub fn url(&self) -> String {
        format!("{SHARE_URL_PREFIX}{}", self.token)
    }

    /// Is the link past its expiry date?
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Generate a new share token
///
/// Two random UUIDs in simple form, 64 hex characters
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
