use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity and expiry carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub user_id: Uuid,
    /// The user's email address at issuance.
    pub email: String,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Expiry as a timestamp. Out-of-range values clamp to the epoch.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Whether the token is expired at `now`. A token expiring exactly now is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}

/// Bookkeeping derived from a token at login.
///
/// Only `last_activity` changes after creation; the record is removed at
/// logout or once the token is found to be expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// The timestamp when the session was created.
    pub login_time: DateTime<Utc>,
    /// The timestamp of the last activity refresh.
    pub last_activity: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(login_time: DateTime<Utc>, claims: &Claims) -> Self {
        Self {
            login_time,
            last_activity: login_time,
            expires_at: claims.expires_at(),
        }
    }
}
