use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Consent flags captured at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consents {
    pub terms: bool,
    pub privacy: bool,
    pub marketing: bool,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's full name.
    pub name: String,
    /// The user's email address, lowercased.
    pub email: String,
    /// The user's Argon2id password hash.
    pub password_hash: String,
    /// What the user agreed to at registration.
    pub consents: Consents,
    /// The timestamp when the account was created.
    pub created_at: DateTime<Utc>,
}

/// The identity record written at login and shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub login_time: DateTime<Utc>,
}

impl UserIdentity {
    pub fn from_account(account: &Account, login_time: DateTime<Utc>) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            login_time,
        }
    }
}
