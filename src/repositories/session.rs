use uuid::Uuid;
use crate::{
    error::Result,
    models::session::SessionRecord,
    store::{keys, Store},
};

/// Saves the token most recently issued to a user.
pub async fn save_token(store: &Store, user_id: &Uuid, token: &str) -> Result<()> {
    store.put(&keys::auth_token(user_id), &token).await
}

/// Loads the token most recently issued to a user.
pub async fn find_token(store: &Store, user_id: &Uuid) -> Result<Option<String>> {
    store.get(&keys::auth_token(user_id)).await
}

/// Saves a user's session record.
pub async fn save_record(store: &Store, user_id: &Uuid, record: &SessionRecord) -> Result<()> {
    store.put(&keys::session_data(user_id), record).await
}

/// Loads a user's session record.
pub async fn find_record(store: &Store, user_id: &Uuid) -> Result<Option<SessionRecord>> {
    store.get(&keys::session_data(user_id)).await
}

/// Removes the token, identity and session records of a user.
pub async fn clear(store: &Store, user_id: &Uuid) -> Result<()> {
    store.clear_session(user_id).await
}
