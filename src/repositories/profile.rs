use uuid::Uuid;
use crate::{
    error::Result,
    models::{profile::ProfileRecord, resume::ResumeRecord},
    store::{keys, Store},
};

/// Loads a user's saved profile, or an empty one.
pub async fn find_profile(store: &Store, user_id: &Uuid) -> Result<ProfileRecord> {
    Ok(store
        .get(&keys::profile_data(user_id))
        .await?
        .unwrap_or_default())
}

/// Saves a user's profile.
pub async fn save_profile(store: &Store, user_id: &Uuid, profile: &ProfileRecord) -> Result<()> {
    store.put(&keys::profile_data(user_id), profile).await
}

/// Loads a user's resume metadata.
pub async fn find_resume(store: &Store, user_id: &Uuid) -> Result<Option<ResumeRecord>> {
    store.get(&keys::resume_data(user_id)).await
}

/// Saves a user's resume metadata.
pub async fn save_resume(store: &Store, user_id: &Uuid, resume: &ResumeRecord) -> Result<()> {
    store.put(&keys::resume_data(user_id), resume).await
}
