use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::user::{Account, UserIdentity},
    store::{keys, Store},
};

/// Creates a new account. Fails when the email is already registered.
pub async fn create_account(store: &Store, account: &Account) -> Result<()> {
    let key = keys::account(&account.email);
    if store.contains(&key).await? {
        return Err(AppError::Validation(
            "An account with this email already exists".to_string(),
        ));
    }
    store.put(&key, account).await
}

/// Finds an account by its email address.
pub async fn find_by_email(store: &Store, email: &str) -> Result<Option<Account>> {
    store.get(&keys::account(email)).await
}

/// Saves the identity record shown for a logged-in user.
pub async fn save_identity(store: &Store, identity: &UserIdentity) -> Result<()> {
    store.put(&keys::user_data(&identity.id), identity).await
}

/// Loads the identity record of a user.
pub async fn find_identity(store: &Store, user_id: &Uuid) -> Result<Option<UserIdentity>> {
    store.get(&keys::user_data(user_id)).await
}
