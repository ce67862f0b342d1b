use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    config::Config,
    crypto::password::{hash_password, verify_password},
    error::{AppError, Result},
    models::user::{Account, Consents},
    repositories::user as user_repo,
    store::Store,
};

/// Message returned for any credential mismatch.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A validated registration.
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub consents: Consents,
}

/// Waits the configured artificial backend delay.
pub async fn simulate_latency(config: &Config) {
    if config.mock_latency_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.mock_latency_ms)).await;
    }
}

/// Creates a new account.
///
/// # Arguments
///
/// * `store` - The key/value store.
/// * `new_account` - The validated registration.
///
/// # Returns
///
/// A `Result` containing the created `Account`.
pub async fn create_account(store: &Store, new_account: NewAccount) -> Result<Account> {
    let email = new_account.email.trim().to_lowercase();
    tracing::debug!("🔐 Creating account: {}", email);

    if user_repo::find_by_email(store, &email).await?.is_some() {
        return Err(AppError::Validation(
            "An account with this email already exists".to_string(),
        ));
    }

    let account = Account {
        id: Uuid::new_v4(),
        name: new_account.name.trim().to_string(),
        email,
        password_hash: hash_password(&new_account.password)?,
        consents: new_account.consents,
        created_at: Utc::now(),
    };

    user_repo::create_account(store, &account).await?;
    tracing::info!("✅ Account created with ID: {}", account.id);
    Ok(account)
}

/// Authenticates a user by email and password.
///
/// # Arguments
///
/// * `store` - The key/value store.
/// * `email` - The email the user signed in with.
/// * `password` - The password the user signed in with.
///
/// # Returns
///
/// A `Result` containing the authenticated `Account`.
pub async fn authenticate(store: &Store, email: &str, password: &str) -> Result<Account> {
    tracing::debug!("🔐 Authenticating user: {}", email);

    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    let account = user_repo::find_by_email(store, email)
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(password, &account.password_hash)? {
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!("✅ User authenticated: {}", account.id);
    Ok(account)
}

/// Registers the demo account unless it already exists.
pub async fn seed_demo_account(store: &Store, config: &Config) -> Result<()> {
    if user_repo::find_by_email(store, &config.demo_email).await?.is_some() {
        tracing::debug!("Demo account already present");
        return Ok(());
    }

    create_account(
        store,
        NewAccount {
            name: "Demo User".to_string(),
            email: config.demo_email.clone(),
            password: config.demo_password.to_string(),
            consents: Consents {
                terms: true,
                privacy: true,
                marketing: false,
            },
        },
    )
    .await?;
    tracing::info!("✅ Demo account seeded: {}", config.demo_email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SIGNING_KEY_LEN;

    fn config() -> Config {
        let mut config = Config::new(vec![1u8; SIGNING_KEY_LEN]).unwrap();
        config.mock_latency_ms = 0;
        config
    }

    #[tokio::test]
    async fn demo_credentials_authenticate() {
        let store = Store::memory();
        seed_demo_account(&store, &config()).await.unwrap();
        seed_demo_account(&store, &config()).await.unwrap();

        let account = authenticate(&store, "demo@example.com", "password123").await.unwrap();
        assert_eq!(account.name, "Demo User");

        let err = authenticate(&store, "demo@example.com", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        let err = authenticate(&store, "nobody@example.com", "password123").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn emails_are_case_insensitive_and_unique() {
        let store = Store::memory();
        let new = |email: &str| NewAccount {
            name: " Aisha ".to_string(),
            email: email.to_string(),
            password: "s3cure-pass".to_string(),
            consents: Consents::default(),
        };

        let account = create_account(&store, new("Aisha@Example.com")).await.unwrap();
        assert_eq!(account.email, "aisha@example.com");
        assert_eq!(account.name, "Aisha");

        let err = create_account(&store, new("aisha@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(authenticate(&store, "AISHA@example.com", "s3cure-pass").await.is_ok());
    }
}
