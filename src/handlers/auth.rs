use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::AUTH_COOKIE,
    models::{
        session::{Claims, SessionRecord},
        user::{Consents, UserIdentity},
    },
    repositories::user as user_repo,
    services::{
        auth::{self as auth_service, NewAccount},
        session::SessionContext,
    },
    state::AppState,
    validation::auth::*,
};

/// The request payload for user registration.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[garde(length(min = 1, max = 255))]
    #[serde(default)]
    pub name: String,
    #[garde(email)]
    #[serde(default)]
    pub email: String,
    #[garde(length(min = 8, max = 128))]
    #[serde(default)]
    pub password: String,
    #[garde(skip)]
    #[serde(default)]
    pub confirm_password: String,
    #[garde(skip)]
    #[serde(default)]
    pub terms_consent: bool,
    #[garde(skip)]
    #[serde(default)]
    pub privacy_consent: bool,
    #[garde(skip)]
    #[serde(default)]
    pub marketing_consent: bool,
}

/// The request payload for user login.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// The response payload for a successful login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserIdentity,
    pub session: SessionRecord,
}

/// The response payload describing the current session.
#[derive(Serialize)]
pub struct SessionResponse {
    pub user: Option<UserIdentity>,
    pub session: Option<SessionRecord>,
    pub claims: Claims,
}

/// Creates a cookie with the given name, value, and max age.
fn create_secure_cookie(
    name: &'static str,
    value: String,
    max_age_days: i64,
    production: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);

    cookie.set_http_only(true);
    if production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_days * 86400));
    cookie.set_path("/");

    cookie
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    tracing::info!("📝 Register attempt for: {}", payload.email);

    validate_name(&payload.name)?;
    payload.validate()?;
    validate_password(&payload.password)?;
    validate_password_match(&payload.password, &payload.confirm_password)?;
    validate_consents(payload.terms_consent, payload.privacy_consent)?;

    tracing::info!("✅ Validations passed for: {}", payload.email);

    auth_service::simulate_latency(&state.config).await;

    let account = auth_service::create_account(
        &state.store,
        NewAccount {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            consents: Consents {
                terms: payload.terms_consent,
                privacy: payload.privacy_consent,
                marketing: payload.marketing_consent,
            },
        },
    )
    .await?;

    tracing::info!("✅ User registered: {}", account.id);

    let response = AuthResponse {
        success: true,
        message: "Account created successfully! Please sign in.".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for: {}", payload.email);

    auth_service::simulate_latency(&state.config).await;

    let account =
        auth_service::authenticate(&state.store, &payload.email, &payload.password).await?;

    let now = Utc::now();
    let issued = state
        .sessions
        .issue_at(account.id, &account.email, payload.remember_me, now)?;
    let identity = UserIdentity::from_account(&account, now);
    let session = state.sessions.establish(&identity, &issued).await?;

    let max_age_days = if payload.remember_me {
        state.config.remember_me_duration_days
    } else {
        state.config.session_duration_days
    };
    cookies.add(create_secure_cookie(
        AUTH_COOKIE,
        issued.token.clone(),
        max_age_days,
        state.config.production,
    ));
    tracing::info!("✅ User logged in: {}", account.id);

    let response = LoginResponse {
        success: true,
        token: issued.token,
        user: identity,
        session,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    cookies: Cookies,
) -> Result<Response> {
    tracing::info!("👋 Logout for user: {}", context.user_id());

    state.sessions.terminate(&context.user_id()).await?;

    let mut auth_cookie = Cookie::new(AUTH_COOKIE, "");
    auth_cookie.set_max_age(Duration::seconds(0));
    auth_cookie.set_path("/");
    cookies.remove(auth_cookie);

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the identity and session record of the caller.
#[axum::debug_handler]
pub async fn session_status(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = context.user_id();
    let user = user_repo::find_identity(&state.store, &user_id).await?;
    let session = state.sessions.record(&user_id).await?;

    if session.is_none() {
        return Err(AppError::Unauthenticated);
    }

    let response = SessionResponse {
        user,
        session,
        claims: context.claims,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
