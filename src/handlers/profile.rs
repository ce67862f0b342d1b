use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    error::Result,
    models::profile::{ProfilePatch, ProfileRecord},
    repositories::profile as profile_repo,
    services::{
        profile::{self as profile_service, Completeness, ProfileView, StepGate},
        session::SessionContext,
    },
    state::AppState,
};

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum ProfileStatus {
    Complete,
    Incomplete,
}

impl From<&Completeness> for ProfileStatus {
    fn from(completeness: &Completeness) -> Self {
        if completeness.is_complete() {
            ProfileStatus::Complete
        } else {
            ProfileStatus::Incomplete
        }
    }
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub status: ProfileStatus,
    /// Carries `missing` itself when the form is shown.
    #[serde(flatten)]
    pub view: ProfileView,
}

#[derive(Serialize)]
pub struct SaveProfileResponse {
    pub success: bool,
    pub message: String,
    pub status: ProfileStatus,
    pub missing: Vec<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub resume_attached: bool,
    pub steps: Vec<StepGate>,
}

/// Falls back to the signed-in email when the profile has none.
fn prefill_email(profile: &mut ProfileRecord, context: &SessionContext) {
    if profile.filled("email").is_none() && !context.claims.email.is_empty() {
        profile
            .fields
            .insert("email".to_string(), context.claims.email.clone());
    }
}

/// Loads the caller's profile as every profile endpoint evaluates it.
async fn load_profile(state: &AppState, context: &SessionContext) -> Result<ProfileRecord> {
    let mut profile = profile_repo::find_profile(&state.store, &context.user_id()).await?;
    prefill_email(&mut profile, context);
    Ok(profile)
}

/// Returns the profile form (pre-filled) or the read-only summary.
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = context.user_id();
    let profile = load_profile(&state, &context).await?;
    let resume = profile_repo::find_resume(&state.store, &user_id).await?;

    let completeness = profile_service::evaluate(&state.schema, &profile);
    let view = profile_service::view(&state.schema, &profile, resume.as_ref());

    let response = ProfileResponse {
        status: ProfileStatus::from(&completeness),
        view,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Merges submitted fields into the stored profile and re-evaluates completeness.
#[axum::debug_handler]
pub async fn save_profile(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Response> {
    let user_id = context.user_id();
    tracing::info!("📝 Saving profile for user: {}", user_id);

    state.schema.check_patch(&patch)?;

    let mut profile = load_profile(&state, &context).await?;
    profile.merge(patch);
    prefill_email(&mut profile, &context);
    profile.updated_at = Some(Utc::now());
    profile_repo::save_profile(&state.store, &user_id, &profile).await?;

    let completeness = profile_service::evaluate(&state.schema, &profile);
    tracing::info!(
        "✅ Profile saved for user {} (complete: {})",
        user_id,
        completeness.is_complete()
    );

    let response = SaveProfileResponse {
        success: true,
        message: "Profile saved successfully!".to_string(),
        status: ProfileStatus::from(&completeness),
        missing: completeness.missing().to_vec(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Reports which onboarding steps may be advanced past.
#[axum::debug_handler]
pub async fn onboarding(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = context.user_id();
    let profile = load_profile(&state, &context).await?;
    let resume_attached = profile_repo::find_resume(&state.store, &user_id)
        .await?
        .is_some();

    let response = OnboardingResponse {
        resume_attached,
        steps: profile_service::onboarding(&state.schema, &profile, resume_attached),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
