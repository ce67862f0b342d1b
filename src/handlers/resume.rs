use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{profile::ProfilePatch, resume::{FileDescriptor, ParsedResume}},
    repositories::profile as profile_repo,
    services::{auth::simulate_latency, resume as resume_service, session::SessionContext},
    state::AppState,
};

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct ParseResponse {
    pub parsed: ParsedResume,
    pub autofill: ProfilePatch,
}

/// Reads the `file` field of a multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<(FileDescriptor, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(format!("Parse error: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Multipart(format!("file data: {}", e)))?;

        let descriptor = FileDescriptor {
            name,
            content_type,
            size: data.len() as u64,
        };
        return Ok((descriptor, data));
    }

    Err(AppError::Validation("Please select a file first".to_string()))
}

/// Uploads a resume and stores its metadata.
#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    mut multipart: Multipart,
) -> Result<Response> {
    let user_id = context.user_id();
    let (descriptor, data) = read_file_field(&mut multipart).await?;

    tracing::info!(
        "📤 Resume upload from user {}: {} ({} bytes, {})",
        user_id,
        descriptor.name,
        descriptor.size,
        descriptor.content_type
    );

    let pending = resume_service::admit(descriptor, &data).map_err(|rejection| {
        tracing::warn!("❌ Resume rejected for user {}: {:?}", user_id, rejection);
        AppError::from(rejection)
    })?;

    simulate_latency(&state.config).await;

    let record = pending.commit(Utc::now());
    profile_repo::save_resume(&state.store, &user_id, &record).await?;
    tracing::info!("✅ Resume stored for user {}: {}", user_id, record.file_name);

    Ok((StatusCode::OK, Json(record)).into_response())
}

/// Returns the stored resume metadata.
#[axum::debug_handler]
pub async fn get_resume(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
) -> Result<Response> {
    let record = profile_repo::find_resume(&state.store, &context.user_id())
        .await?
        .ok_or(AppError::NotFound)?;

    Ok((StatusCode::OK, Json(record)).into_response())
}

/// Simulates parsing a resume and returns profile fields to pre-fill.
#[axum::debug_handler]
pub async fn parse_resume(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    mut multipart: Multipart,
) -> Result<Response> {
    let (descriptor, data) = read_file_field(&mut multipart).await?;
    tracing::info!("🔍 Parsing resume for user {}: {}", context.user_id(), descriptor.name);

    let pending = resume_service::admit(descriptor, &data)?;

    simulate_latency(&state.config).await;

    let parsed = resume_service::mock_parse(&pending);
    let response = ParseResponse {
        autofill: resume_service::autofill(&parsed),
        parsed,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
