use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use chrono::Utc;
use tracing::instrument;

use crate::config::UploadConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::gateway::{DocumentMetadata, SourceFile};
use crate::models::upload::UploadResponse;
use crate::state::AppState;
use crate::upload::{UploadCoordinator, UploadJob};
use crate::utils::filename::{mime_from_filename, validate_upload_filename};

/// Room for the multipart envelope and text fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn upload_body_limit(config: &UploadConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.max_file_size.saturating_add(MULTIPART_OVERHEAD))
}

#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    name: Option<String>,
    course: Option<String>,
    topic: Option<String>,
    description: Option<String>,
    date: Option<String>,
    time: Option<String>,
}

async fn read_form(multipart: &mut Multipart, max_file_size: usize) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };

        if field_name == "file" {
            let file_name = field
                .file_name()
                .map(str::to_owned)
                .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            if bytes.len() > max_file_size {
                return Err(AppError::Validation(format!(
                    "File exceeds the maximum size of {max_file_size} bytes"
                )));
            }
            form.file = Some((file_name, bytes.to_vec()));
            continue;
        }

        let slot = match field_name.as_str() {
            "name" => &mut form.name,
            "course" => &mut form.course,
            "topic" => &mut form.topic,
            "description" => &mut form.description,
            "date" => &mut form.date,
            "time" => &mut form.time,
            _ => continue, // Ignore unknown fields.
        };
        let text = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {field_name}: {e}")))?;
        *slot = Some(text.trim().to_string()).filter(|s| !s.is_empty());
    }

    Ok(form)
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Notes",
    operation_id = "uploadNote",
    summary = "Upload a PDF or image for text extraction",
    description = "Charges tokens (per page for PDFs, flat for images), extracts the text and \
        stores it as a document in the caller's folder. If extraction or storage fails after \
        the charge, the tokens are refunded automatically.",
    request_body(content_type = "multipart/form-data", description = "`file` plus optional \
        `name`, `course`, `topic`, `description`, `date`, `time`"),
    responses(
        (status = 200, description = "Uploaded", body = UploadResponse),
        (status = 400, description = "Missing file, unsupported type or unreadable PDF (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not enough tokens, nothing charged (INSUFFICIENT_TOKENS)", body = ErrorBody),
        (status = 500, description = "Extraction failed and tokens were refunded (EXTRACTION_FAILED), \
            or the refund failed too (REFUND_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = read_form(&mut multipart, state.config.upload.max_file_size).await?;

    let (raw_name, bytes) = form
        .file
        .ok_or_else(|| AppError::Validation("No file uploaded.".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty.".into()));
    }
    let file_name = validate_upload_filename(&raw_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    // The coordinator rejects anything outside the allowlist.
    let mime = mime_from_filename(&file_name)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let now = Utc::now();
    let metadata = DocumentMetadata {
        name: form.name.unwrap_or_else(|| file_name.clone()),
        course: form.course.unwrap_or_default(),
        topic: form.topic.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        date: form
            .date
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
        time: form.time.unwrap_or_else(|| now.format("%H:%M").to_string()),
    };

    let job = UploadJob::new(
        auth_user.user_id,
        auth_user.email,
        SourceFile {
            file_name,
            mime,
            bytes,
        },
        metadata,
    );

    let committed = UploadCoordinator::new(
        state.db.clone(),
        state.ledger.clone(),
        state.gateway.clone(),
        state.config.clone(),
    )
    .spawn(job)
    .await
    .map_err(|e| AppError::Internal(format!("Upload task failed: {e}")))?
    .map_err(|e| {
        if let Some(outcome) = e.outcome() {
            tracing::info!(?outcome, "Upload ended without a document");
        }
        AppError::from(e)
    })?;

    Ok(Json(committed.into()))
}
