use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use sea_orm::TransactionTrait;
use tracing::instrument;
use uuid::Uuid;

use crate::catalog::{CatalogService, DocumentChanges};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::gateway::{IndexDelete, IndexUpdate};
use crate::models::document::{
    DocumentListResponse, DocumentResponse, FolderEntryResponse, FolderResponse,
    UpdateDocumentRequest,
};
use crate::state::AppState;

fn document_not_found() -> AppError {
    AppError::NotFound("Document not found".into())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Documents",
    operation_id = "listDocuments",
    summary = "List the caller's documents",
    description = "Returns every document the caller has uploaded, oldest first, including the \
        extracted text.",
    responses(
        (status = 200, description = "Documents", body = DocumentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_documents(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let files: Vec<DocumentResponse> = CatalogService::new(&state.db)
        .list_documents(auth_user.user_id)
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();

    Ok(Json(DocumentListResponse {
        total: files.len(),
        files,
    }))
}

#[utoipa::path(
    get,
    path = "/folder",
    tag = "Documents",
    operation_id = "getFolder",
    summary = "The caller's folder",
    description = "Returns the folder's cached metadata for each document. A user who has never \
        uploaded gets an empty folder.",
    responses(
        (status = 200, description = "Folder", body = FolderResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_folder(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<FolderResponse>, AppError> {
    let entries: Vec<FolderEntryResponse> = CatalogService::new(&state.db)
        .folder_entries(auth_user.user_id)
        .await?
        .map(|(_, entries)| entries)
        .unwrap_or_default()
        .into_iter()
        .map(FolderEntryResponse::from)
        .collect();

    Ok(Json(FolderResponse {
        document_count: entries.len(),
        entries,
    }))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Documents",
    operation_id = "updateDocument",
    summary = "Update a document's metadata",
    description = "Partially updates `name`, `course`, `topic` and `description`. The folder entry \
        and the extraction service's index are updated together; if the service rejects the \
        change nothing is saved.",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not owned (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Index update failed, nothing saved (GATEWAY_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, document_id = %id))]
pub async fn update_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let txn = state.db.begin().await?;
    let catalog = CatalogService::new(&txn);

    let doc = catalog
        .find_owned(auth_user.user_id, id)
        .await?
        .ok_or_else(document_not_found)?;
    let (old_course, old_topic) = (doc.course.clone(), doc.topic.clone());

    let updated = catalog
        .update_document(doc, &DocumentChanges::from(payload))
        .await?;

    // Dropping `txn` on error rolls the update back.
    state
        .gateway
        .update_index(&IndexUpdate {
            old_course,
            old_topic,
            user_email: auth_user.email,
            new_course: updated.course.clone(),
            new_topic: updated.topic.clone(),
            new_description: updated.description.clone(),
            new_text: updated.extracted_text.clone(),
            name: updated.name.clone(),
            date: updated.date.clone(),
            time: updated.time.clone(),
            file_type: updated.file_type.clone(),
        })
        .await?;

    txn.commit().await.map_err(|e| {
        tracing::error!(
            document_id = %id,
            error = %e,
            "Commit failed after the index was updated; index and catalog disagree"
        );
        e
    })?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Documents",
    operation_id = "deleteDocument",
    summary = "Delete a document",
    description = "Removes the document and its folder entry and drops its index in the \
        extraction service. If the service call fails nothing is deleted.",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not owned (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Index removal failed, nothing deleted (GATEWAY_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, document_id = %id))]
pub async fn delete_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let catalog = CatalogService::new(&txn);

    let doc = catalog
        .find_owned(auth_user.user_id, id)
        .await?
        .ok_or_else(document_not_found)?;

    let request = IndexDelete {
        user_email: auth_user.email,
        course: doc.course.clone(),
        topic: doc.topic.clone(),
    };

    catalog.delete_document(doc).await?;
    state.gateway.delete_index(&request).await?;

    txn.commit().await.map_err(|e| {
        tracing::error!(
            document_id = %id,
            error = %e,
            "Commit failed after the index was dropped; index and catalog disagree"
        );
        e
    })?;

    Ok(StatusCode::NO_CONTENT)
}
