//! Generation orchestrator.
//!
//! Sequences schema construction, validation, context building, composition,
//! rendering, upload and recording. Nothing is persisted until both the
//! render and the upload have succeeded, so a failure anywhere leaves no
//! partial record behind.

use actix_web::web;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::compose::compose;
use super::context::build_context;
use super::form::{FormSchema, ValidationErrors};
use super::models::Template;
use super::naming;
use crate::db::{AppState, StoreError};
use crate::files::models::FileRecord;
use crate::folder::models::Folder;
use crate::render::{get_static_dir, RenderError};
use crate::storage::StorageError;

/// Validity window for the signed URL returned after generation.
pub const RESULT_URL_TTL_SECS: u32 = 600;

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerateAction {
    #[default]
    Generate,
    Delete,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    #[serde(default)]
    pub action: GenerateAction,
    /// Submitted form values, keyed by field name.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub values: Map<String, Value>,
    /// Destination folder; required for the generate action.
    pub folder_id: Option<Uuid>,
    /// Record to remove; required for the delete action.
    pub file_id: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("submitted form is invalid")]
    Validation(ValidationErrors),
    #[error("PDF rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("rendering task was canceled")]
    Canceled,
    #[error("failed to upload generated document: {0}")]
    Upload(StorageError),
    #[error("persistent store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedFile {
    pub record: FileRecord,
    /// Time-limited download URL; absent when URL issuance failed after the
    /// document was stored.
    pub download_url: Option<String>,
}

/// Run the full pipeline for one generation request.
pub async fn generate_document(
    state: &AppState,
    template: &Template,
    folder: &Folder,
    owner_id: &Uuid,
    values: Map<String, Value>,
) -> Result<GeneratedFile, GenerateError> {
    let schema = FormSchema::from_html(&template.html_content);
    let cleaned = schema.clean(&values).map_err(GenerateError::Validation)?;

    let context = build_context(cleaned, &schema.list_field_names(), &state.storage, owner_id).await;

    let html = compose(
        &template.html_content,
        template.css_content.as_deref(),
        &context,
    );

    let renderer = state.renderer.clone();
    let pdf = web::block(move || renderer.render_pdf(&html, get_static_dir()))
        .await
        .map_err(|_| GenerateError::Canceled)??;

    let file_name = naming::file_name_for(template.template_type, &context, &template.name);
    let storage_path = format!("{}/{}", folder.name, file_name);

    state
        .storage
        .upload(&storage_path, &pdf, "application/pdf")
        .await
        .map_err(GenerateError::Upload)?;

    let record = FileRecord::generated(
        *owner_id,
        file_name,
        pdf.len() as i64,
        storage_path.clone(),
        folder.id,
        template.id,
        Value::Object(context),
    );
    state.store.insert_file(&record).await?;

    let download_url = match state
        .storage
        .signed_url(&storage_path, RESULT_URL_TTL_SECS)
        .await
    {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Document stored but URL issuance failed: {}", e);
            None
        }
    };

    info!(
        "Generated document '{}' from template '{}'",
        record.file_name, template.name
    );
    Ok(GeneratedFile {
        record,
        download_url,
    })
}

/// Delete action: best-effort storage delete, then the record. The caller
/// re-displays a schema rebuilt fresh from the same template.
pub async fn delete_generated(
    state: &AppState,
    owner_id: &Uuid,
    file_id: &Uuid,
) -> Result<bool, StoreError> {
    match state.store.get_file(file_id, owner_id).await? {
        Some(file) => {
            if !file.file_path.is_empty() {
                if let Err(e) = state.storage.delete(&file.file_path).await {
                    error!(
                        "Failed to delete storage object {}: {}",
                        file.file_path, e
                    );
                }
            }
            state.store.delete_file(&file.id).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
