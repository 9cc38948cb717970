use actix_multipart::Multipart;
use actix_web::{
    web::{self, Path, Query},
    HttpRequest, HttpResponse, Responder,
};
use futures::TryStreamExt;
use log::{debug, error, info};
use sanitize_filename::sanitize;
use serde::Deserialize;
use std::path::Path as StdPath;
use uuid::Uuid;

use super::models::{FileKind, FileRecord};
use crate::db::AppState;
use crate::{owner_id, ErrorResponse};

/// Validity window for download redirects.
pub const DOWNLOAD_URL_TTL_SECS: u32 = 300;

struct UploadParts {
    content: Vec<u8>,
    original_name: String,
    folder_id: Option<Uuid>,
    description: Option<String>,
}

async fn parse_upload(mut payload: Multipart) -> Result<UploadParts, String> {
    let mut file: Option<(Vec<u8>, String)> = None;
    let mut folder_id: Option<Uuid> = None;
    let mut description: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|e| e.to_string())? {
        let content_disposition = field
            .content_disposition()
            .ok_or("Content-Disposition not set")?;
        let field_name = content_disposition
            .get_name()
            .ok_or_else(|| "No field name".to_string())?;

        match field_name {
            "file" => {
                let original = content_disposition
                    .get_filename()
                    .ok_or_else(|| "No filename".to_string())?
                    .to_string();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((bytes, original));
            }
            "folder_id" => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
                    bytes.extend_from_slice(&chunk);
                }
                let value = String::from_utf8(bytes).map_err(|e| e.to_string())?;
                folder_id = Uuid::parse_str(value.trim()).ok();
            }
            "description" => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.try_next().await.map_err(|e| e.to_string())? {
                    bytes.extend_from_slice(&chunk);
                }
                let value = String::from_utf8(bytes).map_err(|e| e.to_string())?;
                if !value.trim().is_empty() {
                    description = Some(value);
                }
            }
            _ => continue,
        }
    }

    match file {
        Some((content, original_name)) => Ok(UploadParts {
            content,
            original_name,
            folder_id,
            description,
        }),
        None => Err("No file was uploaded".to_string()),
    }
}

/// Fold accented Latin letters to their ASCII base letter.
fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        'Ñ' => 'N',
        'Ý' => 'Y',
        _ => return None,
    };
    Some(folded)
}

/// Make a name safe for storage paths: accents folded to their base letter,
/// anything outside `[A-Za-z0-9._-]` replaced with `_`.
pub(crate) fn sanitize_object_name(name: &str) -> String {
    sanitize(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else if let Some(folded) = fold_accent(c) {
                folded
            } else {
                '_'
            }
        })
        .collect()
}

/// Collision-free storage name: UUID prefix plus the sanitized original.
pub(crate) fn storage_object_name(original: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitize_object_name(original))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListFilesQuery {
    /// Restrict the listing to one folder.
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct UploadFileRequest {
    #[allow(unused)]
    pub file: Vec<u8>,
    #[allow(unused)]
    pub folder_id: Option<Uuid>,
    #[allow(unused)]
    pub description: Option<String>,
}

#[utoipa::path(
    context_path = "/api",
    tag = "File Service",
    post,
    path = "/files",
    request_body(content = inline(UploadFileRequest), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = FileRecord),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Folder not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    req: HttpRequest,
    payload: Multipart,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    info!("Executing upload_file handler");

    let parts = match parse_upload(payload).await {
        Ok(parts) => parts,
        Err(e) => {
            error!("Failed during file upload process: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e));
        }
    };

    let folder = match parts.folder_id {
        Some(folder_id) => match data.store.get_folder(&folder_id, &owner).await {
            Ok(Some(folder)) => Some(folder),
            Ok(None) => {
                return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                    "Folder with ID {} not found",
                    folder_id
                )))
            }
            Err(e) => {
                error!("Failed to get folder {}: {}", folder_id, e);
                return HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal_error("Failed to retrieve folder"));
            }
        },
        None => None,
    };

    let object_name = storage_object_name(&parts.original_name);
    let storage_path = match &folder {
        Some(folder) => format!("{}/{}", folder.name, object_name),
        None => object_name,
    };
    let content_type = mime_guess::from_path(&parts.original_name)
        .first_or_octet_stream()
        .to_string();

    debug!(
        "Uploading '{}' ({} bytes) to storage path {}",
        parts.original_name,
        parts.content.len(),
        storage_path
    );
    if let Err(e) = data
        .storage
        .upload(&storage_path, &parts.content, &content_type)
        .await
    {
        error!("Failed to upload file to storage: {}", e);
        return HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Failed to store uploaded file"));
    }

    let ext = StdPath::new(&parts.original_name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("");
    let file_type = FileKind::from_extension(ext);
    let file_size = parts.content.len() as i64;
    let record = FileRecord::uploaded(
        owner,
        parts.original_name,
        file_type,
        file_size,
        storage_path,
        folder.map(|f| f.id),
        parts.description,
    );

    if let Err(e) = data.store.insert_file(&record).await {
        error!("Failed to insert file record, but object was stored: {}", e);
        return HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Failed to save file record"));
    }
    info!("File {:?} uploaded and recorded.", record.id);
    HttpResponse::Created().json(record)
}

#[utoipa::path(
    context_path = "/api",
    tag = "File Service",
    get,
    path = "/files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Files owned by the caller", body = Vec<FileRecord>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn list_files(
    req: HttpRequest,
    query: Query<ListFilesQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let result = match query.folder_id {
        Some(folder_id) => data.store.list_files_in_folder(&folder_id).await,
        None => data.store.list_files(&owner).await,
    };
    match result {
        Ok(files) => {
            let files: Vec<FileRecord> =
                files.into_iter().filter(|f| f.owner_id == owner).collect();
            HttpResponse::Ok().json(files)
        }
        Err(e) => {
            error!("Failed to list files: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve files"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "File Service",
    get,
    path = "/files/{id}",
    params(("id" = Uuid, Path, description = "ID of the file")),
    responses(
        (status = 200, description = "File record found", body = FileRecord),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn get_file(
    req: HttpRequest,
    id: Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let file_id = id.into_inner();
    match data.store.get_file(&file_id, &owner).await {
        Ok(Some(file)) => HttpResponse::Ok().json(file),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
            "File with ID {} not found",
            file_id
        ))),
        Err(e) => {
            error!("Failed to get file {}: {}", file_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve file"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "File Service",
    get,
    path = "/files/{id}/download",
    params(("id" = Uuid, Path, description = "ID of the file")),
    responses(
        (status = 307, description = "Redirect to a time-limited download URL"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn download_file(
    req: HttpRequest,
    id: Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let file_id = id.into_inner();
    info!("Executing download_file handler for {}", file_id);

    let file = match data.store.get_file(&file_id, &owner).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "File with ID {} not found",
                file_id
            )))
        }
        Err(e) => {
            error!("Failed to get file {}: {}", file_id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve file"));
        }
    };

    if file.file_path.is_empty() {
        error!("File {} has no storage object", file_id);
        return HttpResponse::NotFound()
            .json(ErrorResponse::not_found("File has no storage object"));
    }

    match data
        .storage
        .signed_url(&file.file_path, DOWNLOAD_URL_TTL_SECS)
        .await
    {
        Ok(url) => {
            debug!("Redirecting download of {} to signed URL", file_id);
            HttpResponse::TemporaryRedirect()
                .append_header(("Location", url))
                .finish()
        }
        Err(e) => {
            error!("Failed to sign download URL for {}: {}", file_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to issue download URL"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "File Service",
    delete,
    path = "/files/{id}",
    params(("id" = Uuid, Path, description = "ID of the file to delete")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    req: HttpRequest,
    id: Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let file_id = id.into_inner();
    info!("Executing delete_file handler for {}", file_id);

    let file = match data.store.get_file(&file_id, &owner).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "File with ID {} not found",
                file_id
            )))
        }
        Err(e) => {
            error!("Failed to get file {}: {}", file_id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve file"));
        }
    };

    // storage delete is best-effort; the record goes regardless
    if !file.file_path.is_empty() {
        if let Err(e) = data.storage.delete(&file.file_path).await {
            error!("Failed to delete storage object {}: {}", file.file_path, e);
        }
    }

    match data.store.delete_file(&file_id).await {
        Ok(()) => {
            info!("File {} deleted.", file_id);
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            error!("Failed to delete file record {}: {}", file_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to delete file"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_object_name_strips_accents() {
        assert_eq!(sanitize_object_name("proposta-ação.pdf"), "proposta-acao.pdf");
        assert_eq!(sanitize_object_name("Relatório Nº2.pdf"), "Relatorio_N_2.pdf");
    }

    #[test]
    fn test_sanitize_object_name_replaces_unsafe_characters() {
        assert_eq!(sanitize_object_name("a b?c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_object_name("keep.-_safe.TXT"), "keep.-_safe.TXT");
    }

    #[test]
    fn test_storage_object_name_has_uuid_prefix() {
        let name = storage_object_name("é file.pdf");
        let (prefix, rest) = name.split_at(36);
        assert!(Uuid::parse_str(prefix).is_ok());
        assert_eq!(rest, "_e_file.pdf");
    }
}
