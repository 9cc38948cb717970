use actix_web::{
    web::{self, Json, Path, Query},
    HttpRequest, HttpResponse, Responder,
};
use log::{error, info};
use serde::Deserialize;
use uuid::Uuid;

use super::models::{CreateFolderRequest, Folder};
use super::service::{delete_folder_tree, FolderDeleteError, FolderDeletionReport};
use crate::db::{AppState, StoreError};
use crate::{owner_id, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListFoldersQuery {
    /// Parent folder to list children of; omitted lists root folders.
    pub parent_id: Option<Uuid>,
}

#[utoipa::path(
    context_path = "/api",
    tag = "Folder Service",
    post,
    path = "/folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = Folder),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Folder already exists", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn create_folder(
    req: HttpRequest,
    body: Json<CreateFolderRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    info!("Executing create_folder handler for '{}'", body.name);

    let name = body.name.trim().to_string();
    if name.is_empty() {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::bad_request("Folder name cannot be empty"));
    }

    // check-then-create; the store's uniqueness constraint resolves the race
    // between concurrent identical requests
    match data
        .store
        .folder_exists(&owner, &name, body.parent_id.as_ref())
        .await
    {
        Ok(true) => {
            return HttpResponse::Conflict()
                .json(ErrorResponse::conflict("Folder already exists"))
        }
        Ok(false) => {}
        Err(e) => {
            error!("Failed to check folder existence: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to create folder"));
        }
    }

    let folder = Folder::new(owner, name, body.description.clone(), body.parent_id);
    match data.store.insert_folder(&folder).await {
        Ok(()) => {
            info!("Folder '{}' created.", folder.name);
            HttpResponse::Created().json(folder)
        }
        Err(StoreError::AlreadyExists) => {
            HttpResponse::Conflict().json(ErrorResponse::conflict("Folder already exists"))
        }
        Err(e) => {
            error!("Failed to insert folder: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to create folder"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Folder Service",
    get,
    path = "/folders",
    params(ListFoldersQuery),
    responses(
        (status = 200, description = "Folders under the given parent", body = Vec<Folder>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn list_folders(
    req: HttpRequest,
    query: Query<ListFoldersQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    match data
        .store
        .list_folders(&owner, query.parent_id.as_ref())
        .await
    {
        Ok(folders) => HttpResponse::Ok().json(folders),
        Err(e) => {
            error!("Failed to list folders: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve folders"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Folder Service",
    delete,
    path = "/folders/{id}",
    params(("id" = Uuid, Path, description = "ID of the folder to delete")),
    responses(
        (status = 200, description = "Folder tree deleted", body = FolderDeletionReport),
        (status = 404, description = "Folder not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn delete_folder(
    req: HttpRequest,
    id: Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let folder_id = id.into_inner();
    info!("Executing delete_folder handler for {}", folder_id);

    let folder = match data.store.get_folder(&folder_id, &owner).await {
        Ok(Some(folder)) => folder,
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
    };

    match delete_folder_tree(&data.store, &data.storage, &folder).await {
        Ok(report) => {
            info!(
                "Folder '{}' deleted: {} folders, {} files, {} storage failures",
                folder.name, report.folders_deleted, report.files_deleted, report.storage_failures
            );
            HttpResponse::Ok().json(report)
        }
        Err(FolderDeleteError::TooDeep) => {
            error!("Folder tree under '{}' is too deep to delete", folder.name);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Folder tree is too deep"))
        }
        Err(FolderDeleteError::Store(e)) => {
            error!("Failed to delete folder tree '{}': {}", folder.name, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to delete folder"))
        }
    }
}
