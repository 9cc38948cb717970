use actix_web::{
    web::{self, Json, Path, Query},
    HttpRequest, HttpResponse, Responder,
};
use chrono::Utc;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::form::{FieldError, FormSchema};
use super::generate::{
    delete_generated, generate_document, GenerateAction, GenerateError, GenerateRequest,
    GeneratedFile,
};
use super::models::{CreateTemplateRequest, Template, UpdateTemplateRequest};
use crate::db::AppState;
use crate::{owner_id, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListTemplatesQuery {
    /// When true, only active templates are listed.
    #[serde(default)]
    pub active_only: bool,
}

/// 400 body for an invalid submission: field errors plus everything the
/// client needs to re-display the form with the submitted values preserved.
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateFailure {
    pub error: String,
    pub fields: Vec<FieldError>,
    #[schema(value_type = Object)]
    pub values: Map<String, Value>,
    pub form: FormSchema,
}

/// Outcome of the delete action: a schema rebuilt fresh from the template.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteOutcome {
    pub deleted: bool,
    pub form: FormSchema,
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    post,
    path = "/templates",
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = Template),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn create_template(
    req: HttpRequest,
    body: Json<CreateTemplateRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    info!("Executing create_template handler for '{}'", body.name);

    let body = body.into_inner();
    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::bad_request("Template name cannot be empty"));
    }

    let template = Template::new(
        owner,
        body.name,
        body.template_type,
        body.description,
        body.html_content,
        body.css_content,
        body.is_active,
    );
    match data.store.insert_template(&template).await {
        Ok(()) => {
            info!("Template {:?} created.", template.id);
            HttpResponse::Created().json(template)
        }
        Err(e) => {
            error!("Failed to insert template: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to save template"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    get,
    path = "/templates",
    params(ListTemplatesQuery),
    responses(
        (status = 200, description = "Templates owned by the caller", body = Vec<Template>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn list_templates(
    req: HttpRequest,
    query: Query<ListTemplatesQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    match data.store.list_templates(&owner, query.active_only).await {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => {
            error!("Failed to list templates: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve templates"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    get,
    path = "/templates/{id}",
    params(("id" = Uuid, Path, description = "ID of the template")),
    responses(
        (status = 200, description = "Template found", body = Template),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn get_template(
    req: HttpRequest,
    id: Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let template_id = id.into_inner();
    match data.store.get_template(&template_id, &owner).await {
        Ok(Some(template)) => HttpResponse::Ok().json(template),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
            "Template with ID {} not found",
            template_id
        ))),
        Err(e) => {
            error!("Failed to get template {}: {}", template_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve template"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    put,
    path = "/templates/{id}",
    request_body = UpdateTemplateRequest,
    params(("id" = Uuid, Path, description = "ID of the template")),
    responses(
        (status = 200, description = "Template updated", body = Template),
        (status = 404, description = "Template not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn update_template(
    req: HttpRequest,
    id: Path<Uuid>,
    body: Json<UpdateTemplateRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let template_id = id.into_inner();

    let mut template = match data.store.get_template(&template_id, &owner).await {
        Ok(Some(template)) => template,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "Template with ID {} not found",
                template_id
            )))
        }
        Err(e) => {
            error!("Failed to get template {}: {}", template_id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve template"));
        }
    };

    let body = body.into_inner();
    if let Some(name) = body.name {
        template.name = name;
    }
    if let Some(template_type) = body.template_type {
        template.template_type = template_type;
    }
    if let Some(description) = body.description {
        template.description = Some(description);
    }
    if let Some(html_content) = body.html_content {
        template.html_content = html_content;
    }
    if let Some(css_content) = body.css_content {
        template.css_content = Some(css_content);
    }
    if let Some(is_active) = body.is_active {
        template.is_active = is_active;
    }
    template.updated_at = Utc::now();

    match data.store.update_template(&template).await {
        Ok(()) => HttpResponse::Ok().json(template),
        Err(e) => {
            error!("Failed to update template {}: {}", template_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to update template"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    delete,
    path = "/templates/{id}",
    params(("id" = Uuid, Path, description = "ID of the template")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Template not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn delete_template(
    req: HttpRequest,
    id: Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let template_id = id.into_inner();

    match data.store.get_template(&template_id, &owner).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "Template with ID {} not found",
                template_id
            )))
        }
        Err(e) => {
            error!("Failed to get template {}: {}", template_id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve template"));
        }
    }

    match data.store.delete_template(&template_id).await {
        Ok(()) => {
            info!("Template {} deleted; document references nulled.", template_id);
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            error!("Failed to delete template {}: {}", template_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to delete template"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    get,
    path = "/templates/{id}/form",
    params(("id" = Uuid, Path, description = "ID of the template")),
    responses(
        (status = 200, description = "Entry-form schema for the template", body = FormSchema),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn get_template_form(
    req: HttpRequest,
    id: Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let template_id = id.into_inner();
    match data.store.get_template(&template_id, &owner).await {
        Ok(Some(template)) => {
            let schema = FormSchema::from_html(&template.html_content);
            debug!(
                "Built form schema with {} fields for template {}",
                schema.fields.len(),
                template_id
            );
            HttpResponse::Ok().json(schema)
        }
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
            "Template with ID {} not found",
            template_id
        ))),
        Err(e) => {
            error!("Failed to get template {}: {}", template_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve template"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Template Service",
    post,
    path = "/templates/{id}/generate",
    request_body = GenerateRequest,
    params(("id" = Uuid, Path, description = "ID of the template")),
    responses(
        (status = 201, description = "Document generated and stored", body = GeneratedFile),
        (status = 200, description = "Delete action processed", body = DeleteOutcome),
        (status = 400, description = "Invalid submission", body = GenerateFailure),
        (status = 404, description = "Template, folder or file not found", body = ErrorResponse),
        (status = 500, description = "Render, upload or store failure", body = ErrorResponse)
    )
)]
pub async fn generate(
    req: HttpRequest,
    id: Path<Uuid>,
    body: Json<GenerateRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let owner = match owner_id(&req) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let template_id = id.into_inner();
    info!(
        "Executing generate handler for template {} ({:?})",
        template_id, body.action
    );

    let template = match data.store.get_template(&template_id, &owner).await {
        Ok(Some(template)) => template,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "Template with ID {} not found",
                template_id
            )))
        }
        Err(e) => {
            error!("Failed to get template {}: {}", template_id, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to retrieve template"));
        }
    };

    let body = body.into_inner();
    match body.action {
        GenerateAction::Delete => {
            let file_id = match body.file_id {
                Some(file_id) => file_id,
                None => {
                    return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
                        "file_id is required for the delete action",
                    ))
                }
            };
            match delete_generated(&data, &owner, &file_id).await {
                Ok(deleted) => {
                    if !deleted {
                        return HttpResponse::NotFound().json(ErrorResponse::not_found(
                            &format!("File with ID {} not found", file_id),
                        ));
                    }
                    // back to a clean form, rebuilt from the same template
                    let form = FormSchema::from_html(&template.html_content);
                    HttpResponse::Ok().json(DeleteOutcome {
                        deleted: true,
                        form,
                    })
                }
                Err(e) => {
                    error!("Failed to delete file {}: {}", file_id, e);
                    HttpResponse::InternalServerError()
                        .json(ErrorResponse::internal_error("Failed to delete document"))
                }
            }
        }
        GenerateAction::Generate => {
            let folder_id = match body.folder_id {
                Some(folder_id) => folder_id,
                None => {
                    return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
                        "folder_id is required for the generate action",
                    ))
                }
            };
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

            let submitted = body.values.clone();
            match generate_document(&data, &template, &folder, &owner, body.values).await {
                Ok(generated) => HttpResponse::Created().json(generated),
                Err(GenerateError::Validation(errors)) => {
                    debug!(
                        "Submission for template {} invalid: {} field errors",
                        template_id,
                        errors.errors.len()
                    );
                    HttpResponse::BadRequest().json(GenerateFailure {
                        error: "ValidationFailed".to_string(),
                        fields: errors.errors,
                        values: submitted,
                        form: FormSchema::from_html(&template.html_content),
                    })
                }
                Err(e @ (GenerateError::Render(_) | GenerateError::Canceled)) => {
                    error!("Rendering failed for template {}: {}", template_id, e);
                    HttpResponse::InternalServerError()
                        .json(ErrorResponse::internal_error("Failed to render document"))
                }
                Err(GenerateError::Upload(e)) => {
                    error!("Upload failed for template {}: {}", template_id, e);
                    HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
                        "Failed to store generated document",
                    ))
                }
                Err(GenerateError::Store(e)) => {
                    error!("Failed to record document for template {}: {}", template_id, e);
                    HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
                        "Failed to record generated document",
                    ))
                }
            }
        }
    }
}
