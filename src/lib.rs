use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod db;
pub mod files;
pub mod folder;
pub mod render;
pub mod storage;
pub mod template;

pub use crate::db::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new("Conflict", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

/// Header carrying the owning user's identity, populated by the upstream
/// auth layer.
pub const OWNER_HEADER: &str = "X-User-Id";

/// Extract the owner from the request, or the 400 response to return.
pub fn owner_id(req: &actix_web::HttpRequest) -> Result<uuid::Uuid, actix_web::HttpResponse> {
    let value = req
        .headers()
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    uuid::Uuid::parse_str(value).map_err(|_| {
        actix_web::HttpResponse::BadRequest().json(ErrorResponse::bad_request(&format!(
            "Missing or invalid {} header",
            OWNER_HEADER
        )))
    })
}

pub async fn run() -> std::io::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::template::handlers::create_template,
            crate::template::handlers::list_templates,
            crate::template::handlers::get_template,
            crate::template::handlers::update_template,
            crate::template::handlers::delete_template,
            crate::template::handlers::get_template_form,
            crate::template::handlers::generate,
            crate::folder::handlers::create_folder,
            crate::folder::handlers::list_folders,
            crate::folder::handlers::delete_folder,
            crate::files::handlers::upload_file,
            crate::files::handlers::list_files,
            crate::files::handlers::get_file,
            crate::files::handlers::download_file,
            crate::files::handlers::delete_file
        ),
        components(
            schemas(
                template::models::Template,
                template::models::TemplateType,
                template::models::CreateTemplateRequest,
                template::models::UpdateTemplateRequest,
                template::form::FormSchema,
                template::form::FieldSpec,
                template::form::FieldKind,
                template::form::FieldError,
                template::generate::GenerateRequest,
                template::generate::GenerateAction,
                template::generate::GeneratedFile,
                template::handlers::GenerateFailure,
                template::handlers::DeleteOutcome,
                folder::models::Folder,
                folder::models::CreateFolderRequest,
                folder::service::FolderDeletionReport,
                files::models::FileRecord,
                files::models::FileKind,
                files::models::FileStatus,
                files::handlers::UploadFileRequest,
                ErrorResponse,
            )
        ),
        tags(
            (name = "Template Service", description = "Template CRUD and PDF generation endpoints."),
            (name = "Folder Service", description = "Folder hierarchy endpoints."),
            (name = "File Service", description = "File upload, download and deletion endpoints.")
        ),
        servers(
            (url = "http://127.0.0.1:8080", description = "Localhost server")
        )
    )]
    struct ApiDoc;

    dotenvy::dotenv().ok(); // Load .env file
    let app_state = match AppState::new().await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise application state. Check SUPABASE_DATABASE_URL and the SUPABASE_* variables in .env. Error: {}", e);
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("easydocs_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    log::info!("Starting server at http://0.0.0.0:8080");

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/templates")
                            .route(web::get().to(template::handlers::list_templates))
                            .route(web::post().to(template::handlers::create_template)),
                    )
                    .service(
                        web::resource("/templates/{id}")
                            .route(web::get().to(template::handlers::get_template))
                            .route(web::put().to(template::handlers::update_template))
                            .route(web::delete().to(template::handlers::delete_template)),
                    )
                    .service(
                        web::resource("/templates/{id}/form")
                            .route(web::get().to(template::handlers::get_template_form)),
                    )
                    .service(
                        web::resource("/templates/{id}/generate")
                            .route(web::post().to(template::handlers::generate)),
                    )
                    .service(
                        web::resource("/folders")
                            .route(web::get().to(folder::handlers::list_folders))
                            .route(web::post().to(folder::handlers::create_folder)),
                    )
                    .service(
                        web::resource("/folders/{id}")
                            .route(web::delete().to(folder::handlers::delete_folder)),
                    )
                    .service(
                        web::resource("/files")
                            .route(web::get().to(files::handlers::list_files))
                            .route(web::post().to(files::handlers::upload_file)),
                    )
                    .service(
                        web::resource("/files/{id}")
                            .route(web::get().to(files::handlers::get_file))
                            .route(web::delete().to(files::handlers::delete_file)),
                    )
                    .service(
                        web::resource("/files/{id}/download")
                            .route(web::get().to(files::handlers::download_file)),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .backlog(8192)
    .max_connections(25000)
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
