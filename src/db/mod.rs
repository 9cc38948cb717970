//! Persistent store and application state.
//!
//! This module is split into submodules for better separation of concerns:
//! - `postgres` - sqlx-backed [`DocumentStore`] implementation
//! - `memory` - in-memory [`DocumentStore`] used by tests and local development

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::files::models::FileRecord;
use crate::folder::models::Folder;
use crate::template::models::Template;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// CRUD boundary for folders, templates and file records.
#[async_trait]
pub trait DocumentStore {
    async fn insert_folder(&self, folder: &Folder) -> Result<(), StoreError>;
    async fn get_folder(&self, id: &Uuid, owner_id: &Uuid) -> Result<Option<Folder>, StoreError>;
    async fn folder_exists(
        &self,
        owner_id: &Uuid,
        name: &str,
        parent_id: Option<&Uuid>,
    ) -> Result<bool, StoreError>;
    /// Folders owned by `owner_id` under `parent_id` (`None` lists roots).
    async fn list_folders(
        &self,
        owner_id: &Uuid,
        parent_id: Option<&Uuid>,
    ) -> Result<Vec<Folder>, StoreError>;
    async fn delete_folder(&self, id: &Uuid) -> Result<(), StoreError>;

    async fn insert_template(&self, template: &Template) -> Result<(), StoreError>;
    async fn get_template(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<Option<Template>, StoreError>;
    async fn list_templates(
        &self,
        owner_id: &Uuid,
        active_only: bool,
    ) -> Result<Vec<Template>, StoreError>;
    async fn update_template(&self, template: &Template) -> Result<(), StoreError>;
    /// Deletes the template; file records keep existing with a nulled
    /// reference.
    async fn delete_template(&self, id: &Uuid) -> Result<(), StoreError>;

    async fn insert_file(&self, file: &FileRecord) -> Result<(), StoreError>;
    async fn get_file(&self, id: &Uuid, owner_id: &Uuid)
        -> Result<Option<FileRecord>, StoreError>;
    async fn list_files(&self, owner_id: &Uuid) -> Result<Vec<FileRecord>, StoreError>;
    async fn list_files_in_folder(&self, folder_id: &Uuid)
        -> Result<Vec<FileRecord>, StoreError>;
    async fn delete_file(&self, id: &Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore + Send + Sync>,
    pub storage: Arc<dyn crate::storage::ObjectStorage + Send + Sync>,
    pub renderer: Arc<dyn crate::render::PdfRenderer + Send + Sync>,
}

impl AppState {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let supabase_config = crate::storage::SupabaseConfig::from_env()?;
        Self::new_with_config(supabase_config).await
    }

    pub async fn new_with_config(
        supabase_config: crate::storage::SupabaseConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = std::env::var("SUPABASE_DATABASE_URL")?;

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(100)
            .min_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&database_url)
            .await?;

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("easydocs-server/0.3")
            .build()?;

        let storage = Arc::new(crate::storage::SupabaseStorage::new(
            supabase_config,
            http_client,
        ));

        Ok(AppState {
            store: Arc::new(postgres::PgStore::new(pool)),
            storage,
            renderer: Arc::new(crate::render::WeasyPrintRenderer),
        })
    }

    /// Assemble state from explicit components. Tests substitute an
    /// in-memory store, a mock storage gateway and a fake renderer here.
    pub fn with_components(
        store: Arc<dyn DocumentStore + Send + Sync>,
        storage: Arc<dyn crate::storage::ObjectStorage + Send + Sync>,
        renderer: Arc<dyn crate::render::PdfRenderer + Send + Sync>,
    ) -> Self {
        AppState {
            store,
            storage,
            renderer,
        }
    }
}
