//! Postgres document store (sqlx).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DocumentStore, StoreError};
use crate::files::models::FileRecord;
use crate::folder::models::Folder;
use crate::template::models::Template;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::AlreadyExists;
        }
    }
    StoreError::Database(e)
}

const FOLDER_COLUMNS: &str = "id, owner_id, name, description, parent_id, created_at, updated_at";
const TEMPLATE_COLUMNS: &str = "id, owner_id, name, template_type, description, html_content, \
                                css_content, is_active, created_at, updated_at";
const FILE_COLUMNS: &str = "id, owner_id, file_name, file_type, file_size, file_path, folder_id, \
                            template_id, description, is_generated, status, data_used, \
                            created_at, updated_at";

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert_folder(&self, folder: &Folder) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO folders (id, owner_id, name, description, parent_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(folder.id)
        .bind(folder.owner_id)
        .bind(&folder.name)
        .bind(folder.description.as_deref())
        .bind(folder.parent_id)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn get_folder(&self, id: &Uuid, owner_id: &Uuid) -> Result<Option<Folder>, StoreError> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(folder)
    }

    async fn folder_exists(
        &self,
        owner_id: &Uuid,
        name: &str,
        parent_id: Option<&Uuid>,
    ) -> Result<bool, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM folders
             WHERE owner_id = $1 AND name = $2 AND parent_id IS NOT DISTINCT FROM $3",
        )
        .bind(owner_id)
        .bind(name)
        .bind(parent_id.copied())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn list_folders(
        &self,
        owner_id: &Uuid,
        parent_id: Option<&Uuid>,
    ) -> Result<Vec<Folder>, StoreError> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2
             ORDER BY name"
        ))
        .bind(owner_id)
        .bind(parent_id.copied())
        .fetch_all(&self.pool)
        .await?;
        Ok(folders)
    }

    async fn delete_folder(&self, id: &Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_template(&self, template: &Template) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO templates (id, owner_id, name, template_type, description, html_content,
                                    css_content, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(template.id)
        .bind(template.owner_id)
        .bind(&template.name)
        .bind(template.template_type)
        .bind(template.description.as_deref())
        .bind(&template.html_content)
        .bind(template.css_content.as_deref())
        .bind(template.is_active)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn get_template(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<Option<Template>, StoreError> {
        let template = sqlx::query_as::<_, Template>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    async fn list_templates(
        &self,
        owner_id: &Uuid,
        active_only: bool,
    ) -> Result<Vec<Template>, StoreError> {
        let templates = sqlx::query_as::<_, Template>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates
             WHERE owner_id = $1 AND (is_active OR NOT $2)
             ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    async fn update_template(&self, template: &Template) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE templates
             SET name = $2, template_type = $3, description = $4, html_content = $5,
                 css_content = $6, is_active = $7, updated_at = $8
             WHERE id = $1",
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(template.template_type)
        .bind(template.description.as_deref())
        .bind(&template.html_content)
        .bind(template.css_content.as_deref())
        .bind(template.is_active)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_template(&self, id: &Uuid) -> Result<(), StoreError> {
        // file references are nulled, never cascaded; the FK mirrors this
        sqlx::query("UPDATE files SET template_id = NULL WHERE template_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_file(&self, file: &FileRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO files (id, owner_id, file_name, file_type, file_size, file_path,
                                folder_id, template_id, description, is_generated, status,
                                data_used, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(file.id)
        .bind(file.owner_id)
        .bind(&file.file_name)
        .bind(file.file_type)
        .bind(file.file_size)
        .bind(&file.file_path)
        .bind(file.folder_id)
        .bind(file.template_id)
        .bind(file.description.as_deref())
        .bind(file.is_generated)
        .bind(file.status)
        .bind(&file.data_used)
        .bind(file.created_at)
        .bind(file.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn get_file(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<Option<FileRecord>, StoreError> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(file)
    }

    async fn list_files(&self, owner_id: &Uuid) -> Result<Vec<FileRecord>, StoreError> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    async fn list_files_in_folder(
        &self,
        folder_id: &Uuid,
    ) -> Result<Vec<FileRecord>, StoreError> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE folder_id = $1 ORDER BY created_at DESC"
        ))
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    async fn delete_file(&self, id: &Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
