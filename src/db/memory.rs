//! In-memory document store.
//!
//! Backs the test suite and local development without a Postgres instance.
//! Mirrors the relational constraints the schema enforces: folder uniqueness
//! on (owner, name, parent) and nulling of file references when a template is
//! deleted.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError};
use crate::files::models::FileRecord;
use crate::folder::models::Folder;
use crate::template::models::Template;

#[derive(Default)]
struct Tables {
    folders: Vec<Folder>,
    templates: Vec<Template>,
    files: Vec<FileRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_folder(&self, folder: &Folder) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let duplicate = tables.folders.iter().any(|f| {
            f.owner_id == folder.owner_id
                && f.name == folder.name
                && f.parent_id == folder.parent_id
        });
        if duplicate {
            return Err(StoreError::AlreadyExists);
        }
        tables.folders.push(folder.clone());
        Ok(())
    }

    async fn get_folder(&self, id: &Uuid, owner_id: &Uuid) -> Result<Option<Folder>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .folders
            .iter()
            .find(|f| f.id == *id && f.owner_id == *owner_id)
            .cloned())
    }

    async fn folder_exists(
        &self,
        owner_id: &Uuid,
        name: &str,
        parent_id: Option<&Uuid>,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.read();
        Ok(tables.folders.iter().any(|f| {
            f.owner_id == *owner_id && f.name == name && f.parent_id.as_ref() == parent_id
        }))
    }

    async fn list_folders(
        &self,
        owner_id: &Uuid,
        parent_id: Option<&Uuid>,
    ) -> Result<Vec<Folder>, StoreError> {
        let tables = self.tables.read();
        let mut folders: Vec<Folder> = tables
            .folders
            .iter()
            .filter(|f| f.owner_id == *owner_id && f.parent_id.as_ref() == parent_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn delete_folder(&self, id: &Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables.folders.retain(|f| f.id != *id);
        Ok(())
    }

    async fn insert_template(&self, template: &Template) -> Result<(), StoreError> {
        self.tables.write().templates.push(template.clone());
        Ok(())
    }

    async fn get_template(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<Option<Template>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .templates
            .iter()
            .find(|t| t.id == *id && t.owner_id == *owner_id)
            .cloned())
    }

    async fn list_templates(
        &self,
        owner_id: &Uuid,
        active_only: bool,
    ) -> Result<Vec<Template>, StoreError> {
        let tables = self.tables.read();
        let mut templates: Vec<Template> = tables
            .templates
            .iter()
            .filter(|t| t.owner_id == *owner_id && (t.is_active || !active_only))
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    async fn update_template(&self, template: &Template) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.templates.iter_mut().find(|t| t.id == template.id) {
            *existing = template.clone();
        }
        Ok(())
    }

    async fn delete_template(&self, id: &Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        for file in tables.files.iter_mut() {
            if file.template_id == Some(*id) {
                file.template_id = None;
            }
        }
        tables.templates.retain(|t| t.id != *id);
        Ok(())
    }

    async fn insert_file(&self, file: &FileRecord) -> Result<(), StoreError> {
        self.tables.write().files.push(file.clone());
        Ok(())
    }

    async fn get_file(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<Option<FileRecord>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .files
            .iter()
            .find(|f| f.id == *id && f.owner_id == *owner_id)
            .cloned())
    }

    async fn list_files(&self, owner_id: &Uuid) -> Result<Vec<FileRecord>, StoreError> {
        let tables = self.tables.read();
        let mut files: Vec<FileRecord> = tables
            .files
            .iter()
            .filter(|f| f.owner_id == *owner_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn list_files_in_folder(
        &self,
        folder_id: &Uuid,
    ) -> Result<Vec<FileRecord>, StoreError> {
        let tables = self.tables.read();
        let mut files: Vec<FileRecord> = tables
            .files
            .iter()
            .filter(|f| f.folder_id == Some(*folder_id))
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn delete_file(&self, id: &Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables.files.retain(|f| f.id != *id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_folder_uniqueness_on_owner_name_parent() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let folder = Folder::new(owner, "Reports".to_string(), None, None);
        store.insert_folder(&folder).await.unwrap();

        let duplicate = Folder::new(owner, "Reports".to_string(), None, None);
        assert!(matches!(
            store.insert_folder(&duplicate).await,
            Err(StoreError::AlreadyExists)
        ));

        // same name under a different parent is allowed
        let nested = Folder::new(owner, "Reports".to_string(), None, Some(folder.id));
        assert!(store.insert_folder(&nested).await.is_ok());
    }

    #[tokio::test]
    async fn test_template_delete_nulls_file_references() {
        use crate::template::models::{Template, TemplateType};

        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let template = Template::new(
            owner,
            "Proposal".to_string(),
            TemplateType::Proposal,
            None,
            "{{ a }}".to_string(),
            None,
            true,
        );
        store.insert_template(&template).await.unwrap();

        let file = FileRecord::generated(
            owner,
            "Proposal_new.pdf".to_string(),
            10,
            "Reports/Proposal_new.pdf".to_string(),
            Uuid::new_v4(),
            template.id,
            serde_json::json!({}),
        );
        store.insert_file(&file).await.unwrap();

        store.delete_template(&template.id).await.unwrap();

        let kept = store.get_file(&file.id, &owner).await.unwrap().unwrap();
        assert_eq!(kept.template_id, None);
        assert!(store.get_template(&template.id, &owner).await.unwrap().is_none());
    }
}
