#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use easydocs_server::db::memory::MemoryStore;
use easydocs_server::db::AppState;
use easydocs_server::render::{PdfRenderer, RenderError};
use easydocs_server::storage::{ObjectStorage, StorageError, StorageObject};

/// Recording in-memory storage gateway.
#[derive(Default)]
pub struct MockObjectStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deleted_paths: Mutex<Vec<String>>,
    pub fail_deletes: bool,
    pub fail_signing: bool,
    pub fail_uploads: bool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn insert_object(&self, path: &str, content: &[u8]) {
        self.objects.lock().insert(path.to_string(), content.to_vec());
    }

    pub fn has_object(&self, path: &str) -> bool {
        self.objects.lock().contains_key(path)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    /// Every path a delete was attempted for, in call order.
    pub fn deleted_paths(&self) -> Vec<String> {
        self.deleted_paths.lock().clone()
    }

    fn response_error() -> StorageError {
        StorageError::Response {
            status: 503,
            body: "storage unavailable".to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn upload(
        &self,
        path: &str,
        content: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail_uploads {
            return Err(Self::response_error());
        }
        self.insert_object(path, content);
        Ok(path.to_string())
    }

    async fn signed_url(&self, path: &str, expires_in_secs: u32) -> Result<String, StorageError> {
        if self.fail_signing {
            return Err(StorageError::Response {
                status: 404,
                body: "Object not found".to_string(),
            });
        }
        Ok(format!(
            "https://storage.test/sign/{}?expires={}",
            path, expires_in_secs
        ))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.deleted_paths.lock().push(path.to_string());
        if self.fail_deletes {
            return Err(Self::response_error());
        }
        self.objects.lock().remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StorageObject>, StorageError> {
        let objects = self.objects.lock();
        Ok(objects
            .keys()
            .filter_map(|path| {
                path.strip_prefix(prefix).map(|name| StorageObject {
                    name: name.to_string(),
                })
            })
            .collect())
    }
}

/// Renderer returning deterministic bytes without invoking WeasyPrint.
pub struct FakePdfRenderer;

impl PdfRenderer for FakePdfRenderer {
    fn render_pdf(&self, html: &str, _base_dir: &Path) -> Result<Vec<u8>, RenderError> {
        Ok(format!("%PDF-FAKE\n{}", html).into_bytes())
    }
}

/// Renderer that always fails, as a crashed WeasyPrint would.
pub struct FailingPdfRenderer;

impl PdfRenderer for FailingPdfRenderer {
    fn render_pdf(&self, _html: &str, _base_dir: &Path) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::RendererExit(1))
    }
}

pub fn test_state(storage: Arc<MockObjectStorage>) -> AppState {
    AppState::with_components(
        Arc::new(MemoryStore::new()),
        storage,
        Arc::new(FakePdfRenderer),
    )
}

pub fn test_state_with_renderer(
    storage: Arc<MockObjectStorage>,
    renderer: Arc<dyn PdfRenderer + Send + Sync>,
) -> AppState {
    AppState::with_components(Arc::new(MemoryStore::new()), storage, renderer)
}
