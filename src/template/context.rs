//! Rendering-context construction.
//!
//! Merges the cleaned submission, list-to-array conversions, and the three
//! decorative-image URLs resolved from the owner's storage prefix into one
//! name-to-value mapping for substitution.

use log::warn;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::storage::ObjectStorage;
use super::fields::{FOOTER_IMAGE_FIELD, HEADER_IMAGE_FIELD, WATERMARK_FIELD};

/// Validity window for decorative-image signed URLs.
pub const DECORATION_URL_TTL_SECS: u32 = 600;

/// Convert list-field submissions to ordered arrays (one item per non-blank
/// line, trimmed) and inject the decorative-image URLs. Injected keys always
/// overwrite same-named user input; a decoration missing from storage is not
/// fatal and resolves to an empty URL.
pub async fn build_context(
    mut values: Map<String, Value>,
    list_fields: &HashSet<String>,
    storage: &Arc<dyn ObjectStorage + Send + Sync>,
    owner_id: &Uuid,
) -> Map<String, Value> {
    for name in list_fields {
        let lines = match values.get(name) {
            Some(Value::String(raw)) => raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Value::String(line.to_string()))
                .collect::<Vec<_>>(),
            _ => continue,
        };
        values.insert(name.clone(), Value::Array(lines));
    }

    let decorations = [
        (HEADER_IMAGE_FIELD, format!("{}/header.png", owner_id)),
        (FOOTER_IMAGE_FIELD, format!("{}/footer.png", owner_id)),
        (WATERMARK_FIELD, format!("{}/watermark.png", owner_id)),
    ];
    for (key, path) in decorations {
        let url = match storage.signed_url(&path, DECORATION_URL_TTL_SECS).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed to sign decorative image {}: {}", path, e);
                String::new()
            }
        };
        values.insert(key.to_string(), Value::String(url));
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StorageObject};
    use async_trait::async_trait;
    use serde_json::json;

    struct StubStorage {
        fail_signing: bool,
    }

    #[async_trait]
    impl ObjectStorage for StubStorage {
        async fn upload(
            &self,
            path: &str,
            _content: &[u8],
            _content_type: &str,
        ) -> Result<String, StorageError> {
            Ok(path.to_string())
        }

        async fn signed_url(
            &self,
            path: &str,
            expires_in_secs: u32,
        ) -> Result<String, StorageError> {
            if self.fail_signing {
                return Err(StorageError::Response {
                    status: 404,
                    body: "Object not found".to_string(),
                });
            }
            Ok(format!("https://storage.test/{}?expires={}", path, expires_in_secs))
        }

        async fn delete(&self, _path: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn list(&self, _prefix: &str) -> Result<Vec<StorageObject>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn stub(fail_signing: bool) -> Arc<dyn ObjectStorage + Send + Sync> {
        Arc::new(StubStorage { fail_signing })
    }

    #[tokio::test]
    async fn test_list_values_split_into_trimmed_lines() {
        let mut values = Map::new();
        values.insert("items".to_string(), json!("a\n\nb\n  \nc"));
        let list_fields: HashSet<String> = ["items".to_string()].into_iter().collect();

        let context = build_context(values, &list_fields, &stub(false), &Uuid::new_v4()).await;
        assert_eq!(context.get("items"), Some(&json!(["a", "b", "c"])));
    }

    #[tokio::test]
    async fn test_non_string_list_values_pass_through() {
        let mut values = Map::new();
        values.insert("items".to_string(), json!(["already", "split"]));
        let list_fields: HashSet<String> = ["items".to_string()].into_iter().collect();

        let context = build_context(values, &list_fields, &stub(false), &Uuid::new_v4()).await;
        assert_eq!(context.get("items"), Some(&json!(["already", "split"])));
    }

    #[tokio::test]
    async fn test_injected_urls_overwrite_user_input() {
        let owner = Uuid::new_v4();
        let mut values = Map::new();
        values.insert("header_image_url".to_string(), json!("javascript:alert(1)"));

        let context = build_context(values, &HashSet::new(), &stub(false), &owner).await;
        let expected = format!("https://storage.test/{}/header.png?expires=600", owner);
        assert_eq!(context.get("header_image_url"), Some(&json!(expected)));
        assert!(context.contains_key("footer_image_url"));
        assert!(context.contains_key("watermark_url"));
    }

    #[tokio::test]
    async fn test_signing_failure_is_not_fatal() {
        let context =
            build_context(Map::new(), &HashSet::new(), &stub(true), &Uuid::new_v4()).await;
        assert_eq!(context.get("header_image_url"), Some(&json!("")));
        assert_eq!(context.get("watermark_url"), Some(&json!("")));
    }
}
