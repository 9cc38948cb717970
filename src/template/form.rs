//! Schema-driven entry form.
//!
//! The discovered field list becomes a small ordered descriptor consumed
//! generically: clients render inputs from it, submissions are validated
//! against exactly this field set, and rebuilding it from the same template
//! text always yields the same schema.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use utoipa::ToSchema;

use super::fields::{extract_fields, extract_list_fields};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text input bound to one string value.
    Scalar,
    /// Multi-line text input, one item per line.
    List,
}

#[derive(Debug, Serialize, Clone, PartialEq, ToSchema)]
pub struct FieldSpec {
    #[schema(example = "client_name")]
    pub name: String,
    pub kind: FieldKind,
    #[schema(example = "Client name")]
    pub label: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, ToSchema)]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct FieldError {
    #[schema(example = "client_name")]
    pub field: String,
    #[schema(example = "Client name must be submitted as text")]
    pub message: String,
}

/// Collection of field-level validation errors.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Mechanical label: underscores become spaces, first letter upper-cased.
fn label_for(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

impl FormSchema {
    /// Build the entry-form schema for a template body. Deterministic: the
    /// same text always produces the same ordered field list.
    pub fn from_html(html: &str) -> Self {
        let list_fields: HashSet<String> = extract_list_fields(html).into_iter().collect();
        let fields = extract_fields(html)
            .into_iter()
            .map(|name| {
                let kind = if list_fields.contains(&name) {
                    FieldKind::List
                } else {
                    FieldKind::Scalar
                };
                let label = label_for(&name);
                FieldSpec { name, kind, label }
            })
            .collect();
        Self { fields }
    }

    pub fn list_field_names(&self) -> HashSet<String> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::List)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Validate a submission against exactly this field set: unknown keys are
    /// ignored, missing fields default to the empty string, every field is
    /// optional. A non-string value for a known field is a field error.
    pub fn clean(&self, submitted: &Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
        let mut cleaned = Map::new();
        let mut errors = ValidationErrors::new();
        for spec in &self.fields {
            match submitted.get(&spec.name) {
                None | Some(Value::Null) => {
                    cleaned.insert(spec.name.clone(), Value::String(String::new()));
                }
                Some(Value::String(text)) => {
                    cleaned.insert(spec.name.clone(), Value::String(text.clone()));
                }
                Some(_) => {
                    errors.add(
                        &spec.name,
                        format!("{} must be submitted as text", spec.label),
                    );
                }
            }
        }
        errors.into_result(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HTML: &str =
        "Dear {{ client_name }}, {% for line in service_items %}{{ line }}{% endfor %}";

    #[test]
    fn test_schema_kinds_and_labels() {
        let schema = FormSchema::from_html(HTML);
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].name, "client_name");
        assert_eq!(schema.fields[0].kind, FieldKind::Scalar);
        assert_eq!(schema.fields[0].label, "Client name");
        assert_eq!(schema.fields[1].name, "service_items");
        assert_eq!(schema.fields[1].kind, FieldKind::List);
        assert_eq!(schema.fields[1].label, "Service items");
    }

    #[test]
    fn test_schema_construction_is_idempotent() {
        assert_eq!(FormSchema::from_html(HTML), FormSchema::from_html(HTML));
    }

    #[test]
    fn test_unicode_label_capitalisation() {
        let schema = FormSchema::from_html("{{ número_da_proposta }}");
        assert_eq!(schema.fields[0].label, "Número da proposta");
    }

    #[test]
    fn test_clean_defaults_missing_and_ignores_unknown() {
        let schema = FormSchema::from_html(HTML);
        let mut submitted = Map::new();
        submitted.insert("client_name".to_string(), json!("Ana"));
        submitted.insert("not_a_field".to_string(), json!("ignored"));

        let cleaned = schema.clean(&submitted).unwrap();
        assert_eq!(cleaned.get("client_name"), Some(&json!("Ana")));
        assert_eq!(cleaned.get("service_items"), Some(&json!("")));
        assert!(!cleaned.contains_key("not_a_field"));
    }

    #[test]
    fn test_clean_rejects_non_string_values() {
        let schema = FormSchema::from_html(HTML);
        let mut submitted = Map::new();
        submitted.insert("client_name".to_string(), json!(42));

        let errors = schema.clean(&submitted).unwrap_err();
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(errors.errors[0].field, "client_name");
    }
}
