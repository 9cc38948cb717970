use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category label on a template, used to select a naming policy.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TemplateType {
    Contract,
    Report,
    Proposal,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema, sqlx::FromRow)]
pub struct Template {
    #[schema(example = "f1e2d3c4-b5a6-7890-1234-567890abcdef")]
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Proposal")]
    pub name: String,
    pub template_type: TemplateType,
    pub description: Option<String>,
    #[schema(example = "<p>Dear {{ client_name }},</p>")]
    pub html_content: String,
    pub css_content: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: Uuid,
        name: String,
        template_type: TemplateType,
        description: Option<String>,
        html_content: String,
        css_content: Option<String>,
        is_active: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            template_type,
            description,
            html_content,
            css_content,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    #[schema(example = "Proposal")]
    pub name: String,
    pub template_type: TemplateType,
    pub description: Option<String>,
    #[schema(example = "<p>Dear {{ client_name }},</p>")]
    pub html_content: String,
    pub css_content: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub template_type: Option<TemplateType>,
    pub description: Option<String>,
    pub html_content: Option<String>,
    pub css_content: Option<String>,
    pub is_active: Option<bool>,
}
