use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::decimal;

/// A resume template. `category` is the category NAME as the API
/// denormalizes it, not a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub html_structure: Option<String>,
    #[serde(default)]
    pub css_styles: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default, deserialize_with = "decimal")]
    pub avg_ats_score: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub category: String,
    pub html_structure: String,
    pub css_styles: String,
    pub tags: Vec<String>,
    pub is_premium: bool,
    pub is_featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_structure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_styles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl From<NewTemplate> for TemplatePatch {
    fn from(t: NewTemplate) -> Self {
        TemplatePatch {
            name: Some(t.name),
            description: Some(t.description),
            category: Some(t.category),
            html_structure: Some(t.html_structure),
            css_styles: Some(t.css_styles),
            tags: Some(t.tags),
            is_premium: Some(t.is_premium),
            is_featured: Some(t.is_featured),
            thumbnail: t.thumbnail,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Computed server-side; never sent back.
    #[serde(default)]
    pub template_count: u64,
}

/// Create/update body for a category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPayload {
    pub name: String,
    pub description: String,
}
