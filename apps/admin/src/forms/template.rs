use super::{split_list, FormErrors};
use crate::models::{NewTemplate, Template};

/// Raw template form input, as typed by the operator.
#[derive(Debug, Clone, Default)]
pub struct TemplateForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub html_structure: String,
    pub css_styles: String,
    /// Comma separated.
    pub tags: String,
    pub is_premium: bool,
    pub is_featured: bool,
    pub thumbnail: String,
}

impl TemplateForm {
    /// Pre-fills the form for editing.
    pub fn from_template(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            description: template.description.clone(),
            category: template.category.clone(),
            html_structure: template.html_structure.clone().unwrap_or_default(),
            css_styles: template.css_styles.clone().unwrap_or_default(),
            tags: template.tags.join(", "),
            is_premium: template.is_premium,
            is_featured: template.is_featured,
            thumbnail: template.thumbnail.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<NewTemplate, FormErrors> {
        let mut errors = FormErrors::new();
        errors.require("name", &self.name, "Template name is required");
        errors.require("description", &self.description, "Description is required");
        errors.require("category", &self.category, "Category is required");
        errors.require("html_structure", &self.html_structure, "HTML structure is required");
        errors.require("css_styles", &self.css_styles, "CSS styles are required");

        let thumbnail = self.thumbnail.trim();
        errors.into_result(NewTemplate {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            html_structure: self.html_structure.clone(),
            css_styles: self.css_styles.clone(),
            tags: split_list(&self.tags),
            is_premium: self.is_premium,
            is_featured: self.is_featured,
            thumbnail: (!thumbnail.is_empty()).then(|| thumbnail.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TemplateForm {
        TemplateForm {
            name: " Modern ".into(),
            description: "Clean single column".into(),
            category: "Professional".into(),
            html_structure: "<h1>{{name}}</h1>".into(),
            css_styles: "h1 { font-size: 2rem; }".into(),
            tags: "clean, ats-friendly, ".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_shapes_payload() {
        let payload = filled().validate().unwrap();
        assert_eq!(payload.name, "Modern");
        assert_eq!(payload.tags, vec!["clean", "ats-friendly"]);
        assert!(payload.thumbnail.is_none());
        assert!(!payload.is_premium);
    }

    #[test]
    fn test_required_fields() {
        let errors = TemplateForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Template name is required"));
        assert_eq!(errors.get("html_structure"), Some("HTML structure is required"));
        assert_eq!(errors.get("css_styles"), Some("CSS styles are required"));
        assert!(errors.get("tags").is_none());
    }
}
