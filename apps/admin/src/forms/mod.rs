//! Client-side validation and payload shaping for the admin forms. Nothing
//! is sent to the server until a form validates.

pub mod category;
pub mod plan;
pub mod template;

use std::collections::BTreeMap;
use std::fmt;

pub use category::CategoryForm;
pub use plan::PlanForm;
pub use template::TemplateForm;

/// Field name → first failing rule's message, for inline display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, String>,
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FormErrors {}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the first message per field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn require(&mut self, field: &'static str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" modern, ,clean ,ats-friendly,"),
            vec!["modern", "clean", "ats-friendly"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_first_message_wins() {
        let mut errors = FormErrors::new();
        errors.add("name", "Name is required");
        errors.add("name", "Name is too long");
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.to_string(), "name: Name is required");
    }
}
