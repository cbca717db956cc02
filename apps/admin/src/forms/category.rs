use super::FormErrors;
use crate::models::CategoryPayload;

#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<CategoryPayload, FormErrors> {
        let mut errors = FormErrors::new();
        errors.require("name", &self.name, "Category name is required");
        errors.require("description", &self.description, "Description is required");
        errors.into_result(CategoryPayload {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}
