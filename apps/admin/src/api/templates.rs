use super::query::{QueryParams, TemplateListParams};
use super::ApiClient;
use crate::errors::ApiError;
use crate::models::{
    CategoryPayload, NewTemplate, Paginated, Template, TemplateCategory, TemplatePatch,
};

impl ApiClient {
    /// GET /templates/
    pub async fn list_templates(
        &self,
        params: &TemplateListParams,
    ) -> Result<Paginated<Template>, ApiError> {
        self.get("/templates/", &params.to_query()).await
    }

    /// GET /templates/{id}/
    pub async fn get_template(&self, id: i64) -> Result<Template, ApiError> {
        self.get(&format!("/templates/{id}/"), &QueryParams::new())
            .await
    }

    /// POST /templates/
    pub async fn create_template(&self, template: &NewTemplate) -> Result<Template, ApiError> {
        self.post("/templates/", template).await
    }

    /// PATCH /templates/{id}/
    pub async fn update_template(
        &self,
        id: i64,
        patch: &TemplatePatch,
    ) -> Result<Template, ApiError> {
        self.patch(&format!("/templates/{id}/"), patch).await
    }

    /// DELETE /templates/{id}/
    pub async fn delete_template(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/templates/{id}/")).await
    }

    /// GET /templates/categories/
    pub async fn list_categories(&self) -> Result<Paginated<TemplateCategory>, ApiError> {
        self.get("/templates/categories/", &QueryParams::new())
            .await
    }

    /// GET /templates/categories/{id}/
    pub async fn get_category(&self, id: i64) -> Result<TemplateCategory, ApiError> {
        self.get(&format!("/templates/categories/{id}/"), &QueryParams::new())
            .await
    }

    /// POST /templates/categories/
    pub async fn create_category(
        &self,
        category: &CategoryPayload,
    ) -> Result<TemplateCategory, ApiError> {
        self.post("/templates/categories/", category).await
    }

    /// PUT /templates/categories/{id}/
    pub async fn update_category(
        &self,
        id: i64,
        category: &CategoryPayload,
    ) -> Result<TemplateCategory, ApiError> {
        self.put(&format!("/templates/categories/{id}/"), category)
            .await
    }

    /// DELETE /templates/categories/{id}/
    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/templates/categories/{id}/")).await
    }
}
