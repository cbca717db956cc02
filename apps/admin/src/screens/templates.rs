use super::metrics;
use super::{Confirm, Notification, ScreenContext, ViewState};
use crate::api::TemplateListParams;
use crate::cache::Resource;
use crate::errors::ApiError;
use crate::forms::{CategoryForm, FormErrors, TemplateForm};
use crate::models::{Paginated, Template, TemplateCategory, TemplatePatch};

#[derive(Debug, Clone)]
pub struct TemplatesView {
    pub page: Paginated<Template>,
    pub premium_on_page: usize,
    pub featured_on_page: usize,
    pub avg_ats_score: Option<f64>,
    pub total_usage: u64,
}

pub struct TemplatesScreen {
    ctx: ScreenContext,
    pub filters: TemplateListParams,
}

impl TemplatesScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            filters: TemplateListParams::default(),
        }
    }

    pub fn with_filters(mut self, filters: TemplateListParams) -> Self {
        self.filters = filters;
        self
    }

    pub async fn load(&self) -> ViewState<TemplatesView> {
        let client = self.ctx.client.clone();
        let params = self.filters.clone();
        let result = self
            .ctx
            .cached(Resource::Templates, params.to_query().fingerprint(), move || {
                let client = client.clone();
                let params = params.clone();
                async move { client.list_templates(&params).await }
            })
            .await
            .map(|page| TemplatesView {
                premium_on_page: page.results.iter().filter(|t| t.is_premium).count(),
                featured_on_page: page.results.iter().filter(|t| t.is_featured).count(),
                avg_ats_score: metrics::average(page.results.iter().map(|t| t.avg_ats_score)),
                total_usage: page.results.iter().map(|t| t.usage_count).sum(),
                page,
            });
        ViewState::from_result(
            result,
            |v| v.page.is_empty(),
            "No templates match the current filters",
        )
    }

    /// Single template, e.g. for the preview. Shares the templates cache.
    pub async fn template(&self, id: i64) -> Result<Template, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(Resource::Templates, format!("id={id}"), move || {
                let client = client.clone();
                async move { client.get_template(id).await }
            })
            .await
    }

    /// Drops cached template reads and fetches `id` again.
    pub async fn reload_template(&self, id: i64) -> Result<Template, ApiError> {
        self.ctx.cache.invalidate(Resource::Templates);
        self.template(id).await
    }

    pub async fn categories(&self) -> ViewState<Paginated<TemplateCategory>> {
        let client = self.ctx.client.clone();
        let result = self
            .ctx
            .cached(Resource::Categories, "", move || {
                let client = client.clone();
                async move { client.list_categories().await }
            })
            .await;
        ViewState::from_result(result, Paginated::is_empty, "No categories yet")
    }

    pub async fn category(&self, id: i64) -> Result<TemplateCategory, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(Resource::Categories, format!("id={id}"), move || {
                let client = client.clone();
                async move { client.get_category(id).await }
            })
            .await
    }

    /// Creates a template, or updates `editing` when set. Form errors are
    /// returned before anything is sent.
    pub async fn submit(
        &self,
        form: &TemplateForm,
        editing: Option<i64>,
    ) -> Result<Notification, FormErrors> {
        let payload = form.validate()?;
        let name = payload.name.clone();
        let notification = match editing {
            Some(id) => {
                let patch = TemplatePatch::from(payload);
                self.ctx
                    .mutate(
                        // the category may have changed
                        &[Resource::Templates, Resource::Categories],
                        format!("Template {name} updated"),
                        self.ctx.client.update_template(id, &patch),
                    )
                    .await
            }
            None => {
                self.ctx
                    .mutate(
                        // category template counts change too
                        &[Resource::Templates, Resource::Categories],
                        format!("Template {name} created"),
                        self.ctx.client.create_template(&payload),
                    )
                    .await
            }
        };
        Ok(notification)
    }

    pub async fn delete(&self, id: i64, confirm: &dyn Confirm) -> Option<Notification> {
        self.ctx
            .confirmed(
                confirm,
                &format!("Delete template {id}? Resumes using it keep their copy."),
                &[Resource::Templates, Resource::Categories],
                format!("Template {id} deleted"),
                self.ctx.client.delete_template(id),
            )
            .await
    }

    pub async fn submit_category(
        &self,
        form: &CategoryForm,
        editing: Option<i64>,
    ) -> Result<Notification, FormErrors> {
        let payload = form.validate()?;
        let notification = match editing {
            Some(id) => {
                self.ctx
                    .mutate(
                        &[Resource::Categories],
                        format!("Category {} updated", payload.name),
                        self.ctx.client.update_category(id, &payload),
                    )
                    .await
            }
            None => {
                self.ctx
                    .mutate(
                        &[Resource::Categories],
                        format!("Category {} created", payload.name),
                        self.ctx.client.create_category(&payload),
                    )
                    .await
            }
        };
        Ok(notification)
    }

    pub async fn delete_category(&self, id: i64, confirm: &dyn Confirm) -> Option<Notification> {
        self.ctx
            .confirmed(
                confirm,
                &format!("Delete category {id}?"),
                &[Resource::Categories],
                format!("Category {id} deleted"),
                self.ctx.client.delete_category(id),
            )
            .await
    }
}
