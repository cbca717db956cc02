use super::query::{AtsScoreListParams, QueryParams};
use super::ApiClient;
use crate::errors::ApiError;
use crate::models::{AtsScore, JobTitleSynonym, KeywordMatches, OptimizationSuggestions, Paginated};

impl ApiClient {
    /// GET /ats/scores/
    pub async fn list_ats_scores(
        &self,
        params: &AtsScoreListParams,
    ) -> Result<Paginated<AtsScore>, ApiError> {
        self.get("/ats/scores/", &params.to_query()).await
    }

    /// GET /ats/scores/{id}/
    pub async fn get_ats_score(&self, id: i64) -> Result<AtsScore, ApiError> {
        self.get(&format!("/ats/scores/{id}/"), &QueryParams::new())
            .await
    }

    /// GET /ats/scores/{id}/optimization_suggestions/
    pub async fn optimization_suggestions(
        &self,
        id: i64,
    ) -> Result<OptimizationSuggestions, ApiError> {
        self.get(
            &format!("/ats/scores/{id}/optimization_suggestions/"),
            &QueryParams::new(),
        )
        .await
    }

    /// GET /ats/scores/{id}/keyword_matches/
    pub async fn keyword_matches(&self, id: i64) -> Result<KeywordMatches, ApiError> {
        self.get(
            &format!("/ats/scores/{id}/keyword_matches/"),
            &QueryParams::new(),
        )
        .await
    }

    /// GET /ats/job-title-synonyms/
    pub async fn job_title_synonyms(
        &self,
        search: Option<&str>,
    ) -> Result<Paginated<JobTitleSynonym>, ApiError> {
        self.get(
            "/ats/job-title-synonyms/",
            &QueryParams::new().search(search),
        )
        .await
    }
}
