use super::metrics::{self, JobTitleStat, ScoreBucket, StatusBreakdown};
use super::{ScreenContext, ViewState};
use crate::api::{AtsScoreListParams, TemplateListParams, TransactionListParams};
use crate::cache::Resource;
use crate::errors::ApiError;
use crate::models::{
    AtsScore, JobTitleSynonym, KeywordMatches, OptimizationSuggestions, Paginated, Template,
    Transaction,
};

const TOP_JOB_TITLES: usize = 5;
const LEADERBOARD_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct AnalyticsView {
    pub scores_on_page: usize,
    pub distribution: Vec<ScoreBucket>,
    pub avg_score: Option<f64>,
    pub top_job_titles: Vec<JobTitleStat>,
    pub template_leaderboard: Vec<Template>,
    pub transactions: Vec<StatusBreakdown>,
    pub revenue: f64,
}

/// One ATS score with the backend's analysis of it.
#[derive(Debug, Clone)]
pub struct ScoreDetails {
    pub score: AtsScore,
    pub suggestions: OptimizationSuggestions,
    pub keywords: KeywordMatches,
}

pub struct AnalyticsScreen {
    ctx: ScreenContext,
    pub filters: AtsScoreListParams,
}

impl AnalyticsScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            filters: AtsScoreListParams::default(),
        }
    }

    pub fn with_filters(mut self, filters: AtsScoreListParams) -> Self {
        self.filters = filters;
        self
    }

    pub async fn load(&self) -> ViewState<AnalyticsView> {
        let (scores, templates, transactions) =
            tokio::join!(self.scores(), self.templates(), self.transactions());
        let result = match (scores, templates, transactions) {
            (Ok(scores), Ok(templates), Ok(transactions)) => {
                Ok(summarize(&scores, &templates, &transactions))
            }
            (Err(e), ..) | (_, Err(e), _) | (.., Err(e)) => Err(e),
        };
        ViewState::from_result(
            result,
            |v| v.scores_on_page == 0,
            "No ATS scores match the current filters",
        )
    }

    pub async fn score_details(&self, id: i64) -> Result<ScoreDetails, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(Resource::AtsScores, format!("details={id}"), move || {
                let client = client.clone();
                async move {
                    let (score, suggestions, keywords) = tokio::try_join!(
                        client.get_ats_score(id),
                        client.optimization_suggestions(id),
                        client.keyword_matches(id),
                    )?;
                    Ok(ScoreDetails {
                        score,
                        suggestions,
                        keywords,
                    })
                }
            })
            .await
    }

    pub async fn synonyms(&self, search: Option<&str>) -> ViewState<Paginated<JobTitleSynonym>> {
        let client = self.ctx.client.clone();
        let search = search.map(str::to_string);
        let key = format!("synonyms:{}", search.as_deref().unwrap_or_default());
        let result = self
            .ctx
            .cached(Resource::AtsScores, key, move || {
                let client = client.clone();
                let search = search.clone();
                async move { client.job_title_synonyms(search.as_deref()).await }
            })
            .await;
        ViewState::from_result(result, Paginated::is_empty, "No synonyms found")
    }

    async fn scores(&self) -> Result<Paginated<AtsScore>, ApiError> {
        let client = self.ctx.client.clone();
        let params = self.filters.clone();
        self.ctx
            .cached(Resource::AtsScores, params.to_query().fingerprint(), move || {
                let client = client.clone();
                let params = params.clone();
                async move { client.list_ats_scores(&params).await }
            })
            .await
    }

    async fn templates(&self) -> Result<Paginated<Template>, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(
                Resource::Templates,
                TemplateListParams::default().to_query().fingerprint(),
                move || {
                    let client = client.clone();
                    async move { client.list_templates(&TemplateListParams::default()).await }
                },
            )
            .await
    }

    async fn transactions(&self) -> Result<Paginated<Transaction>, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(
                Resource::Transactions,
                TransactionListParams::default().to_query().fingerprint(),
                move || {
                    let client = client.clone();
                    async move {
                        client
                            .list_transactions(&TransactionListParams::default())
                            .await
                    }
                },
            )
            .await
    }
}

pub fn summarize(
    scores: &Paginated<AtsScore>,
    templates: &Paginated<Template>,
    transactions: &Paginated<Transaction>,
) -> AnalyticsView {
    AnalyticsView {
        scores_on_page: scores.results.len(),
        distribution: metrics::score_distribution(&scores.results),
        avg_score: metrics::average(scores.results.iter().map(|s| s.score)),
        top_job_titles: metrics::top_job_titles(&scores.results, TOP_JOB_TITLES),
        template_leaderboard: metrics::usage_leaderboard(&templates.results, LEADERBOARD_SIZE),
        transactions: metrics::transaction_breakdown(&transactions.results),
        revenue: metrics::revenue(&transactions.results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryCache;
    use crate::testing::{signed_in_client, spawn_backend, MockBackend};

    async fn screen(backend: &MockBackend) -> AnalyticsScreen {
        let client = signed_in_client(spawn_backend(backend.clone()).await).await;
        AnalyticsScreen::new(ScreenContext::new(client, QueryCache::new()))
    }

    #[tokio::test]
    async fn test_seeded_analytics() {
        let backend = MockBackend::seeded();
        let view = screen(&backend).await.load().await;
        let view = view.ready().unwrap();

        let counts: Vec<usize> = view.distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 1, 1]);
        assert_eq!(view.avg_score, Some(70.5));
        assert_eq!(view.top_job_titles[0].job_title, "Data Engineer");
        assert_eq!(view.top_job_titles[0].count, 2);
        assert_eq!(view.top_job_titles[0].avg_score, 86.5);
        let names: Vec<&str> = view
            .template_leaderboard
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["Modern", "Canvas", "Studio"]);
        assert_eq!(view.revenue, 24.0);
    }

    #[tokio::test]
    async fn test_min_score_filter_is_sent() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await.with_filters(AtsScoreListParams {
            min_score: Some(75.0),
            ..Default::default()
        });
        let view = screen.load().await;
        assert_eq!(view.ready().unwrap().scores_on_page, 2);
        let sent = backend
            .requests()
            .into_iter()
            .find(|r| r.path == "/ats/scores/")
            .unwrap();
        assert_eq!(sent.query.as_deref(), Some("min_score=75"));
    }

    #[tokio::test]
    async fn test_score_details_combines_three_reads() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        let scores = screen.scores().await.unwrap();
        let id = scores.results[0].id;
        let details = screen.score_details(id).await.unwrap();
        assert_eq!(details.score.id, id);
        assert_eq!(details.suggestions.suggestions.len(), 1);
        assert_eq!(details.keywords.missing, vec!["Airflow"]);
    }

    #[tokio::test]
    async fn test_unknown_score_is_not_found() {
        let backend = MockBackend::seeded();
        let err = screen(&backend).await.score_details(999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_synonym_lookup() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        let found = screen.synonyms(Some("software")).await;
        assert_eq!(found.ready().unwrap().results[0].synonyms.len(), 2);
        assert!(matches!(
            screen.synonyms(Some("astronaut")).await,
            ViewState::Empty(_)
        ));
    }
}
