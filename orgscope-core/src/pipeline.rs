//! Result pipeline: search every organization, fetch each hit, extract its
//! context window, attach an explanation, then merge and sort.
//!
//! A run walks `Idle → Searching → FetchingContent → Extracting → Explaining
//! → Aggregated → Sorted → Delivered`. Only a search failure ends it early;
//! a hit that cannot be fetched or has no matching line is skipped.

use std::fmt;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::context::ContextExtractor;
use crate::credentials::{load_credentials, CredentialStore};
use crate::error::{PipelineError, Result, SearchError};
use crate::explain::{Explainer, GeminiExplainer};
use crate::fetch::{ContentFetcher, RawContentClient};
use crate::search::{CodeSearch, GitHubSearchClient, MISSING_TOKEN_MESSAGE};
use crate::types::{AnnotatedResult, RunReport, SearchHit, SkipReason, SkippedHit};

/// Stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Searching,
    FetchingContent,
    Extracting,
    Explaining,
    Aggregated,
    Sorted,
    Delivered,
    Failed,
    Skipped,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Idle => "idle",
            RunStage::Searching => "searching",
            RunStage::FetchingContent => "fetching_content",
            RunStage::Extracting => "extracting",
            RunStage::Explaining => "explaining",
            RunStage::Aggregated => "aggregated",
            RunStage::Sorted => "sorted",
            RunStage::Delivered => "delivered",
            RunStage::Failed => "failed",
            RunStage::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Move import-containing results after all others, keeping relative order
/// within each group.
pub fn sort_results(results: &mut [AnnotatedResult]) {
    // sort_by_key is stable; false orders before true
    results.sort_by_key(AnnotatedResult::is_import);
}

/// Orchestrates one keyword search across the configured organizations.
pub struct ResultPipeline {
    config: PipelineConfig,
    store: Arc<dyn CredentialStore>,
    search: Arc<dyn CodeSearch>,
    fetcher: Arc<dyn ContentFetcher>,
    explainer: Arc<dyn Explainer>,
}

impl ResultPipeline {
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn CredentialStore>,
        search: Arc<dyn CodeSearch>,
        fetcher: Arc<dyn ContentFetcher>,
        explainer: Arc<dyn Explainer>,
    ) -> Self {
        Self {
            config,
            store,
            search,
            fetcher,
            explainer,
        }
    }

    /// Pipeline wired to the GitHub, raw-content and Gemini HTTP clients.
    pub fn with_http_clients(config: PipelineConfig, store: Arc<dyn CredentialStore>) -> Self {
        let search = GitHubSearchClient::new(config.search.clone(), config.raw_url.clone());
        let explainer = GeminiExplainer::new(
            config.explain.clone(),
            config.organizations.clone(),
            config.search.language.clone(),
        );
        Self::new(
            config,
            store,
            Arc::new(search),
            Arc::new(RawContentClient::new()),
            Arc::new(explainer),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline and return the sorted results.
    pub async fn run(&self, keyword: &str) -> Result<Vec<AnnotatedResult>> {
        Ok(self.run_with_report(keyword).await?.results)
    }

    /// Run the pipeline and also report which hits were skipped and why.
    pub async fn run_with_report(&self, keyword: &str) -> Result<RunReport> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(PipelineError::EmptyKeyword);
        }
        let extractor = ContextExtractor::new(keyword).ok_or(PipelineError::EmptyKeyword)?;

        tracing::debug!(stage = %RunStage::Idle, "Starting run for '{}'", keyword);
        let credentials = load_credentials(self.store.as_ref())?;
        let token = credentials.search_token.unwrap_or_default();
        let api_key = credentials.explanation_api_key;

        let mut report = RunReport {
            keyword: keyword.to_string(),
            ..RunReport::default()
        };

        for organization in &self.config.organizations {
            tracing::debug!(stage = %RunStage::Searching, org = %organization);
            let hits = self
                .search_organization(organization, keyword, &token)
                .await
                .map_err(|source| {
                    tracing::debug!(stage = %RunStage::Failed, org = %organization, "{}", source);
                    PipelineError::Search {
                        organization: organization.clone(),
                        source,
                    }
                })?;

            for hit in hits {
                match self
                    .annotate(&hit, keyword, &extractor, api_key.as_deref())
                    .await
                {
                    Ok(result) => report.results.push(result),
                    Err(reason) => {
                        tracing::warn!(
                            stage = %RunStage::Skipped,
                            "Skipping {}: {:?}",
                            hit.file_url,
                            reason
                        );
                        report.skipped.push(SkippedHit {
                            organization: organization.clone(),
                            file_url: hit.file_url,
                            reason,
                        });
                    }
                }
            }
        }

        tracing::debug!(stage = %RunStage::Aggregated, count = report.results.len());
        sort_results(&mut report.results);
        tracing::debug!(stage = %RunStage::Sorted);

        tracing::info!(
            "Run for '{}' delivered {} results ({} skipped)",
            keyword,
            report.results.len(),
            report.skipped.len()
        );
        tracing::debug!(stage = %RunStage::Delivered);
        Ok(report)
    }

    async fn search_organization(
        &self,
        organization: &str,
        keyword: &str,
        token: &str,
    ) -> std::result::Result<Vec<SearchHit>, SearchError> {
        if token.trim().is_empty() {
            return Err(SearchError::Auth(MISSING_TOKEN_MESSAGE.to_string()));
        }
        let mut hits = self.search.search(organization, keyword, token).await?;
        hits.truncate(self.config.search.max_results_per_org);
        Ok(hits)
    }

    async fn annotate(
        &self,
        hit: &SearchHit,
        keyword: &str,
        extractor: &ContextExtractor,
        api_key: Option<&str>,
    ) -> std::result::Result<AnnotatedResult, SkipReason> {
        tracing::debug!(stage = %RunStage::FetchingContent, url = %hit.raw_content_url);
        let content = self
            .fetcher
            .fetch(&hit.raw_content_url)
            .await
            .map_err(|e| SkipReason::FetchFailed(e.to_string()))?;

        tracing::debug!(stage = %RunStage::Extracting, url = %hit.file_url);
        let context = extractor.extract(&content).ok_or(SkipReason::NoContext)?;

        tracing::debug!(stage = %RunStage::Explaining, url = %hit.file_url);
        let explanation = self.explainer.explain(keyword, &context, api_key).await;

        Ok(AnnotatedResult {
            repo_name: hit.repo_full_name.clone(),
            file_url: hit.file_url.clone(),
            context,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{MemoryCredentialStore, EXPLANATION_KEY_KEY, SEARCH_TOKEN_KEY};
    use crate::error::FetchError;
    use crate::explain::MISSING_KEY_FALLBACK;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSearch {
        hits: HashMap<String, Vec<SearchHit>>,
        errors: HashMap<String, SearchError>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CodeSearch for FakeSearch {
        async fn search(
            &self,
            organization: &str,
            _keyword: &str,
            _token: &str,
        ) -> std::result::Result<Vec<SearchHit>, SearchError> {
            self.calls.lock().unwrap().push(organization.to_string());
            if let Some(err) = self.errors.get(organization) {
                return Err(err.clone());
            }
            Ok(self.hits.get(organization).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeFetcher {
        files: HashMap<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.files.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    struct EchoExplainer;

    #[async_trait]
    impl Explainer for EchoExplainer {
        async fn explain(&self, keyword: &str, _context: &str, api_key: Option<&str>) -> String {
            match api_key {
                Some(_) => format!("explains {}", keyword),
                None => MISSING_KEY_FALLBACK.to_string(),
            }
        }
    }

    fn hit(org: &str, name: &str) -> SearchHit {
        SearchHit {
            file_url: format!("https://github.com/{org}/repo/blob/main/{name}"),
            repo_full_name: format!("{org}/repo"),
            raw_content_url: format!("https://raw.githubusercontent.com/{org}/repo/main/{name}"),
        }
    }

    fn full_store() -> Arc<MemoryCredentialStore> {
        Arc::new(MemoryCredentialStore::with_entries([
            (SEARCH_TOKEN_KEY, "token"),
            (EXPLANATION_KEY_KEY, "key"),
        ]))
    }

    fn pipeline(
        store: Arc<MemoryCredentialStore>,
        search: Arc<FakeSearch>,
        fetcher: Arc<FakeFetcher>,
    ) -> ResultPipeline {
        ResultPipeline::new(
            PipelineConfig::default(),
            store,
            search,
            fetcher,
            Arc::new(EchoExplainer),
        )
    }

    fn result(context: &str) -> AnnotatedResult {
        AnnotatedResult {
            repo_name: "o/r".to_string(),
            file_url: format!("https://github.com/o/r/blob/main/{}", context.len()),
            context: context.to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_sort_moves_imports_last() {
        let mut results = vec![result("import x"), result("x()")];
        sort_results(&mut results);
        assert_eq!(results[0].context, "x()");
        assert_eq!(results[1].context, "import x");
    }

    #[test]
    fn test_sort_is_stable() {
        let mut results = vec![
            result("import a"),
            result("b()"),
            result("from c import d"),
            result("e()"),
            result("f()"),
        ];
        sort_results(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.context.as_str()).collect();
        assert_eq!(
            order,
            vec!["b()", "e()", "f()", "import a", "from c import d"]
        );
    }

    #[tokio::test]
    async fn test_empty_keyword_makes_no_calls() {
        let search = Arc::new(FakeSearch::default());
        let fetcher = Arc::new(FakeFetcher::default());
        let pipeline = pipeline(full_store(), search.clone(), fetcher.clone());

        let err = pipeline.run("   ").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyKeyword));
        assert!(search.calls.lock().unwrap().is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_token_aborts_before_any_request() {
        let store = Arc::new(MemoryCredentialStore::with_entries([(EXPLANATION_KEY_KEY, "key")]));
        let search = Arc::new(FakeSearch {
            hits: HashMap::from([("fastai".to_string(), vec![hit("fastai", "a.py")])]),
            ..FakeSearch::default()
        });
        let fetcher = Arc::new(FakeFetcher::default());
        let pipeline = pipeline(store, search.clone(), fetcher.clone());

        let err = pipeline.run("foo").await.unwrap_err();
        assert!(err.is_auth());
        assert!(search.calls.lock().unwrap().is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_failure_aborts_run() {
        let search = Arc::new(FakeSearch {
            hits: HashMap::from([("fastai".to_string(), vec![hit("fastai", "a.py")])]),
            errors: HashMap::from([(
                "AnswerDotAI".to_string(),
                SearchError::RateLimit("slow down".to_string()),
            )]),
            ..FakeSearch::default()
        });
        let fetcher = Arc::new(FakeFetcher {
            files: HashMap::from([(hit("fastai", "a.py").raw_content_url, "foo()".to_string())]),
            ..FakeFetcher::default()
        });
        let pipeline = pipeline(full_store(), search, fetcher);

        match pipeline.run("foo").await.unwrap_err() {
            PipelineError::Search {
                organization,
                source,
            } => {
                assert_eq!(organization, "AnswerDotAI");
                assert!(matches!(source, SearchError::RateLimit(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_skips_unfetchable_and_unmatched_hits() {
        let search = Arc::new(FakeSearch {
            hits: HashMap::from([(
                "fastai".to_string(),
                vec![
                    hit("fastai", "missing.py"),
                    hit("fastai", "nomatch.py"),
                    hit("fastai", "good.py"),
                ],
            )]),
            ..FakeSearch::default()
        });
        let fetcher = Arc::new(FakeFetcher {
            files: HashMap::from([
                (
                    hit("fastai", "nomatch.py").raw_content_url,
                    "nothing here".to_string(),
                ),
                (
                    hit("fastai", "good.py").raw_content_url,
                    "a\nfoo(1)\nb".to_string(),
                ),
            ]),
            ..FakeFetcher::default()
        });
        let pipeline = pipeline(full_store(), search, fetcher);

        let report = pipeline.run_with_report("foo").await.unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].context, "a\nfoo(1)\nb");
        assert_eq!(report.results[0].explanation, "explains foo");
        assert_eq!(report.results[0].repo_name, "fastai/repo");

        assert_eq!(report.skipped.len(), 2);
        assert!(matches!(report.skipped[0].reason, SkipReason::FetchFailed(_)));
        assert_eq!(report.skipped[1].reason, SkipReason::NoContext);
    }

    #[tokio::test]
    async fn test_missing_explanation_key_keeps_hit() {
        let store = Arc::new(MemoryCredentialStore::with_entries([(SEARCH_TOKEN_KEY, "token")]));
        let search = Arc::new(FakeSearch {
            hits: HashMap::from([("fastai".to_string(), vec![hit("fastai", "a.py")])]),
            ..FakeSearch::default()
        });
        let fetcher = Arc::new(FakeFetcher {
            files: HashMap::from([(hit("fastai", "a.py").raw_content_url, "foo()".to_string())]),
            ..FakeFetcher::default()
        });
        let pipeline = pipeline(store, search, fetcher);

        let results = pipeline.run("foo").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].explanation, MISSING_KEY_FALLBACK);
    }

    #[tokio::test]
    async fn test_results_ordered_by_org_then_import_partition() {
        let search = Arc::new(FakeSearch {
            hits: HashMap::from([
                (
                    "fastai".to_string(),
                    vec![hit("fastai", "imp.py"), hit("fastai", "use.py")],
                ),
                ("AnswerDotAI".to_string(), vec![hit("AnswerDotAI", "use.py")]),
            ]),
            ..FakeSearch::default()
        });
        let fetcher = Arc::new(FakeFetcher {
            files: HashMap::from([
                (
                    hit("fastai", "imp.py").raw_content_url,
                    "from foo import bar".to_string(),
                ),
                (hit("fastai", "use.py").raw_content_url, "foo(1)".to_string()),
                (
                    hit("AnswerDotAI", "use.py").raw_content_url,
                    "foo(2)".to_string(),
                ),
            ]),
            ..FakeFetcher::default()
        });
        let pipeline = pipeline(full_store(), search.clone(), fetcher);

        let first = pipeline.run("foo").await.unwrap();
        let contexts: Vec<&str> = first.iter().map(|r| r.context.as_str()).collect();
        assert_eq!(contexts, vec!["foo(1)", "foo(2)", "from foo import bar"]);
        assert_eq!(
            *search.calls.lock().unwrap(),
            vec!["fastai".to_string(), "AnswerDotAI".to_string()]
        );

        let second = pipeline.run("foo").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_hits_capped_per_organization() {
        let hits: Vec<SearchHit> = (0..5).map(|i| hit("fastai", &format!("{i}.py"))).collect();
        let files = hits
            .iter()
            .map(|h| (h.raw_content_url.clone(), "foo".to_string()))
            .collect();
        let search = Arc::new(FakeSearch {
            hits: HashMap::from([("fastai".to_string(), hits)]),
            ..FakeSearch::default()
        });
        let fetcher = Arc::new(FakeFetcher {
            files,
            ..FakeFetcher::default()
        });
        let pipeline = pipeline(full_store(), search, fetcher.clone());

        let results = pipeline.run("foo").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }
}
