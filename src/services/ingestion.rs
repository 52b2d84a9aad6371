use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::{DraftArticle, RawEntry, Source, SourceKind};
use crate::errors::{IngestError, IngestResult};
use crate::normalize::{normalize, SourceContext};
use crate::services::feed_registry::{
    api_metadata, api_source_name, syndication_metadata, syndication_source_name, FeedRegistry,
};
use crate::services::upsert::{UpsertEngine, UpsertOutcome};
use crate::sources::{parse_feed, FeedTarget, FetcherRegistry, RawPayload, SourceDescriptor};
use crate::storage::traits::{ArticleRepository, SourceRepository};

/// The ordered list of things one cycle ingests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionPlan {
    pub descriptors: Vec<SourceDescriptor>,
    /// Fallback base URL for API sources whose articles have no usable host
    pub api_base_url: String,
}

impl IngestionPlan {
    /// Every configured feed, then every API topic
    pub fn from_config(config: &Config) -> Self {
        let feeds = config.rss_feeds.iter().map(|url| {
            let target = FeedTarget::new(url.as_str());
            let target = if config.allows_invalid_certs(url) {
                target.insecure()
            } else {
                target
            };
            SourceDescriptor::Syndication(target)
        });

        let topics = config.topics.iter().map(|topic| SourceDescriptor::Api {
            topic: topic.clone(),
        });

        Self {
            descriptors: feeds.chain(topics).collect(),
            api_base_url: config.api_base_url.clone(),
        }
    }
}

/// Per-entry tallies for one source's batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub seen: usize,
    pub rejected: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl BatchStats {
    fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created(_) => self.created += 1,
            UpsertOutcome::Updated(_) => self.updated += 1,
            UpsertOutcome::Unchanged(_) => self.unchanged += 1,
        }
    }
}

/// Summary of one completed ingestion cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources_attempted: usize,
    pub sources_failed: usize,
    pub sources_skipped: usize,
    pub entries_seen: usize,
    pub entries_rejected: usize,
    pub articles_created: usize,
    pub articles_updated: usize,
    pub articles_unchanged: usize,
    pub entry_failures: usize,
}

impl RunReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            sources_attempted: 0,
            sources_failed: 0,
            sources_skipped: 0,
            entries_seen: 0,
            entries_rejected: 0,
            articles_created: 0,
            articles_updated: 0,
            articles_unchanged: 0,
            entry_failures: 0,
        }
    }

    fn absorb(&mut self, stats: &BatchStats) {
        self.entries_seen += stats.seen;
        self.entries_rejected += stats.rejected;
        self.articles_created += stats.created;
        self.articles_updated += stats.updated;
        self.articles_unchanged += stats.unchanged;
        self.entry_failures += stats.failed;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another cycle was already in progress
    Skipped,
    Completed(RunReport),
}

/// Holds the single-flight flag for the duration of a run
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives one ingestion cycle over every planned source
pub struct IngestionService<S: SourceRepository, A: ArticleRepository> {
    registry: FeedRegistry<S>,
    upsert: UpsertEngine<A>,
    fetchers: FetcherRegistry,
    plan: IngestionPlan,
    running: AtomicBool,
}

impl<S: SourceRepository, A: ArticleRepository> IngestionService<S, A> {
    pub fn new(
        source_repository: S,
        article_repository: A,
        fetchers: FetcherRegistry,
        plan: IngestionPlan,
    ) -> Self {
        Self {
            registry: FeedRegistry::new(source_repository),
            upsert: UpsertEngine::new(article_repository),
            fetchers,
            plan,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn sources(&self) -> IngestResult<Vec<Source>> {
        self.registry.list()
    }

    pub fn article_count(&self) -> IngestResult<i64> {
        self.upsert.count()
    }

    /// Run one cycle. Never fails: source and entry errors are logged and
    /// counted in the report.
    pub fn run(&self) -> RunOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("Ingestion already in progress, skipping this trigger");
            return RunOutcome::Skipped;
        };

        let mut report = RunReport::new(Utc::now());
        let mut api_disabled = false;
        info!(sources = self.plan.descriptors.len(), "Starting ingestion run");

        for descriptor in &self.plan.descriptors {
            if api_disabled && descriptor.kind() == SourceKind::Api {
                report.sources_skipped += 1;
                continue;
            }

            match self.ingest_source(descriptor) {
                Ok(stats) => {
                    report.sources_attempted += 1;
                    report.absorb(&stats);
                    info!(
                        source = descriptor.label(),
                        seen = stats.seen,
                        created = stats.created,
                        updated = stats.updated,
                        unchanged = stats.unchanged,
                        rejected = stats.rejected,
                        failed = stats.failed,
                        "Source ingested"
                    );
                }
                Err(IngestError::MissingApiKey) => {
                    warn!("News API key is not configured, skipping API topics for this run");
                    api_disabled = true;
                    report.sources_skipped += 1;
                }
                Err(e) => {
                    report.sources_attempted += 1;
                    report.sources_failed += 1;
                    error!(
                        source = descriptor.label(),
                        error = %e,
                        transient = e.is_transient(),
                        "Source ingestion failed"
                    );
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            attempted = report.sources_attempted,
            failed = report.sources_failed,
            created = report.articles_created,
            updated = report.articles_updated,
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Ingestion run finished"
        );

        RunOutcome::Completed(report)
    }

    fn ingest_source(&self, descriptor: &SourceDescriptor) -> IngestResult<BatchStats> {
        match (descriptor, self.fetchers.fetch(descriptor)?) {
            (SourceDescriptor::Syndication(target), RawPayload::Syndication(body)) => {
                self.ingest_feed(target, &body)
            }
            (SourceDescriptor::Api { topic }, RawPayload::Api(response)) => {
                let entries = response.articles.into_iter().map(RawEntry::from).collect();
                Ok(self.ingest_api(topic, entries))
            }
            (descriptor, _) => Err(IngestError::UnsupportedSource(format!(
                "payload does not match {} source {}",
                descriptor.kind(),
                descriptor.label()
            ))),
        }
    }

    fn ingest_feed(&self, target: &FeedTarget, body: &str) -> IngestResult<BatchStats> {
        let feed = parse_feed(body)?;
        let name = syndication_source_name(&feed, &target.url);
        let source = self
            .registry
            .resolve_source(&name, || syndication_metadata(&feed, &target.url))?;

        let ctx = SourceContext::syndication();
        let mut stats = BatchStats::default();

        for raw in &feed.entries {
            stats.seen += 1;
            let Some(draft) = normalize(raw, &ctx) else {
                stats.rejected += 1;
                continue;
            };
            self.store(draft, &source, &mut stats);
        }

        Ok(stats)
    }

    fn ingest_api(&self, topic: &str, entries: Vec<RawEntry>) -> BatchStats {
        let ctx = SourceContext::api(topic);
        let mut stats = BatchStats::default();
        let mut resolved: HashMap<String, Source> = HashMap::new();

        for raw in &entries {
            stats.seen += 1;
            let Some(draft) = normalize(raw, &ctx) else {
                stats.rejected += 1;
                continue;
            };

            let name = api_source_name(raw);
            let source = match resolved.get(&name) {
                Some(source) => source.clone(),
                None => match self
                    .registry
                    .resolve_source(&name, || api_metadata(raw, &self.plan.api_base_url))
                {
                    Ok(source) => {
                        resolved.insert(name, source.clone());
                        source
                    }
                    Err(e) => {
                        stats.failed += 1;
                        warn!(entry = raw.label(), source = %name, error = %e, "Could not resolve source");
                        continue;
                    }
                },
            };

            self.store(draft, &source, &mut stats);
        }

        stats
    }

    fn store(&self, draft: DraftArticle, source: &Source, stats: &mut BatchStats) {
        let url = draft.url.clone();
        match self.upsert.upsert(draft, source) {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                stats.failed += 1;
                warn!(url = %url, source = %source.name, error = %e, "Failed to store article");
            }
        }
    }
}
