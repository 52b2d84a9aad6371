pub mod feed_registry;
pub mod upsert;
pub mod ingestion;
pub mod scheduler;

pub use feed_registry::FeedRegistry;
pub use upsert::{UpsertEngine, UpsertOutcome};
pub use ingestion::{BatchStats, IngestionPlan, IngestionService, RunOutcome, RunReport};
pub use scheduler::{Scheduler, TriggerOutcome};
