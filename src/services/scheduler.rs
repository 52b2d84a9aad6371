use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::errors::IngestResult;
use crate::services::ingestion::{IngestionService, RunOutcome};
use crate::storage::traits::{ArticleRepository, SourceRepository};

enum Signal {
    Trigger,
    Shutdown,
}

/// What became of an on-demand trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Accepted,
    /// A run was in progress; the request was dropped
    Skipped,
    /// The scheduler thread has exited
    Stopped,
}

/// Runs ingestion on a background thread: once at start, then at a fixed
/// rate of `interval`, plus whenever [`Scheduler::trigger`] is called while
/// no run is active.
pub struct Scheduler {
    sender: Sender<Signal>,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn spawn<S, A>(service: Arc<IngestionService<S, A>>, interval: Duration) -> IngestResult<Self>
    where
        S: SourceRepository + 'static,
        A: ArticleRepository + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        // The initial run starts immediately
        let busy = Arc::new(AtomicBool::new(true));
        let worker_busy = Arc::clone(&busy);

        let handle = thread::Builder::new()
            .name("newswire-scheduler".to_string())
            .spawn(move || {
                info!(interval_ms = interval.as_millis() as u64, "Scheduler started");
                let mut next_tick = Instant::now() + interval;
                let mut stopping = run_and_drain(&service, &receiver, &worker_busy);

                while !stopping {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    stopping = match receiver.recv_timeout(wait) {
                        Ok(Signal::Trigger) => {
                            debug!("On-demand ingestion requested");
                            worker_busy.store(true, Ordering::Release);
                            run_and_drain(&service, &receiver, &worker_busy)
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            worker_busy.store(true, Ordering::Release);
                            let stop = run_and_drain(&service, &receiver, &worker_busy);
                            next_tick = next_deadline(next_tick, Instant::now(), interval);
                            stop
                        }
                        Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => true,
                    };
                }

                info!("Scheduler stopped");
            })?;

        Ok(Self {
            sender,
            busy,
            handle: Some(handle),
        })
    }

    /// Request an extra run. Ignored while a run is in progress.
    pub fn trigger(&self) -> TriggerOutcome {
        if self.handle.is_none() {
            return TriggerOutcome::Stopped;
        }
        if self.is_busy() {
            info!("Ingestion already in progress, ignoring trigger");
            return TriggerOutcome::Skipped;
        }

        match self.sender.send(Signal::Trigger) {
            Ok(()) => TriggerOutcome::Accepted,
            Err(_) => TriggerOutcome::Stopped,
        }
    }

    /// True from the start of a run until its leftover triggers are discarded
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Stop after the current run, if any, and wait for the thread to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(Signal::Shutdown);
            if handle.join().is_err() {
                error!("Scheduler thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run once, then discard triggers that piled up meanwhile. Returns true
/// when a shutdown was seen.
fn run_and_drain<S, A>(
    service: &IngestionService<S, A>,
    receiver: &Receiver<Signal>,
    busy: &AtomicBool,
) -> bool
where
    S: SourceRepository,
    A: ArticleRepository,
{
    if let RunOutcome::Completed(report) = service.run() {
        debug!(
            created = report.articles_created,
            updated = report.articles_updated,
            "Scheduled run complete"
        );
    }

    let mut stopping = false;
    loop {
        match receiver.try_recv() {
            Ok(Signal::Trigger) => info!("Dropping trigger received during a run"),
            Ok(Signal::Shutdown) | Err(TryRecvError::Disconnected) => {
                stopping = true;
                break;
            }
            Err(TryRecvError::Empty) => break,
        }
    }

    busy.store(false, Ordering::Release);
    stopping
}

/// Fixed-rate schedule: the tick after `previous`, skipping any that were
/// missed while a run overran.
fn next_deadline(previous: Instant, now: Instant, interval: Duration) -> Instant {
    let mut next = previous + interval;
    while next <= now {
        next += interval;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceKind;
    use crate::errors::IngestError;
    use crate::services::ingestion::IngestionPlan;
    use crate::sources::traits::MockContentFetcher;
    use crate::sources::{FeedTarget, FetcherRegistry, SourceDescriptor};
    use crate::storage::sqlite::{SqliteArticleRepository, SqliteSourceRepository, SqliteStorage};

    fn service_with(
        fetcher: MockContentFetcher,
    ) -> Arc<IngestionService<SqliteSourceRepository, SqliteArticleRepository>> {
        let storage = SqliteStorage::in_memory().unwrap();
        let plan = IngestionPlan {
            descriptors: vec![SourceDescriptor::Syndication(FeedTarget::new(
                "https://a.example/rss",
            ))],
            api_base_url: String::new(),
        };

        Arc::new(IngestionService::new(
            SqliteSourceRepository::new(storage.clone()),
            SqliteArticleRepository::new(storage),
            FetcherRegistry::new().with(Box::new(fetcher)),
            plan,
        ))
    }

    fn offline_fetcher() -> MockContentFetcher {
        let mut fetcher = MockContentFetcher::new();
        fetcher.expect_kind().return_const(SourceKind::Syndication);
        fetcher
    }

    fn service_expecting(
        runs: usize,
    ) -> Arc<IngestionService<SqliteSourceRepository, SqliteArticleRepository>> {
        let mut fetcher = offline_fetcher();
        fetcher
            .expect_fetch()
            .times(runs)
            .returning(|_| Err(IngestError::FeedParse("offline".to_string())));
        service_with(fetcher)
    }

    fn wait_until_idle(scheduler: &Scheduler) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while scheduler.is_busy() {
            assert!(Instant::now() < deadline, "scheduler never went idle");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_runs_immediately_then_on_trigger() {
        let service = service_expecting(2);
        let scheduler = Scheduler::spawn(Arc::clone(&service), Duration::from_secs(3600)).unwrap();

        wait_until_idle(&scheduler);
        assert_eq!(scheduler.trigger(), TriggerOutcome::Accepted);
        scheduler.shutdown();

        assert!(!service.is_running());
    }

    #[test]
    fn test_triggers_during_run_are_dropped() {
        let mut fetcher = offline_fetcher();
        fetcher.expect_fetch().times(1).returning(|_| {
            thread::sleep(Duration::from_millis(300));
            Err(IngestError::FeedParse("slow and offline".to_string()))
        });
        let service = service_with(fetcher);
        let scheduler = Scheduler::spawn(Arc::clone(&service), Duration::from_secs(3600)).unwrap();

        for _ in 0..3 {
            assert_eq!(scheduler.trigger(), TriggerOutcome::Skipped);
        }
        scheduler.shutdown();
    }

    #[test]
    fn test_next_deadline_keeps_fixed_rate() {
        let start = Instant::now();
        let interval = Duration::from_secs(10);

        // A quick run keeps the original cadence
        let next = next_deadline(start, start + Duration::from_secs(2), interval);
        assert_eq!(next, start + interval);

        // An overrun skips the missed tick instead of firing twice
        let next = next_deadline(start, start + Duration::from_secs(25), interval);
        assert_eq!(next, start + Duration::from_secs(30));
    }

    #[test]
    fn test_interval_elapses() {
        let mut fetcher = offline_fetcher();
        fetcher
            .expect_fetch()
            .times(2..)
            .returning(|_| Err(IngestError::FeedParse("offline".to_string())));
        let service = service_with(fetcher);

        let scheduler = Scheduler::spawn(Arc::clone(&service), Duration::from_millis(10)).unwrap();
        thread::sleep(Duration::from_millis(200));
        scheduler.shutdown();
    }

    #[test]
    fn test_drop_stops_thread() {
        let service = service_expecting(1);
        {
            let _scheduler = Scheduler::spawn(Arc::clone(&service), Duration::from_secs(3600)).unwrap();
        }
        assert_eq!(Arc::strong_count(&service), 1);
    }
}
