//! Time-bounded terminology search
//!
//! The engine lives on one long-running worker thread and is fed through a
//! bounded job queue. A caller waits at most `timeout` for each answer; an
//! overrun is reported as `SearchError::Timeout` and the job is abandoned.
//!
//! A stalled engine holds up the queue. Jobs whose caller has already given
//! up are skipped once the worker gets to them, and at most `MAX_PENDING`
//! jobs can wait behind a stalled search. Past that, searches fail at once
//! with `SearchError::Unavailable` instead of piling up.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::SearchError;
use crate::terminology::{Candidate, SearchOptions, TerminologySearch};

/// Jobs allowed to queue behind the one the worker is running.
pub const MAX_PENDING: usize = 4;

enum Job {
    Search {
        query: String,
        deadline: Instant,
        reply: SyncSender<Result<Vec<Candidate>, SearchError>>,
    },
    Configure {
        options: SearchOptions,
        reply: SyncSender<Result<(), SearchError>>,
    },
    Describe {
        reply: SyncSender<BTreeMap<String, String>>,
    },
}

pub struct TimeoutSearch {
    jobs: SyncSender<Job>,
    timeout: Duration,
}

impl TimeoutSearch {
    /// Move `engine` onto its worker thread.
    pub fn new<S>(engine: S, timeout: Duration) -> Result<Self, SearchError>
    where
        S: TerminologySearch + Send + 'static,
    {
        let (jobs, queue) = mpsc::sync_channel(MAX_PENDING);
        thread::Builder::new()
            .name("terminology-search".to_string())
            .spawn(move || serve(engine, queue))
            .map_err(|e| SearchError::Unavailable(format!("could not start search worker: {}", e)))?;

        Ok(Self { jobs, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn submit(&self, job: Job) -> Result<(), SearchError> {
        self.jobs.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => SearchError::Unavailable(format!(
                "search worker is stalled with {} jobs queued",
                MAX_PENDING
            )),
            TrySendError::Disconnected(_) => {
                SearchError::Engine("search worker has stopped".to_string())
            }
        })
    }
}

/// Worker loop; ends when the `TimeoutSearch` is dropped.
fn serve<S: TerminologySearch>(mut engine: S, queue: Receiver<Job>) {
    for job in queue {
        match job {
            Job::Search {
                query,
                deadline,
                reply,
            } => {
                if Instant::now() >= deadline {
                    tracing::debug!("Skipping abandoned search for {:?}", query);
                    continue;
                }
                let result = panic::catch_unwind(AssertUnwindSafe(|| engine.search(&query)))
                    .unwrap_or_else(|_| {
                        Err(SearchError::Engine(format!("engine panicked on {:?}", query)))
                    });
                // Receiver is gone if the caller timed out meanwhile
                let _ = reply.send(result);
            }
            Job::Configure { options, reply } => {
                let _ = reply.send(engine.configure(&options));
            }
            Job::Describe { reply } => {
                let _ = reply.send(engine.active_configuration());
            }
        }
    }
}

impl TerminologySearch for TimeoutSearch {
    /// Fails with `Unavailable` while a stalled search holds the worker.
    fn configure(&mut self, options: &SearchOptions) -> Result<(), SearchError> {
        let (reply, answer) = mpsc::sync_channel(1);
        self.submit(Job::Configure {
            options: options.clone(),
            reply,
        })?;
        match answer.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SearchError::Unavailable(
                "search worker is busy with a timed-out search".to_string(),
            )),
            Err(RecvTimeoutError::Disconnected) => {
                Err(SearchError::Engine("search worker has stopped".to_string()))
            }
        }
    }

    fn search(&self, text: &str) -> Result<Vec<Candidate>, SearchError> {
        let (reply, answer) = mpsc::sync_channel(1);
        let deadline = Instant::now() + self.timeout;
        self.submit(Job::Search {
            query: text.to_string(),
            deadline,
            reply,
        })?;

        match answer.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SearchError::Timeout(self.timeout)),
            // The worker drops expired jobs without answering
            Err(RecvTimeoutError::Disconnected) if Instant::now() >= deadline => {
                Err(SearchError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(SearchError::Engine(
                "search worker stopped without a result".to_string(),
            )),
        }
    }

    fn active_configuration(&self) -> BTreeMap<String, String> {
        let (reply, answer) = mpsc::sync_channel(1);
        let mut props = match self.submit(Job::Describe { reply }) {
            Ok(()) => answer.recv_timeout(self.timeout).unwrap_or_else(|e| {
                tracing::warn!("Engine configuration unavailable: {}", e);
                BTreeMap::new()
            }),
            Err(e) => {
                tracing::warn!("Engine configuration unavailable: {}", e);
                BTreeMap::new()
            }
        };
        props.insert(
            "search.timeout.ms".to_string(),
            self.timeout.as_millis().to_string(),
        );
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sleeps on queries starting with "slow"; panics on "boom".
    struct SlowEngine {
        delay: Duration,
        configured: bool,
    }

    impl SlowEngine {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                configured: false,
            }
        }
    }

    impl TerminologySearch for SlowEngine {
        fn configure(&mut self, _options: &SearchOptions) -> Result<(), SearchError> {
            self.configured = true;
            Ok(())
        }

        fn search(&self, text: &str) -> Result<Vec<Candidate>, SearchError> {
            if text.starts_with("slow") {
                thread::sleep(self.delay);
            }
            if text == "boom" {
                panic!("engine crashed");
            }
            Ok(vec![Candidate::new(text)])
        }

        fn active_configuration(&self) -> BTreeMap<String, String> {
            let mut props = BTreeMap::new();
            props.insert("configured".to_string(), self.configured.to_string());
            props
        }
    }

    #[test]
    fn test_fast_search_passes_through() {
        let mut search = TimeoutSearch::new(SlowEngine::new(Duration::ZERO), Duration::from_secs(5))
            .unwrap();
        search.configure(&SearchOptions::default()).unwrap();
        let results = search.search("aspirin").unwrap();
        assert_eq!(results[0].name, "aspirin");

        let props = search.active_configuration();
        assert_eq!(props["configured"], "true");
        assert_eq!(props["search.timeout.ms"], "5000");
    }

    #[test]
    fn test_slow_search_times_out() {
        let search = TimeoutSearch::new(
            SlowEngine::new(Duration::from_millis(500)),
            Duration::from_millis(20),
        )
        .unwrap();
        let err = search.search("slow aspirin").unwrap_err();
        assert_eq!(err, SearchError::Timeout(Duration::from_millis(20)));
    }

    #[test]
    fn test_panicking_engine_reports_engine_error_and_keeps_serving() {
        let search = TimeoutSearch::new(SlowEngine::new(Duration::ZERO), Duration::from_secs(5))
            .unwrap();
        let err = search.search("boom").unwrap_err();
        assert!(matches!(err, SearchError::Engine(_)));

        let results = search.search("aspirin").unwrap();
        assert_eq!(results[0].name, "aspirin");
    }

    #[test]
    fn test_stalled_engine_bounds_queued_work() {
        let search = TimeoutSearch::new(
            SlowEngine::new(Duration::from_millis(800)),
            Duration::from_millis(20),
        )
        .unwrap();

        assert_eq!(
            search.search("slow query").unwrap_err(),
            SearchError::Timeout(Duration::from_millis(20))
        );

        // Later searches queue behind the stalled one until the queue is full
        let mut errors = Vec::new();
        for _ in 0..MAX_PENDING + 2 {
            errors.push(search.search("aspirin").unwrap_err());
        }
        assert!(errors
            .iter()
            .any(|e| matches!(e, SearchError::Unavailable(_))));
        assert!(errors
            .iter()
            .all(|e| matches!(e, SearchError::Timeout(_) | SearchError::Unavailable(_))));

        // Once the stall clears, expired jobs are skipped and the worker answers again
        thread::sleep(Duration::from_millis(1200));
        let results = search.search("aspirin").unwrap();
        assert_eq!(results[0].name, "aspirin");
    }
}
