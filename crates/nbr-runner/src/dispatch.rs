//! Worker-pool dispatcher.
//!
//! A fixed set of worker tasks drains one immutable, precomputed queue.
//! Workers share nothing but the queue: whichever finishes first pulls the
//! next job, and a failing job never disturbs the ones in flight or still
//! queued.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nbr_types::{Job, JobOutcome, JobResult};
use tracing::{debug, error};

use crate::engine::{EngineOutcome, NotebookEngine};

/// Runs up to `workers` jobs concurrently against one engine.
pub struct Dispatcher {
    engine: Arc<dyn NotebookEngine>,
    workers: usize,
    locked_wait: Option<Duration>,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn NotebookEngine>, workers: usize) -> Self {
        Self {
            engine,
            workers: workers.max(1),
            locked_wait: None,
        }
    }

    /// Hold a global lock for `wait` before each engine start, staggering
    /// concurrent kernel launches.
    pub fn with_locked_wait(mut self, wait: Duration) -> Self {
        self.locked_wait = (!wait.is_zero()).then_some(wait);
        self
    }

    /// Execute all jobs and return one result per job, in the original
    /// job order. Completion order across workers is unspecified.
    pub async fn run(&self, jobs: Vec<Job>) -> Vec<JobResult> {
        if jobs.is_empty() {
            return Vec::new();
        }

        // Static queue: filled once, never refilled, so an empty try_recv
        // means the worker is done.
        let (tx, rx) = crossbeam_channel::unbounded();
        let total = jobs.len();
        for job in jobs {
            tx.send(job).expect("queue receiver alive");
        }
        drop(tx);

        let stagger = self
            .locked_wait
            .map(|wait| (Arc::new(tokio::sync::Mutex::new(())), wait));

        let worker_count = self.workers.min(total);
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = rx.clone();
            let engine = Arc::clone(&self.engine);
            let stagger = stagger.clone();

            handles.push(tokio::spawn(async move {
                let mut results = Vec::new();
                while let Ok(job) = queue.try_recv() {
                    debug!("Worker {worker_id} starting task {}", job.index);
                    if let Some((lock, wait)) = &stagger {
                        let _guard = lock.lock().await;
                        tokio::time::sleep(*wait).await;
                    }

                    let started = Instant::now();
                    let outcome = match engine.execute(&job).await {
                        EngineOutcome::Success => JobOutcome::Succeeded {
                            warning: job.allow_errors.then(|| {
                                "cell errors, if any, were tolerated (--allow-errors)".to_string()
                            }),
                        },
                        EngineOutcome::Failed(reason) => JobOutcome::Failed(reason),
                    };
                    debug!(
                        "Worker {worker_id} finished task {} as {}",
                        job.index,
                        outcome.label()
                    );
                    results.push(JobResult {
                        job,
                        outcome,
                        duration: started.elapsed(),
                    });
                }
                results
            }));
        }

        let mut results = Vec::with_capacity(total);
        for handle in handles {
            match handle.await {
                Ok(worker_results) => results.extend(worker_results),
                Err(e) => error!("Worker task panicked: {e}"),
            }
        }

        // Summary order should match the expanded job sequence, not the
        // nondeterministic completion order.
        results.sort_by_key(|r| r.job.index);
        results
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use nbr_types::{FailureReason, OutputFormat, ParameterSet};

    use super::*;

    struct FakeEngine {
        delay: Duration,
        failing: HashSet<PathBuf>,
        current: AtomicUsize,
        max_concurrent: AtomicUsize,
    }

    impl FakeEngine {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                failing: HashSet::new(),
                current: AtomicUsize::new(0),
                max_concurrent: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, notebook: &str) -> Self {
            self.failing.insert(PathBuf::from(notebook));
            self
        }

        fn max_seen(&self) -> usize {
            self.max_concurrent.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotebookEngine for FakeEngine {
        async fn execute(&self, job: &Job) -> EngineOutcome {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(&job.notebook) {
                EngineOutcome::Failed(FailureReason::Engine {
                    exit_code: Some(1),
                    message: "engine reported an error".to_string(),
                })
            } else {
                EngineOutcome::Success
            }
        }
    }

    fn jobs(count: usize) -> Vec<Job> {
        (1..=count)
            .map(|i| Job {
                index: i,
                notebook: PathBuf::from(format!("nb{i}.ipynb")),
                parameters: ParameterSet::new(),
                output_path: PathBuf::from(format!("out/nb{i}.html")),
                format: OutputFormat::Html,
                timeout_secs: -1,
                allow_errors: false,
                hide_input: false,
                debug: false,
                in_place: false,
            })
            .collect()
    }

    #[tokio::test]
    async fn results_come_back_in_job_order() {
        let engine = Arc::new(FakeEngine::new(Duration::from_millis(5)));
        let dispatcher = Dispatcher::new(engine, 4);
        let results = dispatcher.run(jobs(6)).await;

        let indices: Vec<usize> = results.iter().map(|r| r.job.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
        assert!(results.iter().all(|r| !r.outcome.is_failed()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrency_never_exceeds_worker_count() {
        // spec scenario: workers=3 with 4 queued jobs
        let engine = Arc::new(FakeEngine::new(Duration::from_millis(50)));
        let dispatcher = Dispatcher::new(Arc::clone(&engine) as Arc<dyn NotebookEngine>, 3);
        let results = dispatcher.run(jobs(4)).await;

        assert_eq!(results.len(), 4);
        assert!(engine.max_seen() <= 3, "saw {} concurrent", engine.max_seen());
        assert!(engine.max_seen() >= 2);
    }

    #[tokio::test]
    async fn single_worker_runs_sequentially() {
        let engine = Arc::new(FakeEngine::new(Duration::from_millis(5)));
        let dispatcher = Dispatcher::new(Arc::clone(&engine) as Arc<dyn NotebookEngine>, 1);
        let results = dispatcher.run(jobs(4)).await;

        assert_eq!(results.len(), 4);
        assert_eq!(engine.max_seen(), 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_other_jobs() {
        let engine = Arc::new(FakeEngine::new(Duration::from_millis(5)).failing_on("nb2.ipynb"));
        let dispatcher = Dispatcher::new(engine, 2);
        let results = dispatcher.run(jobs(4)).await;

        let failed: Vec<usize> = results
            .iter()
            .filter(|r| r.outcome.is_failed())
            .map(|r| r.job.index)
            .collect();
        assert_eq!(failed, vec![2]);
        assert_eq!(
            results.iter().filter(|r| !r.outcome.is_failed()).count(),
            3
        );
    }

    #[tokio::test]
    async fn allow_errors_annotates_the_success() {
        let engine = Arc::new(FakeEngine::new(Duration::ZERO));
        let dispatcher = Dispatcher::new(engine, 1);

        let mut batch = jobs(1);
        batch[0].allow_errors = true;
        let results = dispatcher.run(batch).await;

        match &results[0].outcome {
            JobOutcome::Succeeded { warning: Some(w) } => assert!(w.contains("allow-errors")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_failure_stays_failed_despite_allow_errors() {
        struct TimeoutEngine;
        #[async_trait]
        impl NotebookEngine for TimeoutEngine {
            async fn execute(&self, _job: &Job) -> EngineOutcome {
                EngineOutcome::Failed(FailureReason::Timeout { seconds: 1 })
            }
        }

        let dispatcher = Dispatcher::new(Arc::new(TimeoutEngine), 1);
        let mut batch = jobs(1);
        batch[0].allow_errors = true;
        let results = dispatcher.run(batch).await;

        assert_eq!(
            results[0].outcome,
            JobOutcome::Failed(FailureReason::Timeout { seconds: 1 })
        );
    }

    #[tokio::test]
    async fn empty_queue_yields_no_results() {
        let engine = Arc::new(FakeEngine::new(Duration::ZERO));
        let dispatcher = Dispatcher::new(engine, 3);
        assert!(dispatcher.run(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn locked_wait_staggers_engine_starts() {
        let engine = Arc::new(FakeEngine::new(Duration::ZERO));
        let dispatcher = Dispatcher::new(engine, 2)
            .with_locked_wait(Duration::from_millis(50));

        let started = Instant::now();
        let results = dispatcher.run(jobs(2)).await;
        assert_eq!(results.len(), 2);
        // Two starts serialized behind the lock: at least two waits elapsed
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
