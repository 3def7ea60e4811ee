use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::bounded;
use cylinder_core::{build_thread_pool, MatchConfig, Similarity};
use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;

use crate::corpus::ImageEntry;
use crate::{FingerprintMatcher, MatchResult};

/// Outcome of comparing one ordered pair
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Score(f64),
    NoFeatures,
    /// The pair could not be compared, e.g. an unreadable image
    Failed(String),
}

impl From<Similarity> for PairOutcome {
    fn from(similarity: Similarity) -> Self {
        match similarity {
            Similarity::Score(s) => PairOutcome::Score(s),
            Similarity::NoFeatures => PairOutcome::NoFeatures,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub image_a: String,
    pub image_b: String,
    pub outcome: PairOutcome,
}

/// One report line
impl fmt::Display for PairResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PairOutcome::Score(s) => write!(f, "{} - {}: {:.4}", self.image_a, self.image_b, s),
            PairOutcome::NoFeatures => {
                write!(f, "No valid features found in fingerprint: {} - {}", self.image_a, self.image_b)
            }
            PairOutcome::Failed(reason) => {
                write!(f, "Failed to compare fingerprints: {} - {}: {}", self.image_a, self.image_b, reason)
            }
        }
    }
}

/// A unit of work: the two files of one ordered pair and nothing else
#[derive(Debug, Clone)]
pub struct PairJob {
    pub a: ImageEntry,
    pub b: ImageEntry,
    /// Both sides are the same corpus entry (i == j)
    pub same: bool,
}

impl PairJob {
    /// Ordered cross product of the corpus with itself, self-pairs included
    pub fn all_pairs(corpus: &[ImageEntry]) -> Vec<PairJob> {
        let mut jobs = Vec::with_capacity(corpus.len() * corpus.len());
        for (i, a) in corpus.iter().enumerate() {
            for (j, b) in corpus.iter().enumerate() {
                jobs.push(PairJob {
                    a: a.clone(),
                    b: b.clone(),
                    same: i == j,
                });
            }
        }
        jobs
    }
}

/// Completion percentage; an empty batch counts as complete
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

/// Receives progress from the collecting thread, once per finished pair
pub trait ProgressObserver {
    fn started(&self, _total: usize) {}
    fn pair_completed(&self, done: usize, total: usize);
    fn finished(&self) {}
}

impl ProgressObserver for () {
    fn pair_completed(&self, _done: usize, _total: usize) {}
}

impl ProgressObserver for ProgressBar {
    fn started(&self, total: usize) {
        self.set_length(total as u64);
        self.set_position(0);
    }

    fn pair_completed(&self, done: usize, total: usize) {
        self.set_position(done as u64);
        self.set_message(format!("{:.2}%", percent(done, total)));
    }

    fn finished(&self) {
        self.finish();
    }
}

/// Runs every pair comparison on a dedicated pool and gathers the results
pub struct Orchestrator {
    matcher: FingerprintMatcher,
    pool: rayon::ThreadPool,
}

impl Orchestrator {
    pub fn new(cfg: &MatchConfig) -> MatchResult<Self> {
        let matcher = FingerprintMatcher::new(cfg)?;
        let pool = build_thread_pool(cfg.n_threads)?;
        Ok(Self { matcher, pool })
    }

    pub fn matcher(&self) -> &FingerprintMatcher {
        &self.matcher
    }

    pub fn n_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compares one pair. Self-pairs score 1.0 without touching the files;
    /// errors turn into a `Failed` outcome.
    pub fn compare_pair(&self, job: &PairJob) -> PairResult {
        let outcome = if job.same {
            PairOutcome::Score(1.0)
        } else {
            match self.matcher.compare_files(&job.a.path, &job.b.path) {
                Ok(similarity) => similarity.into(),
                Err(e) => {
                    warn!("{} - {}: {}", job.a.name, job.b.name, e);
                    PairOutcome::Failed(e.to_string())
                }
            }
        };
        debug!("{} - {}: {:?}", job.a.name, job.b.name, outcome);

        PairResult {
            image_a: job.a.name.clone(),
            image_b: job.b.name.clone(),
            outcome,
        }
    }

    /// Compares all N² ordered pairs of `corpus`.
    ///
    /// Results come back in completion order. The observer is called on the
    /// calling thread after each result is collected.
    pub fn run<O: ProgressObserver + ?Sized>(&self, corpus: &[ImageEntry], observer: &O) -> Vec<PairResult> {
        self.run_jobs(PairJob::all_pairs(corpus), observer, |job| self.compare_pair(job))
    }

    fn run_jobs<O, F>(&self, jobs: Vec<PairJob>, observer: &O, compare: F) -> Vec<PairResult>
    where
        O: ProgressObserver + ?Sized,
        F: Fn(&PairJob) -> PairResult + Sync,
    {
        let total = jobs.len();
        observer.started(total);

        let (tx, rx) = bounded(self.n_threads() * 2);
        let mut results = Vec::with_capacity(total);
        let compare = &compare;

        std::thread::scope(|s| {
            s.spawn(move || {
                self.pool.install(|| {
                    jobs.into_par_iter().for_each_with(tx, |tx, job| {
                        if tx.send(guarded(compare, &job)).is_err() {
                            warn!("result collector went away, dropping {} - {}", job.a.name, job.b.name);
                        }
                    });
                });
            });

            for result in rx.iter() {
                results.push(result);
                observer.pair_completed(results.len(), total);
            }
        });

        observer.finished();
        results
    }
}

/// Runs one comparison, turning a panic into a `Failed` outcome for that pair
fn guarded<F: Fn(&PairJob) -> PairResult>(compare: &F, job: &PairJob) -> PairResult {
    match panic::catch_unwind(AssertUnwindSafe(|| compare(job))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = format!("worker panicked: {}", panic_message(&*payload));
            warn!("{} - {}: {}", job.a.name, job.b.name, reason);
            PairResult {
                image_a: job.a.name.clone(),
                image_b: job.b.name.clone(),
                outcome: PairOutcome::Failed(reason),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_images::{blobs, flat};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        started: RefCell<Option<usize>>,
        calls: RefCell<Vec<(usize, usize)>>,
        finished: RefCell<bool>,
    }

    impl ProgressObserver for Recorder {
        fn started(&self, total: usize) {
            *self.started.borrow_mut() = Some(total);
        }

        fn pair_completed(&self, done: usize, total: usize) {
            self.calls.borrow_mut().push((done, total));
        }

        fn finished(&self) {
            *self.finished.borrow_mut() = true;
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(&MatchConfig { n_threads: 2, ..MatchConfig::default() }).unwrap()
    }

    fn entries(names: &[&str]) -> Vec<ImageEntry> {
        names.iter().map(|n| ImageEntry::new(format!("/nonexistent/{}", n))).collect()
    }

    #[test]
    fn test_all_pairs_is_ordered_cross_product() {
        let jobs = PairJob::all_pairs(&entries(&["a", "b", "c"]));
        assert_eq!(jobs.len(), 9);
        assert_eq!(jobs.iter().filter(|j| j.same).count(), 3);
        assert!(jobs.iter().any(|j| j.a.name == "a" && j.b.name == "b"));
        assert!(jobs.iter().any(|j| j.a.name == "b" && j.b.name == "a"));
    }

    #[test]
    fn test_self_pair_by_index_not_name() {
        let jobs = PairJob::all_pairs(&entries(&["x", "x"]));
        assert_eq!(jobs.iter().filter(|j| j.same).count(), 2);
    }

    #[test]
    fn test_self_pair_skips_pipeline() {
        let o = orchestrator();
        let entry = ImageEntry::new("/nonexistent/ghost.bmp");
        let job = PairJob { a: entry.clone(), b: entry, same: true };
        assert_eq!(o.compare_pair(&job).outcome, PairOutcome::Score(1.0));
    }

    #[test]
    fn test_unreadable_pair_fails_alone() {
        let o = orchestrator();
        let results = o.run(&entries(&["a.bmp", "b.bmp"]), &());
        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.outcome == PairOutcome::Score(1.0)).count(), 2);
        assert_eq!(results.iter().filter(|r| matches!(r.outcome, PairOutcome::Failed(_))).count(), 2);
    }

    #[test]
    fn test_progress_reaches_total_on_last_result() {
        let dir = tempfile::tempdir().unwrap();
        blobs(160).save(dir.path().join("a.bmp")).unwrap();
        blobs(200).save(dir.path().join("b.bmp")).unwrap();
        flat(160, 40).save(dir.path().join("c.bmp")).unwrap();
        let corpus = crate::list_images(dir.path(), "bmp").unwrap();

        let recorder = Recorder::default();
        let results = orchestrator().run(&corpus, &recorder);

        assert_eq!(results.len(), 9);
        assert_eq!(*recorder.started.borrow(), Some(9));
        assert!(*recorder.finished.borrow());
        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 9);
        for (k, &(done, total)) in calls.iter().enumerate() {
            assert_eq!(done, k + 1);
            assert_eq!(total, 9);
        }
        assert_eq!(percent(calls[8].0, 9), 100.0);
        assert!(percent(calls[7].0, 9) < 100.0);
    }

    #[test]
    fn test_panicking_pair_fails_alone() {
        let o = orchestrator();
        let jobs = PairJob::all_pairs(&entries(&["a.bmp", "b.bmp"]));
        let recorder = Recorder::default();

        let results = o.run_jobs(jobs, &recorder, |job| {
            if job.a.name == "b.bmp" && !job.same {
                panic!("decoder blew up");
            }
            PairResult { image_a: job.a.name.clone(), image_b: job.b.name.clone(), outcome: PairOutcome::Score(0.5) }
        });

        assert_eq!(results.len(), 4);
        assert_eq!(recorder.calls.borrow().len(), 4);
        let failed: Vec<&PairResult> = results.iter().filter(|r| matches!(r.outcome, PairOutcome::Failed(_))).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(
            failed[0].to_string(),
            "Failed to compare fingerprints: b.bmp - a.bmp: worker panicked: decoder blew up"
        );
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        let other: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(&*owned), "owned");
        assert_eq!(panic_message(&*borrowed), "static");
        assert_eq!(panic_message(&*other), "unknown panic");
    }

    #[test]
    fn test_report_lines() {
        let scored = PairResult { image_a: "a.bmp".into(), image_b: "b.bmp".into(), outcome: PairOutcome::Score(0.123456) };
        assert_eq!(scored.to_string(), "a.bmp - b.bmp: 0.1235");

        let none = PairResult { outcome: PairOutcome::NoFeatures, ..scored.clone() };
        assert_eq!(none.to_string(), "No valid features found in fingerprint: a.bmp - b.bmp");

        let failed = PairResult { outcome: PairOutcome::Failed("boom".into()), ..scored };
        assert_eq!(failed.to_string(), "Failed to compare fingerprints: a.bmp - b.bmp: boom");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 100.0);
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(4, 4), 100.0);
    }
}
