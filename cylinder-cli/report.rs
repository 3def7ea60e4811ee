use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::orchestrator::{PairOutcome, PairResult};
use crate::MatchResult;

/// Plain-text similarity report, one line per pair in collection order
#[derive(Debug, Clone, Default)]
pub struct Report {
    results: Vec<PairResult>,
}

impl Report {
    pub fn new(results: Vec<PairResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[PairResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// (scored, no-features, failed)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.results.iter().fold((0, 0, 0), |(s, n, f), r| match r.outcome {
            PairOutcome::Score(_) => (s + 1, n, f),
            PairOutcome::NoFeatures => (s, n + 1, f),
            PairOutcome::Failed(_) => (s, n, f + 1),
        })
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for result in &self.results {
            writeln!(out, "{}", result)?;
        }
        out.flush()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> MatchResult<()> {
        let path = path.as_ref();
        self.write_to(BufWriter::new(File::create(path)?))?;

        let (scored, no_features, failed) = self.counts();
        info!(
            "wrote {} pairs to {} ({} scored, {} without features, {} failed)",
            self.len(),
            path.display(),
            scored,
            no_features,
            failed
        );
        Ok(())
    }
}
