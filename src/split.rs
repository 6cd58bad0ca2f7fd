use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pdf::{build_document, extract, serialize, PdfDocument};
use crate::plan::{plan, ExtractionJob, SplitMode};

/// A progress report emitted while splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percentage: u8,
    pub message: String,
}

/// One output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
    pub name: String,
    pub data: Vec<u8>,
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitState {
    Idle,
    Planning,
    /// `current` is the 0-based index of the job being extracted
    Extracting { current: usize, total: usize },
    Done,
    Failed(String),
}

impl fmt::Display for SplitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitState::Idle => write!(f, "idle"),
            SplitState::Planning => write!(f, "planning"),
            SplitState::Extracting { current, total } => {
                write!(f, "extracting {} of {}", current + 1, total)
            }
            SplitState::Done => write!(f, "done"),
            SplitState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Runs a split: plans the jobs, then extracts them one at a time.
///
/// Jobs never overlap. Each extraction runs on the blocking pool against a
/// shared read-only source, and the next one starts only after the previous
/// one has been serialized. A failed job fails the whole split.
#[derive(Debug)]
pub struct Splitter {
    state: SplitState,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Splitter {
    pub fn new() -> Self {
        Splitter {
            state: SplitState::Idle,
        }
    }

    pub fn state(&self) -> &SplitState {
        &self.state
    }

    fn set_state(&mut self, state: SplitState) {
        debug!(state = %state, "split state");
        self.state = state;
    }

    pub async fn run<F>(
        &mut self,
        source: Arc<PdfDocument>,
        mode: &SplitMode,
        mut progress: F,
    ) -> Result<Vec<SplitResult>>
    where
        F: FnMut(Progress),
    {
        let outcome = self.run_inner(source, mode, &mut progress).await;
        match &outcome {
            Ok(results) => {
                self.set_state(SplitState::Done);
                info!(files = results.len(), "split complete");
            }
            Err(e) => {
                self.set_state(SplitState::Failed(e.to_string()));
                warn!(error = %e, "split failed");
            }
        }
        outcome
    }

    async fn run_inner<F>(
        &mut self,
        source: Arc<PdfDocument>,
        mode: &SplitMode,
        progress: &mut F,
    ) -> Result<Vec<SplitResult>>
    where
        F: FnMut(Progress),
    {
        report(progress, 0, "Preparing to split PDF...");

        self.set_state(SplitState::Planning);
        let jobs = plan(mode, source.page_count())?;
        let total = jobs.len();

        let mut results = Vec::with_capacity(total);
        for (i, job) in jobs.into_iter().enumerate() {
            self.set_state(SplitState::Extracting { current: i, total });
            debug!(
                job = %job.name,
                pages = job.page_count(),
                "extracting {}/{}",
                i + 1,
                total
            );

            let data = match mode {
                SplitMode::Range { .. } => {
                    run_staged(
                        &source,
                        job.clone(),
                        progress,
                        "Extracting pages...",
                        "Generating PDF...",
                    )
                    .await?
                }
                SplitMode::Reorder(_) => {
                    run_staged(
                        &source,
                        job.clone(),
                        progress,
                        "Reordering pages...",
                        "Generating reordered PDF...",
                    )
                    .await?
                }
                SplitMode::EveryPage | SplitMode::CustomRanges(_) => {
                    let unit = if matches!(mode, SplitMode::EveryPage) {
                        "page"
                    } else {
                        "range"
                    };
                    report(
                        progress,
                        percent(i, total),
                        &format!("Processing {} {}...", unit, i + 1),
                    );
                    let source = Arc::clone(&source);
                    let job = job.clone();
                    tokio::task::spawn_blocking(move || extract(&source, &job)).await??
                }
            };

            results.push(SplitResult {
                page_count: job.page_count(),
                name: job.name,
                data,
            });
        }

        report(progress, 100, "Complete!");
        Ok(results)
    }
}

/// Single-output modes report fixed sub-steps instead of per-job progress.
async fn run_staged<F>(
    source: &Arc<PdfDocument>,
    job: ExtractionJob,
    progress: &mut F,
    extracting: &str,
    generating: &str,
) -> Result<Vec<u8>>
where
    F: FnMut(Progress),
{
    report(progress, 25, "Loading original PDF...");
    report(progress, 50, extracting);
    let mut doc = build_blocking(source, job).await?;
    report(progress, 75, generating);
    tokio::task::spawn_blocking(move || serialize(&mut doc)).await?
}

async fn build_blocking(
    source: &Arc<PdfDocument>,
    job: ExtractionJob,
) -> Result<lopdf::Document> {
    let source = Arc::clone(source);
    tokio::task::spawn_blocking(move || build_document(&source, &job)).await?
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done * 100 / total) as u8
}

fn report<F: FnMut(Progress)>(progress: &mut F, percentage: u8, message: &str) {
    progress(Progress {
        percentage,
        message: message.to_string(),
    });
}

/// "1 page" / "3 pages"
pub fn describe_page_count(count: u32) -> String {
    if count == 1 {
        "1 page".to_string()
    } else {
        format!("{} pages", count)
    }
}
