//! Pipe execution and batch running.
//!
//! For every input file a [`FileRunner`] builds the pipe set from the
//! configured targets, opens the source once, and renders every pipe from
//! that single decoded entry. Input files are independent units: the batch
//! runner processes them in parallel and keeps going when one of them fails.
//!
//! ## Parallel Processing
//!
//! Both levels fan out on [rayon](https://docs.rs/rayon): files across the
//! global pool, and within a file its pipes. The pool size comes from
//! `[processing] max_processes` and is set up by the binary.
//!
//! ## Failure Policy
//!
//! ```text
//! plan error (unknown mode, bad dimensions)   -> file fails, no I/O
//! empty pipe set                              -> file fails, no I/O
//! source cannot be read or decoded            -> file fails, no outputs
//! some pipes fail                             -> file fails, siblings kept
//! panic inside a file                         -> "Unexpected error" for that file
//! ```
//!
//! The batch always runs every file to completion and then reports the first
//! failure in input order. A [`Cancellation`] stops new work from starting;
//! pipes already encoding are allowed to finish.

use crate::config::ResolvedConfig;
use crate::imaging::{BackendError, ImageBackend, PipeDescriptor, RustBackend};
use crate::plan::{PipeSet, PlanError, SkippedPipe, build_pipes, input_base_name};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{}: {source}", .input.display())]
    Plan { input: PathBuf, source: PlanError },
    #[error("{}: No pipes to process", .input.display())]
    NoPipes { input: PathBuf },
    #[error("{}: Could not read source image: {source}", .input.display())]
    SourceRead { input: PathBuf, source: BackendError },
    #[error("{}: {failed} of {total} pipes failed", .input.display())]
    PipeProcessing {
        input: PathBuf,
        failed: usize,
        total: usize,
    },
    #[error("Unexpected error while processing {}", .input.display())]
    Unexpected { input: PathBuf, message: String },
    #[error("{}: interrupted", .input.display())]
    Interrupted { input: PathBuf },
}

impl ProcessError {
    /// The input file this failure belongs to.
    pub fn input(&self) -> &Path {
        match self {
            ProcessError::Plan { input, .. }
            | ProcessError::NoPipes { input }
            | ProcessError::SourceRead { input, .. }
            | ProcessError::PipeProcessing { input, .. }
            | ProcessError::Unexpected { input, .. }
            | ProcessError::Interrupted { input } => input,
        }
    }

    /// Failures caused by the target table rather than by image data.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProcessError::Plan { .. })
    }
}

/// Shared stop flag, set from the signal watcher.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a single pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeStatus {
    Written,
    Failed(String),
    /// Not started because the run was cancelled.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeReport {
    pub target: String,
    pub output: PathBuf,
    pub status: PipeStatus,
}

/// Progress events sent to the printer thread while the batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// A file finished rendering all of its pipes (some may have failed).
    FileProcessed {
        /// 1-based position in the input list.
        index: usize,
        input: PathBuf,
        pipes: Vec<PipeReport>,
        skipped: Vec<SkippedPipe>,
    },
    /// A file failed before or instead of rendering.
    FileFailed {
        index: usize,
        input: PathBuf,
        error: String,
    },
}

/// Executes the pipes of one input file.
///
/// The decoded source is memoized: however many pipes (or repeated
/// [`execute`](Self::execute) calls) the runner serves, the backend opens the
/// file at most once.
pub struct FileRunner<'a, B: ImageBackend> {
    backend: &'a B,
    input: &'a Path,
    config: &'a ResolvedConfig,
    cancel: &'a Cancellation,
    entry: OnceCell<B::Source>,
}

impl<'a, B: ImageBackend> FileRunner<'a, B> {
    pub fn new(
        backend: &'a B,
        input: &'a Path,
        config: &'a ResolvedConfig,
        cancel: &'a Cancellation,
    ) -> Self {
        Self {
            backend,
            input,
            config,
            cancel,
            entry: OnceCell::new(),
        }
    }

    /// Plan every (target, format) pair for this file.
    pub fn build(&self) -> Result<PipeSet, ProcessError> {
        build_pipes(
            &self.config.targets,
            &self.config.format_options,
            &input_base_name(self.input),
            &self.config.output_dir,
        )
        .map_err(|source| ProcessError::Plan {
            input: self.input.to_path_buf(),
            source,
        })
    }

    fn source(&self) -> Result<&B::Source, ProcessError> {
        self.entry
            .get_or_try_init(|| {
                log::debug!("Opening {}", self.input.display());
                self.backend.open(self.input)
            })
            .map_err(|source| ProcessError::SourceRead {
                input: self.input.to_path_buf(),
                source,
            })
    }

    fn run_pipe(&self, source: &B::Source, pipe: &PipeDescriptor) -> PipeReport {
        let status = if self.cancel.is_cancelled() {
            PipeStatus::Cancelled
        } else {
            match self.backend.render(source, pipe) {
                Ok(()) => {
                    log::debug!("Wrote {}", pipe.output_path.display());
                    PipeStatus::Written
                }
                Err(e) => {
                    log::error!(
                        "{}: target '{}' ({}) failed: {}",
                        self.input.display(),
                        pipe.target,
                        pipe.format,
                        e
                    );
                    PipeStatus::Failed(e.to_string())
                }
            }
        };
        PipeReport {
            target: pipe.target.clone(),
            output: pipe.output_path.clone(),
            status,
        }
    }

    /// Render every pipe in `set` from one decoded source.
    ///
    /// Returns the number of output files written. An empty set fails with
    /// [`ProcessError::NoPipes`] before the source is touched.
    pub fn execute(&self, set: &PipeSet) -> Result<usize, ProcessError> {
        self.execute_with_reports(set).and_then(|reports| self.settle(set, &reports))
    }

    fn execute_with_reports(&self, set: &PipeSet) -> Result<Vec<PipeReport>, ProcessError> {
        if set.is_empty() {
            return Err(ProcessError::NoPipes {
                input: self.input.to_path_buf(),
            });
        }
        if self.cancel.is_cancelled() {
            return Err(ProcessError::Interrupted {
                input: self.input.to_path_buf(),
            });
        }
        let source = self.source()?;
        Ok(set
            .pipes
            .par_iter()
            .map(|pipe| self.run_pipe(source, pipe))
            .collect())
    }

    fn settle(&self, set: &PipeSet, reports: &[PipeReport]) -> Result<usize, ProcessError> {
        let input = self.input.to_path_buf();
        if reports.iter().any(|r| r.status == PipeStatus::Cancelled) {
            return Err(ProcessError::Interrupted { input });
        }
        let failed = reports
            .iter()
            .filter(|r| matches!(r.status, PipeStatus::Failed(_)))
            .count();
        if failed > 0 {
            return Err(ProcessError::PipeProcessing {
                input,
                failed,
                total: set.len(),
            });
        }
        Ok(reports.len())
    }

    /// Build and execute, keeping the per-pipe reports for progress output.
    ///
    /// `Err` means the file failed before any pipe ran.
    fn render_file(&self) -> Result<RenderedFile, ProcessError> {
        if self.cancel.is_cancelled() {
            return Err(ProcessError::Interrupted {
                input: self.input.to_path_buf(),
            });
        }
        let set = self.build()?;
        let reports = self.execute_with_reports(&set)?;
        let outcome = self.settle(&set, &reports);
        Ok(RenderedFile {
            reports,
            skipped: set.skipped,
            outcome,
        })
    }
}

/// A file whose pipes all ran, successfully or not.
struct RenderedFile {
    reports: Vec<PipeReport>,
    skipped: Vec<SkippedPipe>,
    outcome: Result<usize, ProcessError>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Process every input file in `config` with the production backend.
pub fn process(
    config: &ResolvedConfig,
    cancel: &Cancellation,
    events: Option<Sender<ProcessEvent>>,
) -> Result<usize, ProcessError> {
    let backend = RustBackend::new();
    process_batch(&backend, config, cancel, events)
}

/// Process every input file using a specific backend (allows testing with mock).
///
/// Returns the total number of output files written. Every file runs to
/// completion regardless of its siblings; when any failed, the first failure
/// in input order is returned. A cancelled run reports
/// [`ProcessError::Interrupted`] ahead of any other failure.
pub fn process_batch<B: ImageBackend>(
    backend: &B,
    config: &ResolvedConfig,
    cancel: &Cancellation,
    events: Option<Sender<ProcessEvent>>,
) -> Result<usize, ProcessError> {
    let total_files = config.input_files.len();
    log::info!("Processing {} file(s) into {}", total_files, config.output_dir.display());

    let outcomes: Vec<Result<usize, ProcessError>> = config
        .input_files
        .par_iter()
        .enumerate()
        .map(|(i, input)| {
            let runner = FileRunner::new(backend, input, config, cancel);
            let attempt = catch_unwind(AssertUnwindSafe(|| runner.render_file()))
                .unwrap_or_else(|payload| {
                    Err(ProcessError::Unexpected {
                        input: input.clone(),
                        message: panic_message(payload.as_ref()),
                    })
                });
            // One progress event per file: the pipe listing once rendering
            // happened, the error otherwise.
            let (event, outcome) = match attempt {
                Ok(rendered) => (
                    ProcessEvent::FileProcessed {
                        index: i + 1,
                        input: input.clone(),
                        pipes: rendered.reports,
                        skipped: rendered.skipped,
                    },
                    rendered.outcome,
                ),
                Err(e) => (
                    ProcessEvent::FileFailed {
                        index: i + 1,
                        input: input.clone(),
                        error: e.to_string(),
                    },
                    Err(e),
                ),
            };
            if let Err(e) = &outcome {
                match e {
                    ProcessError::Unexpected { message, .. } => log::error!("{e}: {message}"),
                    ProcessError::Interrupted { .. } => log::debug!("{e}"),
                    _ => log::error!("{e}"),
                }
            }
            if let Some(tx) = &events {
                tx.send(event).ok();
            }
            outcome
        })
        .collect();

    let produced: usize = outcomes.iter().filter_map(|o| o.as_ref().ok()).sum();
    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    if failed == 0 {
        return Ok(produced);
    }

    log::warn!("{failed} of {total_files} file(s) failed; {produced} output file(s) were written");
    let mut errors: Vec<ProcessError> = outcomes.into_iter().filter_map(Result::err).collect();
    let first = errors
        .iter()
        .position(|e| matches!(e, ProcessError::Interrupted { .. }))
        .unwrap_or(0);
    Err(errors.swap_remove(first))
}
