//! Variant generation: the offline batch job.
//!
//! Mirrors the input directory into the output directory under the variant
//! expansion rule: every source becomes `|widths| × 2` files (see
//! [`contract`](crate::contract)).
//!
//! ## Run Order
//!
//! ```text
//! 1. --clean      remove the output directory
//! 2. mkdir        ensure the output directory exists
//! 3. sweep        delete orphaned variants (see sweep)
//! 4. discover     list sources, assign each encoding of a stem to one source
//! 5. process      per source: freshness check, then decode once and
//!                 encode every width × encoding
//! ```
//!
//! ## Parallel Processing
//!
//! One [rayon](https://docs.rs/rayon) pool runs everything. `source_workers`
//! logical workers pull sources from a shared queue until it is empty; inside a
//! source, the width × encoding encodes are rayon tasks on the same pool. The
//! number of encodes in flight is therefore bounded by the pool size, not by
//! `workers × widths × 2`.
//!
//! ## Failures
//!
//! A source that cannot be read, decoded, or written is reported as
//! [`SourceStatus::Failed`] and the run continues. Its variant set stays
//! incomplete, so the next run's freshness check picks it up again. Only
//! run-level problems (missing input directory, unusable output directory)
//! return [`OptimizeError`].

use crate::config::{PipelineConfig, effective_threads};
use crate::contract::{Encoding, RasterFamily, encodings_for, parse_source_filename, variant_filename};
use crate::freshness::{FreshnessStats, check_freshness};
use crate::imaging::{BackendError, EncodeParams, EncodeSettings, ImageBackend, RustBackend};
use crate::sweep::{list_files, sweep_orphans};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Resolved input and output directories for a run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl RunPaths {
    pub fn from_config(config: &PipelineConfig, project_root: &Path) -> Self {
        Self {
            input_dir: config.input_dir(project_root),
            output_dir: config.output_dir(project_root),
        }
    }
}

/// The two CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Delete the whole output directory first.
    pub clean: bool,
    /// Regenerate every source, ignoring freshness.
    pub force: bool,
}

/// Progress events emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum OptimizeEvent {
    OrphanRemoved { file: String },
    SourceSkipped { source: String },
    SourceEncoded { source: String, variants: usize },
    SourceFailed { source: String, error: String },
    SourceDuplicate { source: String, of: String },
}

/// Outcome of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceStatus {
    /// Every variant was already fresh; nothing was encoded.
    Fresh,
    /// All variants were (re)generated.
    Encoded { variants: usize },
    Failed { error: String },
    /// Every variant this source would write belongs to an earlier source
    /// with the same stem (`a.jpg` and `a.jpeg`).
    Duplicate { of: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    /// Source file name, e.g. `sunset.jpg`.
    pub source: String,
    pub stem: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Structured result of a run.
#[derive(Debug, Default)]
pub struct OptimizeReport {
    /// One entry per recognized source, sorted by file name.
    pub outcomes: Vec<SourceOutcome>,
    pub orphans_removed: Vec<PathBuf>,
    pub stats: FreshnessStats,
}

impl OptimizeReport {
    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SourceStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn outcome(&self, source: &str) -> Option<&SourceOutcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }
}

/// Everything needed to process one source.
#[derive(Debug, Clone)]
pub struct SourceJob {
    pub source: String,
    pub path: PathBuf,
    pub stem: String,
    pub family: RasterFamily,
    pub widths: Vec<u32>,
    /// Encodings this source writes. A source whose stem is shared with an
    /// earlier one leaves the shared encodings to that source.
    pub encodings: Vec<Encoding>,
    output_dir: PathBuf,
}

impl SourceJob {
    pub fn output_path(&self, width: u32, encoding: Encoding) -> PathBuf {
        self.output_dir
            .join(variant_filename(&self.stem, width, encoding))
    }

    /// Every variant path this source writes: per width, next-gen then raster.
    pub fn expected_outputs(&self) -> Vec<PathBuf> {
        self.widths
            .iter()
            .flat_map(|&w| self.encodings.iter().map(move |&e| self.output_path(w, e)))
            .collect()
    }
}

/// Sources found in the input directory.
#[derive(Debug, Default)]
pub struct Discovery {
    pub jobs: Vec<SourceJob>,
    /// Sources with nothing left to write: every encoding was claimed by an
    /// earlier source with the same stem.
    pub duplicates: Vec<SourceOutcome>,
}

/// List the input directory and plan a job per recognized source.
///
/// Files are taken in name order. Sources sharing a stem share file names:
/// `a.jpg` and `a.png` both map to `a-{w}.webp`. Each encoding is written by
/// the first source that needs it, so `a.jpg` writes the `.webp` and `.jpg`
/// sets and `a.png` only its `.png` set.
pub fn discover_sources(
    input_dir: &Path,
    output_dir: &Path,
    widths: &[u32],
) -> io::Result<Discovery> {
    let mut discovery = Discovery::default();
    let mut claimed: HashMap<(String, Encoding), String> = HashMap::new();

    for (name, path) in list_files(input_dir)? {
        let Some(parsed) = parse_source_filename(&name) else {
            continue;
        };
        let mut encodings = Vec::new();
        let mut owner = None;
        for encoding in encodings_for(parsed.family) {
            match claimed.get(&(parsed.stem.clone(), encoding)) {
                Some(first) => {
                    tracing::warn!(
                        source = %name,
                        "stem collision: .{encoding} variants come from {first}"
                    );
                    owner = Some(first.clone());
                }
                None => {
                    claimed.insert((parsed.stem.clone(), encoding), name.clone());
                    encodings.push(encoding);
                }
            }
        }
        if encodings.is_empty() {
            discovery.duplicates.push(SourceOutcome {
                source: name,
                stem: parsed.stem,
                status: SourceStatus::Duplicate {
                    of: owner.unwrap_or_default(),
                },
            });
            continue;
        }
        discovery.jobs.push(SourceJob {
            source: name,
            path,
            stem: parsed.stem,
            family: parsed.family,
            widths: widths.to_vec(),
            encodings,
            output_dir: output_dir.to_path_buf(),
        });
    }
    Ok(discovery)
}

/// Run `work` over `items` with `workers` logical workers pulling from one
/// shared queue.
///
/// Each worker pops the next item until the queue is empty. Items are consumed
/// exactly once; results come back in completion order.
pub fn run_queue<T, R, F>(pool: &rayon::ThreadPool, items: Vec<T>, workers: usize, work: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let queue = Mutex::new(VecDeque::from(items));
    let results = Mutex::new(Vec::new());

    pool.scope(|scope| {
        for _ in 0..workers.max(1) {
            scope.spawn(|_| {
                loop {
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some(item) = next else { break };
                    let result = work(item);
                    results
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(result);
                }
            });
        }
    });

    results.into_inner().unwrap_or_else(PoisonError::into_inner)
}

/// Decode once, then resize and encode every width × encoding in parallel.
///
/// Stops at the first failed encode. Returns the number of variants written.
fn encode_source(
    backend: &impl ImageBackend,
    job: &SourceJob,
    settings: &EncodeSettings,
) -> Result<usize, BackendError> {
    let image = backend.decode(&job.path)?;

    job.widths.par_iter().try_for_each(|&width| {
        let resized = backend.resize(&image, width);
        job.encodings.par_iter().try_for_each(|&encoding| {
            backend.encode(
                &resized,
                &EncodeParams {
                    output: job.output_path(width, encoding),
                    format: settings.format_for(encoding),
                },
            )
        })
    })?;

    Ok(job.widths.len() * job.encodings.len())
}

fn process_source(
    backend: &impl ImageBackend,
    job: &SourceJob,
    settings: &EncodeSettings,
    force: bool,
) -> SourceStatus {
    if !force {
        match check_freshness(&job.path, &job.expected_outputs()) {
            Ok(freshness) if freshness.is_fresh() => return SourceStatus::Fresh,
            Ok(_) => {}
            Err(e) => {
                return SourceStatus::Failed {
                    error: format!("cannot read source: {e}"),
                };
            }
        }
    }
    match encode_source(backend, job, settings) {
        Ok(variants) => SourceStatus::Encoded { variants },
        Err(e) => SourceStatus::Failed {
            error: e.to_string(),
        },
    }
}

fn emit(events: Option<&Sender<OptimizeEvent>>, event: OptimizeEvent) {
    if let Some(tx) = events {
        // Receiver gone means nobody is printing; the run carries on
        let _ = tx.send(event);
    }
}

fn event_for(outcome: &SourceOutcome) -> OptimizeEvent {
    let source = outcome.source.clone();
    match &outcome.status {
        SourceStatus::Fresh => OptimizeEvent::SourceSkipped { source },
        SourceStatus::Encoded { variants } => OptimizeEvent::SourceEncoded {
            source,
            variants: *variants,
        },
        SourceStatus::Failed { error } => OptimizeEvent::SourceFailed {
            source,
            error: error.clone(),
        },
        SourceStatus::Duplicate { of } => OptimizeEvent::SourceDuplicate {
            source,
            of: of.clone(),
        },
    }
}

fn log_outcome(outcome: &SourceOutcome) {
    match &outcome.status {
        SourceStatus::Fresh => tracing::debug!(source = %outcome.source, "fresh, skipped"),
        SourceStatus::Encoded { variants } => {
            tracing::debug!(source = %outcome.source, variants, "encoded")
        }
        SourceStatus::Failed { error } => {
            tracing::warn!(source = %outcome.source, "source failed: {error}")
        }
        SourceStatus::Duplicate { of } => {
            tracing::warn!(source = %outcome.source, "every variant comes from {of}, skipped")
        }
    }
}

/// Run the generator with the production backend.
pub fn optimize(
    config: &PipelineConfig,
    paths: &RunPaths,
    options: RunOptions,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeReport, OptimizeError> {
    optimize_with_backend(&RustBackend::new(), config, paths, options, events)
}

/// Run the generator with a specific backend (allows testing with mock).
pub fn optimize_with_backend(
    backend: &impl ImageBackend,
    config: &PipelineConfig,
    paths: &RunPaths,
    options: RunOptions,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeReport, OptimizeError> {
    if !paths.input_dir.is_dir() {
        return Err(OptimizeError::InputNotFound(paths.input_dir.clone()));
    }
    let events = events.as_ref();
    let widths = &config.generator.widths;

    if options.clean {
        match std::fs::remove_dir_all(&paths.output_dir) {
            Ok(()) => tracing::info!(dir = %paths.output_dir.display(), "cleaned output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    std::fs::create_dir_all(&paths.output_dir)?;

    let mut report = OptimizeReport::default();

    let sweep = sweep_orphans(&paths.input_dir, &paths.output_dir, widths)?;
    for path in &sweep.removed {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        emit(events, OptimizeEvent::OrphanRemoved { file });
    }
    report.orphans_removed = sweep.removed;

    let discovery = discover_sources(&paths.input_dir, &paths.output_dir, widths)?;
    for duplicate in &discovery.duplicates {
        log_outcome(duplicate);
        emit(events, event_for(duplicate));
    }

    let threads = effective_threads(&config.processing);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    let settings = EncodeSettings::from_generator_config(&config.generator);
    tracing::info!(
        sources = discovery.jobs.len(),
        workers = config.processing.source_workers,
        threads,
        force = options.force,
        "processing sources"
    );

    let mut outcomes = run_queue(
        &pool,
        discovery.jobs,
        config.processing.source_workers,
        |job| {
            let status = process_source(backend, &job, &settings, options.force);
            let outcome = SourceOutcome {
                source: job.source,
                stem: job.stem,
                status,
            };
            log_outcome(&outcome);
            emit(events, event_for(&outcome));
            outcome
        },
    );
    outcomes.extend(discovery.duplicates);
    outcomes.sort_by(|a, b| a.source.cmp(&b.source));

    for outcome in &outcomes {
        match outcome.status {
            SourceStatus::Fresh => report.stats.fresh += 1,
            SourceStatus::Encoded { .. } => report.stats.encoded += 1,
            SourceStatus::Failed { .. } => report.stats.failed += 1,
            SourceStatus::Duplicate { .. } => report.stats.duplicates += 1,
        }
    }
    report.stats.orphans_removed = report.orphans_removed.len() as u32;
    report.outcomes = outcomes;
    tracing::info!(summary = %report.stats, "run complete");
    Ok(report)
}
