//! Scanning and dispatching an organize run.
//!
//! A run walks through [`Phase`]s in order:
//!
//! 1. **Scanning**: breadth-first walk from the root with an explicit queue.
//!    Canonical output folders directly under the root are skipped, every other
//!    folder is recorded (parents before children) and assigned to the work
//!    unit of its top-level ancestor. Loose root files form their own unit.
//! 2. **Dispatching**: one task per unit, on a rayon pool or sequentially.
//!    Files inside a task are relocated one after another.
//! 3. **Draining**: every task result is folded into the [`RunReport`];
//!    failures are logged, never dropped, and never cancel other tasks.
//! 4. **Done**: extension snapshots are taken and emptied folders removed.
use crate::cleanup;
use crate::config::{CompiledFilters, DispatchMode, DispatchSettings, OrganizerConfig};
use crate::error::{OrganizeError, OrganizeResult, RelocateError};
use crate::file_category::{Category, Route, RoutingTable};
use crate::file_organizer::{FileEntry, FileOrganizer, Relocation};
use crate::fs_ops::{EntryKind, FileSystem, LocalFileSystem};
use crate::output::OutputFormatter;
use crate::registry::ExtensionRegistry;
use crate::transliterate::{normalize_file_name, transliterate};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Start,
    Scanning,
    Dispatching,
    Draining,
    Done,
}

/// Folders handled by one task: a top-level folder and its subtree, or the
/// root alone for loose root files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub top: PathBuf,
    /// Folders whose immediate files belong to this unit, parents first.
    pub dirs: Vec<PathBuf>,
}

impl WorkUnit {
    fn new(top: PathBuf) -> Self {
        Self {
            dirs: vec![top.clone()],
            top,
        }
    }
}

/// Result of the scanning phase.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub units: Vec<WorkUnit>,
    /// Non-canonical folders in discovery order. The root is not included.
    pub directories: Vec<PathBuf>,
    pub failures: Vec<TaskFailure>,
}

/// A failure that stopped (part of) a task.
#[derive(Debug)]
pub struct TaskFailure {
    /// Top folder of the affected unit.
    pub unit: PathBuf,
    pub error: RelocateError,
}

/// Counters and errors collected by one task.
#[derive(Debug, Default)]
struct TaskReport {
    moved: usize,
    extracted: usize,
    excluded: usize,
    per_category: BTreeMap<String, usize>,
    skipped: Vec<RelocateError>,
    failed: Vec<RelocateError>,
    failure: Option<TaskFailure>,
}

/// Everything a run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub moved: usize,
    pub extracted: usize,
    /// Files left alone by the configured filters.
    pub excluded: usize,
    /// Relocated files per category folder name.
    pub per_category: BTreeMap<String, usize>,
    /// Recovered conditions: vanished files, unreadable archives.
    pub skipped: Vec<RelocateError>,
    /// Files that could not be moved or deleted.
    pub failed: Vec<RelocateError>,
    pub task_failures: Vec<TaskFailure>,
    pub removed_dirs: Vec<PathBuf>,
    pub cleanup_failures: Vec<RelocateError>,
    pub known_extensions: BTreeSet<String>,
    pub undefined_extensions: BTreeSet<String>,
}

impl RunReport {
    /// Files moved or unpacked.
    pub fn relocated(&self) -> usize {
        self.moved + self.extracted
    }

    /// True when nothing failed. Skips and cleanup leftovers do not count.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.task_failures.is_empty()
    }

    fn absorb(&mut self, task: TaskReport) {
        self.moved += task.moved;
        self.extracted += task.extracted;
        self.excluded += task.excluded;
        for (category, count) in task.per_category {
            *self.per_category.entry(category).or_insert(0) += count;
        }
        self.skipped.extend(task.skipped);
        self.failed.extend(task.failed);
        if let Some(failure) = task.failure {
            warn!(unit = %failure.unit.display(), "task stopped early: {}", failure.error);
            self.task_failures.push(failure);
        }
    }
}

/// A relocation the dry run would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    /// Target file, or unpack folder for archives.
    pub destination: PathBuf,
    pub route: Route,
}

/// Organizes one root directory.
///
/// The extension registry and folder list belong to the organizer and are
/// reset at the start of every run.
pub struct Organizer {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    routes: RoutingTable,
    filters: CompiledFilters,
    settings: DispatchSettings,
    registry: ExtensionRegistry,
    directories: Vec<PathBuf>,
    phase: Phase,
}

impl Organizer {
    /// Creates an organizer for `root` on the local filesystem.
    ///
    /// # Errors
    ///
    /// [`OrganizeError::InvalidRoot`] if `root` is not an existing directory,
    /// [`OrganizeError::Config`] if the filter patterns do not compile.
    pub fn new(root: &Path, config: &OrganizerConfig) -> OrganizeResult<Self> {
        if !root.exists() {
            return Err(OrganizeError::InvalidRoot {
                path: root.to_path_buf(),
                reason: "does not exist".to_string(),
            });
        }
        if !root.is_dir() {
            return Err(OrganizeError::InvalidRoot {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            fs: Arc::new(LocalFileSystem),
            routes: RoutingTable::with_extra_routes(&config.routes),
            filters: config.compile_filters()?,
            settings: config.organizer.clone(),
            registry: ExtensionRegistry::new(),
            directories: Vec::new(),
            phase: Phase::Start,
        })
    }

    /// Replaces the filesystem implementation.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "phase {:?} -> {:?}", self.phase, next);
        debug!(from = ?self.phase, to = ?next, "phase change");
        self.phase = next;
    }

    fn reset(&mut self) {
        self.registry = ExtensionRegistry::new();
        self.directories.clear();
        self.phase = Phase::Start;
    }

    /// Runs a full organize pass.
    ///
    /// Per-file and per-folder problems end up in the report; only an
    /// unreadable root or a worker pool that fails to start is an `Err`.
    pub fn run(&mut self) -> OrganizeResult<RunReport> {
        self.reset();
        info!(root = %self.root.display(), "organizing");

        self.advance(Phase::Scanning);
        let scan = self.scan()?;
        self.directories = scan.directories;

        self.advance(Phase::Dispatching);
        let outcomes = self.dispatch(&scan.units)?;

        self.advance(Phase::Draining);
        let mut report = RunReport::default();
        for failure in scan.failures {
            warn!(unit = %failure.unit.display(), "scan incomplete: {}", failure.error);
            report.task_failures.push(failure);
        }
        for outcome in outcomes {
            report.absorb(outcome);
        }

        self.advance(Phase::Done);
        report.known_extensions = self.registry.known();
        report.undefined_extensions = self.registry.undefined();

        let cleanup = cleanup::remove_empty_dirs(self.fs.as_ref(), &self.directories);
        report.removed_dirs = cleanup.removed;
        report.cleanup_failures = cleanup.failed;

        info!(
            moved = report.moved,
            extracted = report.extracted,
            failed = report.failed.len(),
            "run complete"
        );
        Ok(report)
    }

    /// Scans and classifies without touching the disk.
    pub fn plan(&mut self) -> OrganizeResult<Vec<PlannedMove>> {
        self.reset();
        self.advance(Phase::Scanning);
        let scan = self.scan()?;
        self.directories = scan.directories;

        let mut planned = Vec::new();
        for unit in &scan.units {
            for dir in &unit.dirs {
                let Ok(entries) = self.fs.list_directory(dir) else {
                    warn!(dir = %dir.display(), "cannot list, left out of the plan");
                    continue;
                };
                for entry in entries.into_iter().filter(|e| e.kind == EntryKind::File) {
                    if !self.filters.should_include(&self.root, &entry.path) {
                        continue;
                    }
                    let file = FileEntry::new(entry.path);
                    let route = self.classify(&file);
                    let target_dir = route.target_dir(&self.root);
                    let destination = match route.category {
                        Category::Archives => target_dir.join(transliterate(&file.stem())),
                        _ => target_dir.join(normalize_file_name(&file.file_name())),
                    };
                    planned.push(PlannedMove {
                        source: file.path,
                        destination,
                        route,
                    });
                }
            }
        }

        self.advance(Phase::Done);
        Ok(planned)
    }

    /// Breadth-first scan from the root.
    fn scan(&self) -> OrganizeResult<ScanResult> {
        let root_entries =
            self.fs
                .list_directory(&self.root)
                .map_err(|e| OrganizeError::InvalidRoot {
                    path: self.root.clone(),
                    reason: e.to_string(),
                })?;

        let mut result = ScanResult::default();
        result.units.push(WorkUnit::new(self.root.clone()));
        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();

        for entry in root_entries {
            if entry.kind != EntryKind::Directory {
                continue;
            }
            if Category::is_canonical_dir(&entry.name()) {
                debug!(dir = %entry.path.display(), "skipping output folder");
                continue;
            }
            result.units.push(WorkUnit::new(entry.path.clone()));
            result.directories.push(entry.path.clone());
            queue.push_back((entry.path, result.units.len() - 1));
        }

        while let Some((dir, unit)) = queue.pop_front() {
            let entries = match self.fs.list_directory(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    result.failures.push(TaskFailure {
                        unit: result.units[unit].top.clone(),
                        error: RelocateError::ListFailed { path: dir, source: e },
                    });
                    continue;
                }
            };
            for entry in entries {
                match entry.kind {
                    EntryKind::Directory => {
                        result.units[unit].dirs.push(entry.path.clone());
                        result.directories.push(entry.path.clone());
                        queue.push_back((entry.path, unit));
                    }
                    EntryKind::Other => {
                        debug!(path = %entry.path.display(), "not a regular file or folder, ignored");
                    }
                    EntryKind::File => {}
                }
            }
        }

        debug!(
            units = result.units.len(),
            directories = result.directories.len(),
            "scan finished"
        );
        Ok(result)
    }

    fn dispatch(&self, units: &[WorkUnit]) -> OrganizeResult<Vec<TaskReport>> {
        let progress = if self.settings.show_progress {
            OutputFormatter::create_progress_bar(units.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        let outcomes: Vec<TaskReport> = match self.settings.mode {
            DispatchMode::Sequential => units
                .iter()
                .progress_with(progress.clone())
                .map(|unit| self.run_unit(unit))
                .collect(),
            DispatchMode::Parallel => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.settings.workers)
                    .thread_name(|i| format!("dirsort-worker-{i}"))
                    .build()?;
                debug!(workers = pool.current_num_threads(), "worker pool started");
                pool.install(|| {
                    units
                        .par_iter()
                        .progress_with(progress.clone())
                        .map(|unit| self.run_unit(unit))
                        .collect()
                })
            }
        };
        progress.finish_and_clear();
        Ok(outcomes)
    }

    /// Relocates the files of one unit, sequentially.
    fn run_unit(&self, unit: &WorkUnit) -> TaskReport {
        let organizer = FileOrganizer::new(&self.root, self.fs.as_ref());
        let mut report = TaskReport::default();

        for dir in &unit.dirs {
            let entries = match self.fs.list_directory(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    report.failure = Some(TaskFailure {
                        unit: unit.top.clone(),
                        error: RelocateError::ListFailed {
                            path: dir.clone(),
                            source: e,
                        },
                    });
                    break;
                }
            };

            for entry in entries.into_iter().filter(|e| e.kind == EntryKind::File) {
                if !self.filters.should_include(&self.root, &entry.path) {
                    debug!(file = %entry.path.display(), "excluded by filters");
                    report.excluded += 1;
                    continue;
                }
                let file = FileEntry::new(entry.path);
                let route = self.classify(&file);
                match organizer.relocate(&file, &route) {
                    Ok(Relocation::Moved { .. }) => {
                        report.moved += 1;
                        *report
                            .per_category
                            .entry(route.category.dir_name().to_string())
                            .or_insert(0) += 1;
                    }
                    Ok(Relocation::Extracted { .. }) => {
                        report.extracted += 1;
                        *report
                            .per_category
                            .entry(route.category.dir_name().to_string())
                            .or_insert(0) += 1;
                    }
                    Ok(Relocation::Skipped { reason, .. }) => report.skipped.push(reason),
                    Err(e) => {
                        warn!("{e}");
                        report.failed.push(e);
                    }
                }
            }
        }
        report
    }

    /// Routes a file and records its extension.
    fn classify(&self, file: &FileEntry) -> Route {
        let route = self.routes.classify(&file.extension);
        if !file.extension.is_empty()
            && self
                .registry
                .record(&file.extension, self.routes.contains(&file.extension))
        {
            debug!(extension = %file.extension, known = route.is_known(), "new extension");
        }
        route
    }
}
