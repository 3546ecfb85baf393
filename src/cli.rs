//! Run orchestration for desksort.
//!
//! This module ties the pieces together:
//! - Loading configuration, credentials and control files
//! - Scanning for files and category candidates
//! - Extracting, classifying and resolving a category per file
//! - Moving files and recording the moves for rollback
//! - Rolling back the previous run

use crate::classifier::{ClassifierClient, HttpTransport};
use crate::config::{ConfigError, ControlSets, OrganizerConfig};
use crate::error::{Error, Result};
use crate::extractor::ExtractorRegistry;
use crate::file_kind::{FileKind, KindMapper};
use crate::file_organizer::{FileOrganizer, OrganizeError, RollbackEntry, RollbackLog};
use crate::output::OutputFormatter;
use crate::resolver::resolve;
use crate::rollback::{RollbackManager, RollbackReport};
use crate::scanner::{BASE_CATEGORY, DirectoryScanner};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A CLI command to execute.
#[derive(Debug, Clone, Copy)]
pub enum OrganizeCommand {
    /// Classify and move files.
    Organize {
        /// If true, classify without moving anything.
        dry_run: bool,
    },
    /// Undo the previous run.
    Rollback,
}

/// What happened to a single file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Moved into a category directory.
    Moved(RollbackEntry),
    /// Classified as belonging to the base directory; left in place.
    Unchanged,
    /// Dry run: would have been moved into this category.
    Planned(String),
}

/// Per-run report. Failed files do not stop the run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub dry_run: bool,
    /// Files with their (planned) category.
    pub organized: Vec<(PathBuf, String)>,
    pub unchanged: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub failed: Vec<(PathBuf, String)>,
}

impl RunSummary {
    /// Number of organized files per category.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for (_, category) in &self.organized {
            *counts.entry(category.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// State for one organizer run over one base directory.
pub struct RunContext {
    base_path: PathBuf,
    scanner: DirectoryScanner,
    mapper: KindMapper,
    extractors: ExtractorRegistry,
    classifier: ClassifierClient,
    categories: Vec<String>,
}

impl RunContext {
    /// Builds a context from already-loaded parts.
    pub fn new(
        base_path: &Path,
        config: &OrganizerConfig,
        controls: ControlSets,
        classifier: ClassifierClient,
    ) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
            scanner: DirectoryScanner::new(base_path, config.recursive_categories, controls),
            mapper: KindMapper::default(),
            extractors: ExtractorRegistry::from_config(config),
            classifier,
            categories: Vec::new(),
        }
    }

    /// Loads configuration, credentials and control files for `base_path`.
    ///
    /// # Errors
    ///
    /// Fails before any file is touched if the base directory is invalid,
    /// the configuration cannot be read, or the API key is missing.
    pub fn prepare(base_path: &Path, config_path: Option<&Path>) -> Result<Self> {
        let base_path = base_path
            .canonicalize()
            .ok()
            .filter(|path| path.is_dir())
            .ok_or_else(|| ConfigError::InvalidBaseDir(base_path.to_path_buf()))?;

        let config = OrganizerConfig::load(config_path, &base_path)?;
        let api_key = config.api_key()?;
        let controls = ControlSets::load(&base_path)?;
        let transport = HttpTransport::new(&config, api_key)?;
        let classifier = ClassifierClient::new(Box::new(transport), &config);

        Ok(Self::new(&base_path, &config, controls, classifier))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Gives access to the extractor table, e.g. to register another format.
    pub fn extractors_mut(&mut self) -> &mut ExtractorRegistry {
        &mut self.extractors
    }

    /// Gives access to the kind table used to route files to extractors.
    pub fn mapper_mut(&mut self) -> &mut KindMapper {
        &mut self.mapper
    }

    /// Processes every candidate file in turn.
    ///
    /// The rollback log is written after every move and once more at the
    /// end, so an interrupted run can still be rolled back. A run that moves
    /// nothing leaves an existing log untouched.
    ///
    /// # Errors
    ///
    /// Only scanning the base directory and writing the rollback log are
    /// fatal; per-file failures are collected in the summary.
    pub fn organize(&mut self, dry_run: bool) -> Result<RunSummary> {
        let mut summary = RunSummary {
            dry_run,
            ..Default::default()
        };
        let mut log = RollbackLog::new(self.base_path.clone());

        let files = self.scanner.list_files()?;
        self.categories = self.scanner.list_categories()?;
        tracing::info!(
            "Found {} file(s) and {} category candidate(s) in {}",
            files.len(),
            self.categories.len(),
            self.base_path.display()
        );

        let pb = OutputFormatter::progress_bar(files.len() as u64);

        for path in files {
            let name = display_name(&path);
            pb.set_message(name.clone());

            let Some(kind) = self
                .mapper
                .detect(&path)
                .filter(|kind| self.extractors.supports(*kind))
            else {
                tracing::info!("Skipping {}: unsupported file type", name);
                summary
                    .skipped
                    .push((path.clone(), "unsupported file type".to_string()));
                pb.inc(1);
                continue;
            };

            match self.process_file(&path, kind, dry_run) {
                Ok(FileOutcome::Moved(entry)) => {
                    pb.suspend(|| OutputFormatter::moved(&name, &entry.category));
                    summary.organized.push((path.clone(), entry.category.clone()));
                    log.record(entry);
                    log.save(&self.base_path)?;
                    self.refresh_categories();
                }
                Ok(FileOutcome::Planned(category)) => {
                    pb.suspend(|| OutputFormatter::planned(&name, &category));
                    if !self.categories.contains(&category) {
                        self.categories.push(category.clone());
                    }
                    summary.organized.push((path.clone(), category));
                }
                Ok(FileOutcome::Unchanged) => {
                    pb.suspend(|| OutputFormatter::left_in_place(&name));
                    summary.unchanged.push(path.clone());
                }
                Err(e) => {
                    tracing::error!("Failed to organize {}: {}", name, e);
                    pb.suspend(|| OutputFormatter::failure(&name, &e.to_string()));
                    summary.failed.push((path.clone(), e.to_string()));
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if !dry_run && !log.is_empty() {
            log.save(&self.base_path)?;
        }

        Ok(summary)
    }

    /// Extract → classify → resolve → move for a single file.
    pub fn process_file(&mut self, path: &Path, kind: FileKind, dry_run: bool) -> Result<FileOutcome> {
        let name = display_name(path);
        tracing::info!("Processing {} as {}", name, kind.tag());

        let chunks = self.extractors.extract(kind, path)?.into_chunks();

        let mut labels = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            labels.push(self.classifier.classify(&name, chunk, &self.categories)?);
        }
        let category = resolve(&labels).ok_or_else(|| Error::Unresolved(name.clone()))?;
        tracing::debug!("{}: {} chunk label(s) resolved to {}", name, labels.len(), category);

        if category == BASE_CATEGORY {
            return Ok(FileOutcome::Unchanged);
        }
        if self.scanner.is_excluded(&category) {
            return Err(OrganizeError::ExcludedCategory(category).into());
        }
        if dry_run {
            return Ok(FileOutcome::Planned(category));
        }

        let entry = FileOrganizer::move_to_category(&self.base_path, path, &category)?;
        Ok(FileOutcome::Moved(entry))
    }

    fn refresh_categories(&mut self) {
        match self.scanner.list_categories() {
            Ok(categories) => self.categories = categories,
            Err(e) => tracing::warn!("Could not refresh categories: {}", e),
        }
    }
}

/// Runs a command against `dir_path`.
///
/// # Examples
///
/// ```no_run
/// use desksort::cli::{run_cli, OrganizeCommand};
/// use std::path::Path;
///
/// let result = run_cli(OrganizeCommand::Organize { dry_run: false }, Path::new("/path/to/directory"), None);
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path, config_path: Option<&Path>) -> Result<()> {
    match command {
        OrganizeCommand::Organize { dry_run } => {
            let mut context = RunContext::prepare(dir_path, config_path)?;
            if dry_run {
                OutputFormatter::dry_run_notice(&format!(
                    "Analyzing contents of: {}",
                    context.base_path().display()
                ));
            } else {
                OutputFormatter::info(&format!(
                    "Organizing contents of: {}",
                    context.base_path().display()
                ));
            }
            let summary = context.organize(dry_run)?;
            print_run_summary(&summary, context.base_path());
            Ok(())
        }
        OrganizeCommand::Rollback => {
            OutputFormatter::info("Rolling back previous organization...");
            let report = RollbackManager::rollback(dir_path)?;
            print_rollback_report(&report);
            Ok(())
        }
    }
}

fn print_run_summary(summary: &RunSummary, base_path: &Path) {
    if summary.organized.is_empty()
        && summary.unchanged.is_empty()
        && summary.failed.is_empty()
    {
        OutputFormatter::plain("No files found to organize.");
    } else {
        OutputFormatter::category_table(&summary.category_counts());
    }

    if !summary.unchanged.is_empty() {
        OutputFormatter::plain(&format!("Left in place: {}", summary.unchanged.len()));
    }
    if !summary.skipped.is_empty() {
        OutputFormatter::plain(&format!("Skipped: {}", summary.skipped.len()));
        for (path, reason) in &summary.skipped {
            OutputFormatter::plain(&format!("  - {}: {}", display_name(path), reason));
        }
    }
    if summary.has_failures() {
        OutputFormatter::warning(&format!("Failed: {}", summary.failed.len()));
        for (path, reason) in &summary.failed {
            OutputFormatter::failure(&display_name(path), reason);
        }
    }

    if summary.dry_run {
        OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
        if !summary.organized.is_empty() {
            OutputFormatter::plain(&format!(
                "Use 'desksort {} --rollback' to revert changes.",
                base_path.display()
            ));
        }
    }
}

fn print_rollback_report(report: &RollbackReport) {
    if report.no_log {
        OutputFormatter::warning("No rollback log found. Nothing to undo.");
        return;
    }

    OutputFormatter::success("Rollback complete!");
    OutputFormatter::plain(&format!("  Restored: {}", report.restored_files));

    if !report.skipped_files.is_empty() {
        OutputFormatter::plain(&format!("  Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
        }
    }

    if !report.failed_restores.is_empty() {
        OutputFormatter::warning(&format!("  Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::failure(&path.display().to_string(), reason);
        }
        OutputFormatter::warning("Rollback log was kept. Fix the issues above and try again.");
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
