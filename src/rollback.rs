/// Reverting a previous run from its rollback log.
///
/// Entries are replayed in the order they were recorded. A file that is no
/// longer where the run put it is skipped; a file whose original location is
/// occupied again is reported as a failure and left in place.
use crate::file_organizer::{OrganizeError, OrganizeResult, RollbackEntry, RollbackLog};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a rollback.
#[derive(Debug, Default)]
pub struct RollbackReport {
    /// True when there was no rollback log to replay.
    pub no_log: bool,
    /// Number of files moved back.
    pub restored_files: usize,
    /// Entries whose file was no longer at its recorded location.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Entries that could not be restored.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Whether the rollback log was removed afterwards.
    pub log_deleted: bool,
}

impl RollbackReport {
    /// Returns the total number of entries processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if no entry failed.
    pub fn is_success(&self) -> bool {
        self.failed_restores.is_empty()
    }
}

/// Replays rollback logs.
pub struct RollbackManager;

impl RollbackManager {
    /// Reverts the run recorded in `base_path`.
    ///
    /// A missing log is not an error: the report comes back with `no_log`
    /// set and nothing is touched. The log is deleted unless some restore
    /// failed, so a partially failed rollback can be retried. Category
    /// directories created by the run are left behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the base path is missing or the log cannot be read,
    /// parsed or deleted.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use desksort::rollback::RollbackManager;
    /// use std::path::Path;
    ///
    /// match RollbackManager::rollback(Path::new("/path/to/directory")) {
    ///     Ok(report) if report.no_log => println!("No rollback log found."),
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Rollback failed: {}", e),
    /// }
    /// ```
    pub fn rollback(base_path: &Path) -> OrganizeResult<RollbackReport> {
        if !base_path.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: base_path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "base path does not exist",
                ),
            });
        }

        let mut report = RollbackReport::default();
        let Some(log) = RollbackLog::load(base_path)? else {
            tracing::info!("No rollback log found in {}", base_path.display());
            report.no_log = true;
            return Ok(report);
        };

        tracing::info!(
            "Rolling back {} move(s) recorded at {}",
            log.len(),
            log.timestamp
        );

        for entry in &log.entries {
            if !entry.new_path.exists() {
                tracing::warn!("{} is gone, skipping", entry.new_path.display());
                report.skipped_files.push((
                    entry.new_path.clone(),
                    "File not found at recorded location".to_string(),
                ));
                continue;
            }

            match Self::restore_file(entry) {
                Ok(()) => report.restored_files += 1,
                Err(reason) => {
                    tracing::warn!("Could not restore {}: {}", entry.new_path.display(), reason);
                    report.failed_restores.push((entry.new_path.clone(), reason));
                }
            }
        }

        if report.is_success() {
            RollbackLog::delete(base_path)?;
            report.log_deleted = true;
        }

        Ok(report)
    }

    /// Moves one file back to where it came from.
    fn restore_file(entry: &RollbackEntry) -> Result<(), String> {
        if entry.original_path.exists() {
            return Err(format!(
                "{} is occupied by another file",
                entry.original_path.display()
            ));
        }

        if let Some(parent) = entry.original_path.parent()
            && !parent.is_dir()
        {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Could not recreate {}: {}", parent.display(), e))?;
        }

        fs::rename(&entry.new_path, &entry.original_path)
            .map_err(|e| format!("Failed to restore file: {}", e))
    }
}
