/// Moving files into category directories and recording the moves.
///
/// Every successful move produces a [`RollbackEntry`]. Entries are collected
/// in a [`RollbackLog`] which is persisted as JSON inside the base directory
/// so the run can be reverted later.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File name of the persisted rollback log inside the base directory.
pub const ROLLBACK_LOG_FILE: &str = ".desksort_rollback.json";

/// One recorded move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackEntry {
    /// The path of the file before organization.
    pub original_path: PathBuf,
    /// The path of the file after organization.
    pub new_path: PathBuf,
    /// The category the file was moved to.
    pub category: String,
}

/// Ordered record of the moves made by one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackLog {
    /// RFC 3339 timestamp of when the run started.
    pub timestamp: String,
    /// The base directory the run organized.
    pub base_path: PathBuf,
    /// Moves in the order they happened.
    pub entries: Vec<RollbackEntry>,
}

impl RollbackLog {
    /// Creates an empty log for a base path.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_path,
            entries: Vec::new(),
        }
    }

    /// Appends a move.
    pub fn record(&mut self, entry: RollbackEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the path of the log file for a base path.
    pub fn file_path(base_path: &Path) -> PathBuf {
        base_path.join(ROLLBACK_LOG_FILE)
    }

    /// Writes this log to disk as pretty-printed JSON.
    pub fn save(&self, base_path: &Path) -> OrganizeResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            OrganizeError::HistoryWriteFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }
        })?;

        fs::write(Self::file_path(base_path), json)
            .map_err(|source| OrganizeError::HistoryWriteFailed { source })
    }

    /// Loads the log for a base path, or `None` if no run was recorded.
    pub fn load(base_path: &Path) -> OrganizeResult<Option<Self>> {
        let path = Self::file_path(base_path);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .map_err(|source| OrganizeError::HistoryReadFailed { source })?;
        let log = serde_json::from_str(&json).map_err(|e| OrganizeError::InvalidHistoryFormat {
            reason: e.to_string(),
        })?;
        Ok(Some(log))
    }

    /// Removes the log file for a base path if it exists.
    pub fn delete(base_path: &Path) -> OrganizeResult<()> {
        let path = Self::file_path(base_path);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| OrganizeError::HistoryWriteFailed { source })?;
        }
        Ok(())
    }
}

/// Errors that can occur while scanning or moving files.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot move {} to {}: destination already exists", .file.display(), .destination.display())]
    DestinationExists { file: PathBuf, destination: PathBuf },

    #[error("Failed to move {} to {}: {source}", .file.display(), .destination.display())]
    FileMoveFailure {
        file: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid base path {}: {source}", .path.display())]
    InvalidBasePath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Category {0:?} does not name a directory below the base path")]
    InvalidCategory(String),

    #[error("Category {0:?} is an excluded directory")]
    ExcludedCategory(String),

    #[error("Failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write rollback log: {source}")]
    HistoryWriteFailed { source: std::io::Error },

    #[error("Failed to read rollback log: {source}")]
    HistoryReadFailed { source: std::io::Error },

    #[error("Invalid rollback log format: {reason}")]
    InvalidHistoryFormat { reason: String },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Moves files into category subdirectories of a base directory.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves a file into `base_path/category` and returns the recorded move.
    ///
    /// The category directory is created if needed, including intermediate
    /// directories for nested categories. An existing file at the destination
    /// is never overwritten.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use desksort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let entry = FileOrganizer::move_to_category(
    ///     Path::new("/path/to/base"),
    ///     Path::new("/path/to/base/q3.pdf"),
    ///     "Reports",
    /// );
    ///
    /// match entry {
    ///     Ok(e) => println!("Moved {} to {}", e.original_path.display(), e.new_path.display()),
    ///     Err(e) => eprintln!("Move failed: {}", e),
    /// }
    /// ```
    pub fn move_to_category(
        base_path: &Path,
        file_path: &Path,
        category: &str,
    ) -> OrganizeResult<RollbackEntry> {
        if !base_path.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: base_path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "base path does not exist",
                ),
            });
        }

        if !Self::is_contained(category) {
            return Err(OrganizeError::InvalidCategory(category.to_string()));
        }

        let category_path = base_path.join(category);
        if !category_path.is_dir() {
            fs::create_dir_all(&category_path).map_err(|source| {
                OrganizeError::DirectoryCreationFailed {
                    path: category_path.clone(),
                    source,
                }
            })?;
        }

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                file: file_path.to_path_buf(),
                destination: category_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        let destination_path = category_path.join(file_name);
        if destination_path.exists() {
            return Err(OrganizeError::DestinationExists {
                file: file_path.to_path_buf(),
                destination: destination_path,
            });
        }

        fs::rename(file_path, &destination_path).map_err(|source| {
            OrganizeError::FileMoveFailure {
                file: file_path.to_path_buf(),
                destination: destination_path.clone(),
                source,
            }
        })?;

        tracing::info!(
            "Moved {} to {}",
            file_path.display(),
            destination_path.display()
        );

        Ok(RollbackEntry {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
            category: category.to_string(),
        })
    }

    /// True if `category` is a relative path made of plain names.
    fn is_contained(category: &str) -> bool {
        let path = Path::new(category);
        path.components().next().is_some()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_to_existing_category() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir(base_path.join("Reports")).unwrap();

        let file_path = base_path.join("q3.txt");
        fs::write(&file_path, "numbers").unwrap();

        let entry = FileOrganizer::move_to_category(base_path, &file_path, "Reports")
            .expect("Failed to move file");

        assert!(!file_path.exists());
        assert!(base_path.join("Reports/q3.txt").exists());
        assert_eq!(entry.original_path, file_path);
        assert_eq!(entry.new_path, base_path.join("Reports").join("q3.txt"));
        assert_eq!(entry.category, "Reports");
    }

    #[test]
    fn test_move_creates_nested_category() {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path();
        let file_path = base_path.join("w2.txt");
        fs::write(&file_path, "wages").unwrap();

        FileOrganizer::move_to_category(base_path, &file_path, "Taxes/2023").unwrap();

        assert!(base_path.join("Taxes/2023/w2.txt").exists());
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path();
        fs::create_dir(base_path.join("Reports")).unwrap();
        fs::write(base_path.join("Reports/q3.txt"), "older").unwrap();
        let file_path = base_path.join("q3.txt");
        fs::write(&file_path, "newer").unwrap();

        let result = FileOrganizer::move_to_category(base_path, &file_path, "Reports");

        assert!(matches!(result, Err(OrganizeError::DestinationExists { .. })));
        assert!(file_path.exists());
        assert_eq!(
            fs::read_to_string(base_path.join("Reports/q3.txt")).unwrap(),
            "older"
        );
    }

    #[test]
    fn test_move_rejects_escaping_category() {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path();
        let file_path = base_path.join("a.txt");
        fs::write(&file_path, "a").unwrap();

        for category in ["../outside", "/etc", "", "."] {
            let result = FileOrganizer::move_to_category(base_path, &file_path, category);
            assert!(
                matches!(result, Err(OrganizeError::InvalidCategory(_))),
                "category {:?} should be rejected",
                category
            );
        }
        assert!(file_path.exists());
    }

    #[test]
    fn test_move_invalid_base_path() {
        let result = FileOrganizer::move_to_category(
            Path::new("/non/existent/path"),
            Path::new("/some/file.txt"),
            "Reports",
        );
        assert!(matches!(result, Err(OrganizeError::InvalidBasePath { .. })));
    }

    #[test]
    fn test_log_save_load_delete() {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path();

        let mut log = RollbackLog::new(base_path.to_path_buf());
        log.record(RollbackEntry {
            original_path: base_path.join("a.txt"),
            new_path: base_path.join("Notes/a.txt"),
            category: "Notes".to_string(),
        });
        log.save(base_path).unwrap();
        assert!(RollbackLog::file_path(base_path).exists());

        let loaded = RollbackLog::load(base_path).unwrap().expect("log should exist");
        assert_eq!(loaded.entries, log.entries);
        assert_eq!(loaded.timestamp, log.timestamp);

        RollbackLog::delete(base_path).unwrap();
        assert!(RollbackLog::load(base_path).unwrap().is_none());
    }

    #[test]
    fn test_load_invalid_log() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(RollbackLog::file_path(temp_dir.path()), "{ not json").unwrap();

        let result = RollbackLog::load(temp_dir.path());
        assert!(matches!(
            result,
            Err(OrganizeError::InvalidHistoryFormat { .. })
        ));
    }
}
