//! Discovery of category candidates and input files.

use crate::config::ControlSets;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Category name standing for the base directory itself.
pub const BASE_CATEGORY: &str = ".";

/// Lists categories and files below one base directory.
pub struct DirectoryScanner {
    base_path: PathBuf,
    recursive: bool,
    controls: ControlSets,
}

impl DirectoryScanner {
    pub fn new(base_path: &Path, recursive: bool, controls: ControlSets) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
            recursive,
            controls,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the sorted category candidates.
    ///
    /// Recursive mode yields every non-hidden directory below the base as a
    /// `/`-separated relative path, plus `.` for the base itself. Excluded
    /// directories are neither listed nor descended into. Non-recursive mode
    /// yields immediate subdirectories only.
    pub fn list_categories(&self) -> OrganizeResult<Vec<String>> {
        let mut categories = Vec::new();

        if self.recursive {
            if !self.controls.excluded_dirs.matches(BASE_CATEGORY) {
                categories.push(BASE_CATEGORY.to_string());
            }

            let walker = WalkDir::new(&self.base_path)
                .min_depth(1)
                .follow_links(false)
                .into_iter()
                .filter_entry(|entry| entry.file_type().is_dir() && self.is_candidate(entry.path()));

            for entry in walker {
                let entry = entry.map_err(|e| OrganizeError::Scan {
                    path: self.base_path.clone(),
                    source: e.into(),
                })?;
                if let Some(relative) = self.relative_name(entry.path()) {
                    categories.push(relative);
                }
            }
        } else {
            for entry in self.read_base()? {
                let path = entry.path();
                if entry.file_type().is_ok_and(|t| t.is_dir())
                    && self.is_candidate(&path)
                    && let Some(relative) = self.relative_name(&path)
                {
                    categories.push(relative);
                }
            }
        }

        categories.sort();
        tracing::debug!("Found {} category candidate(s)", categories.len());
        Ok(categories)
    }

    /// True if `category` is an excluded directory or lies below one.
    ///
    /// Every leading part of the category is checked by name and by relative
    /// path, the same way the category walk prunes directories.
    pub fn is_excluded(&self, category: &str) -> bool {
        let excluded = &self.controls.excluded_dirs;
        let mut prefix = String::new();
        for part in category.split('/').filter(|part| !part.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            if excluded.matches(part) || excluded.matches(&prefix) {
                return true;
            }
        }
        false
    }

    /// Returns the regular files directly inside the base, sorted by name.
    ///
    /// Hidden files are skipped. When the inclusion list is non-empty only
    /// files it names are returned.
    pub fn list_files(&self) -> OrganizeResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in self.read_base()? {
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if !self.controls.include_files.is_empty()
                && !self.controls.include_files.matches(&name)
            {
                tracing::debug!("Skipping {} (not listed for organizing)", name);
                continue;
            }
            files.push(entry.path());
        }

        files.sort();
        Ok(files)
    }

    fn read_base(&self) -> OrganizeResult<Vec<fs::DirEntry>> {
        let entries = fs::read_dir(&self.base_path).map_err(|source| OrganizeError::Scan {
            path: self.base_path.clone(),
            source,
        })?;
        Ok(entries.flatten().collect())
    }

    fn is_candidate(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if hidden {
            return false;
        }
        let excluded = |candidate: &str| self.controls.excluded_dirs.matches(candidate);
        let by_name = path
            .file_name()
            .is_some_and(|name| excluded(&name.to_string_lossy()));
        let by_path = self.relative_name(path).is_some_and(|rel| excluded(&rel));
        !(by_name || by_path)
    }

    fn relative_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}
