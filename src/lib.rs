//! desksort - sort documents into category directories chosen by a text classifier
//!
//! This library extracts text from plain text, PDF, Word and image files, asks a
//! chat completion endpoint to name a category for each file, moves the file into
//! a matching subdirectory, and records every move so a run can be rolled back.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod file_kind;
pub mod file_organizer;
pub mod output;
pub mod resolver;
pub mod rollback;
pub mod scanner;

pub use classifier::{ClassifierClient, ClassifyError, HttpTransport, Transport};
pub use config::{ConfigError, ControlSets, OrganizerConfig};
pub use error::{Error, Result};
pub use extractor::{ExtractError, Extracted, Extractor, ExtractorRegistry};
pub use file_kind::{FileKind, KindMapper};
pub use file_organizer::{FileOrganizer, RollbackEntry, RollbackLog};
pub use resolver::resolve;
pub use rollback::{RollbackManager, RollbackReport};
pub use scanner::DirectoryScanner;

pub use cli::{OrganizeCommand, RunContext, RunSummary, run_cli};
