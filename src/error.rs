use thiserror::Error;

use crate::classifier::ClassifyError;
use crate::config::ConfigError;
use crate::extractor::ExtractError;
use crate::file_organizer::OrganizeError;

/// Crate-level error covering every failure a command can surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),

    #[error("No category could be resolved for {0}")]
    Unresolved(String),
}

pub type Result<T> = std::result::Result<T, Error>;
