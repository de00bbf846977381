use std::path::PathBuf;

use thiserror::Error;

/// Why a single venv could not be removed.
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("no such directory")]
    NotFound,

    #[error("not a directory")]
    NotADirectory,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures that stop a front end before it can do anything useful.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("scan root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("failed to open window: {0}")]
    Gui(#[from] eframe::Error),
}
