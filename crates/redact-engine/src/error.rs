use std::path::PathBuf;

use redact_documents::ApplicatorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output {} would overwrite the input document", .0.display())]
    OutputIsInput(PathBuf),

    #[error(transparent)]
    Applicator(#[from] ApplicatorError),

    #[error("Document worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
