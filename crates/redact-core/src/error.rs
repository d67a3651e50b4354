use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Custom term must not be empty")]
    EmptyTerm,

    #[error("Invalid custom term '{term}': {source}")]
    InvalidTerm {
        term: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
