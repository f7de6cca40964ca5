use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrxcovError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Unable to parse result file '{path}': {message}")]
    InvalidFormat { path: String, message: String },

    #[error("The coverage report processor has not been initialized")]
    NotInitialized,

    #[error("The coverage report processor has already been initialized")]
    AlreadyInitialized,

    #[error("Argument '{0}' must not be empty")]
    EmptyArgument(&'static str),

    #[error("Unknown build environment: {0}")]
    UnknownEnvironment(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrxcovError>;
