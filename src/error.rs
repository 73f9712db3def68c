//! Error type for file handling

use std::io;

/// Errors raised while reading or writing grouping data
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred while accessing a file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line of an input file could not be understood
    #[error("line {line}: {message}")]
    Parse {
        /// Line number, starting at 1
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// The data is well-formed but does not describe a usable model
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
