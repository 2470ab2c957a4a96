use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors returned by this crate.
pub enum DumpError {
    /// An I/O error occurred while reading the dump stream or writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The input did not match the dump-stream grammar.
    ///
    /// `line` is the 1-origin input line on which the problem was detected.
    #[error("{message} at line {line}")]
    Parse {
        /// Input line number where the problem was detected.
        line: u64,
        /// Human-readable description of the problem.
        message: String,
    },
    /// The `-r`/`--range` selection spec could not be parsed.
    #[error("invalid selection range: {0}")]
    Range(String),
    /// A subcommand was invoked with ill-formed arguments.
    #[error("{0}")]
    Usage(String),
}

impl DumpError {
    /// Builds a [`DumpError::Parse`] for a diagnostic at `line`.
    pub(crate) fn parse(line: u64, message: impl Into<String>) -> Self {
        DumpError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Builds a [`DumpError::Usage`] from a message.
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        DumpError::Usage(message.into())
    }
}
