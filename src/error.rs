use std::backtrace::Backtrace;
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("variable `{0}` is already defined")]
    DuplicateVariable(String),

    #[error("variable `{0}` was given an empty domain")]
    EmptyDomain(String),

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("constraint over {arity} variable(s) requires {expected}")]
    ArityMismatch { arity: usize, expected: &'static str },

    #[error("cannot parse constraint `{expr}`: {reason}")]
    Parse { expr: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Inner: {inner}\n{backtrace}")]
    Inner {
        inner: Box<SolverError>,
        backtrace: Box<Backtrace>,
    },
}

impl From<SolverError> for Error {
    fn from(inner: SolverError) -> Self {
        Error::Inner {
            inner: Box::new(inner),
            backtrace: Box::new(std::backtrace::Backtrace::capture()),
        }
    }
}

impl Error {
    /// The underlying solver error, without the captured backtrace.
    pub fn inner(&self) -> &SolverError {
        match self {
            Error::Inner { inner, .. } => inner,
        }
    }
}
