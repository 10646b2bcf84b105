use thiserror::Error;

/// Error taxonomy shared by the contab services.
///
/// `Parse` is always per-document and recoverable by skipping the document.
/// Uniqueness violations are not errors here: the posting layer reports
/// them as a duplicate outcome in its result type. `ConfigError` means the
/// installation itself is broken (missing seed data, bad environment) and
/// must never be downgraded to a per-document failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not process {source_name}: {cause}")]
    Parse {
        source_name: String,
        cause: anyhow::Error,
    },

    #[error("not found: {0}")]
    NotFound(anyhow::Error),

    #[error("configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap any failure as a per-document parse error tagged with the
    /// source filename, so batch callers can catalog it uniformly.
    pub fn parse(source_name: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        AppError::Parse {
            source_name: source_name.into(),
            cause: cause.into(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}
