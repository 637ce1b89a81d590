use thiserror::Error;

/// Severity of an outcome, ordered from harmless to unrecoverable.
///
/// `NotImplemented` and `NotFound` rank above `Error` so that any batch
/// containing them is at least as bad as a plain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusCode {
    Ok,
    Warning,
    Error,
    NotImplemented,
    NotFound,
    Abort,
    Fatal,
}

impl StatusCode {
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }

    /// Anything at or above `Error` stops the current operation.
    pub fn is_failure(self) -> bool {
        self >= StatusCode::Error
    }
}

/// Outcome of an operation that succeeded, possibly in a degraded way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Ok,
    Warning,
}

impl Status {
    /// Worst status wins.
    pub fn worst(self, other: Status) -> Status {
        self.max(other)
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl From<Status> for StatusCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => StatusCode::Ok,
            Status::Warning => StatusCode::Warning,
        }
    }
}

#[derive(Error, Debug)]
pub enum CsmError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Cipher error: {0}")]
    Cipher(String),

    #[error("Bad passphrase for key '{0}'")]
    BadPassphrase(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Aborted: {0}")]
    Abort(String),

    #[error("Fatal: {0}")]
    Fatal(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl CsmError {
    pub fn code(&self) -> StatusCode {
        match self {
            CsmError::NotFound(_) => StatusCode::NotFound,
            CsmError::NotImplemented(_) => StatusCode::NotImplemented,
            CsmError::Abort(_) => StatusCode::Abort,
            CsmError::Fatal(_) => StatusCode::Fatal,
            CsmError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NotFound,
            _ => StatusCode::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, CsmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(StatusCode::Ok < StatusCode::Warning);
        assert!(StatusCode::Warning < StatusCode::Error);
        assert!(StatusCode::Error < StatusCode::NotImplemented);
        assert!(StatusCode::Error < StatusCode::NotFound);
        assert!(StatusCode::NotFound < StatusCode::Abort);
        assert!(StatusCode::Abort < StatusCode::Fatal);
        assert!(StatusCode::NotFound.is_failure());
        assert!(!StatusCode::Warning.is_failure());
    }

    #[test]
    fn worst_status_wins() {
        assert_eq!(Status::Ok.worst(Status::Ok), Status::Ok);
        assert_eq!(Status::Ok.worst(Status::Warning), Status::Warning);
        assert_eq!(Status::Warning.worst(Status::Ok), Status::Warning);
    }

    #[test]
    fn error_codes() {
        assert_eq!(
            CsmError::NotFound("x".into()).code(),
            StatusCode::NotFound
        );
        assert_eq!(CsmError::Format("x".into()).code(), StatusCode::Error);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CsmError::Io(io).code(), StatusCode::NotFound);
    }
}
