use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A caller-supplied comparator is not on the allowlist. Aborts the whole
    /// compilation; no statement fragment is produced.
    #[error("operation not allowed: comparator '{comparator}' is not permitted")]
    InjectionRejected { comparator: String },

    #[error("malformed criterion on field '{field}': {reason}")]
    MalformedCriterion { field: String, reason: String },

    #[error("unknown entity class '{0}'")]
    UnknownEntityClass(String),

    #[error("invalid criteria document: {0}")]
    InvalidDocument(String),
}

impl Error {
    pub(crate) fn malformed(field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCriterion {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised by the comparator allowlist.
    pub fn is_injection(&self) -> bool {
        matches!(self, Self::InjectionRejected { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDocument(err.to_string())
    }
}
