//! Custom error types for the finance planner
//!
//! Every failure carries a kind (see [`ErrorKind`]), a stable string code and
//! a human-readable message. Adapters branch on the kind; they never parse the
//! message.

use thiserror::Error;

/// Classification of a [`FinanceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownProfile,
    UnknownTransaction,
    DuplicateProfile,
    InvalidProfileId,
    InvalidTransactionId,
    InvalidName,
    InvalidLabel,
    InvalidAmount,
    InvalidTag,
    CouldNotReadSaveFile,
    CouldNotWriteSaveFile,
    Storage,
    Config,
    Unknown,
}

impl ErrorKind {
    /// Stable code used in messages and adapter payloads
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnknownProfile => "UnknownProfile",
            Self::UnknownTransaction => "UnknownTransaction",
            Self::DuplicateProfile => "DuplicateProfile",
            Self::InvalidProfileId => "InvalidProfileID",
            Self::InvalidTransactionId => "InvalidTransactionID",
            Self::InvalidName => "InvalidName",
            Self::InvalidLabel => "InvalidLabel",
            Self::InvalidAmount => "InvalidAmount",
            Self::InvalidTag => "InvalidTag",
            Self::CouldNotReadSaveFile => "CouldNotReadSaveFile",
            Self::CouldNotWriteSaveFile => "CouldNotWriteSaveFile",
            Self::Storage => "StorageError",
            Self::Config => "ConfigError",
            Self::Unknown => "UnknownError",
        }
    }

    /// HTTP-style classification code for adapters
    pub const fn status_code(self) -> u16 {
        match self {
            Self::UnknownProfile | Self::UnknownTransaction => 404,
            Self::DuplicateProfile => 409,
            Self::InvalidProfileId
            | Self::InvalidTransactionId
            | Self::InvalidName
            | Self::InvalidLabel
            | Self::InvalidAmount
            | Self::InvalidTag => 400,
            _ => 500,
        }
    }
}

/// The main error type for finance planner operations
#[derive(Error, Debug)]
pub enum FinanceError {
    #[error("[UnknownProfile] {0}")]
    UnknownProfile(String),

    #[error("[UnknownTransaction] {0}")]
    UnknownTransaction(String),

    #[error("[DuplicateProfile] {0}")]
    DuplicateProfile(String),

    #[error("[InvalidProfileID] {0}")]
    InvalidProfileId(String),

    #[error("[InvalidTransactionID] {0}")]
    InvalidTransactionId(String),

    #[error("[InvalidName] {0}")]
    InvalidName(String),

    #[error("[InvalidLabel] {0}")]
    InvalidLabel(String),

    #[error("[InvalidAmount] {0}")]
    InvalidAmount(String),

    /// A tag at `index` failed validation
    #[error("[InvalidTag] {message}")]
    InvalidTag { index: usize, message: String },

    /// Flat-file backend could not read or parse a document
    #[error("[CouldNotReadSaveFile] {0}")]
    CouldNotReadSaveFile(String),

    /// Flat-file backend could not write a document
    #[error("[CouldNotWriteSaveFile] {0}")]
    CouldNotWriteSaveFile(String),

    /// Wrapped relational backend failure
    #[error("[StorageError] {0}")]
    Storage(String),

    #[error("[ConfigError] {0}")]
    Config(String),

    #[error("[UnknownError] {0}")]
    Unknown(String),
}

impl FinanceError {
    pub fn unknown_profile(identifier: impl AsRef<str>) -> Self {
        Self::UnknownProfile(format!("profile not found: {}", identifier.as_ref()))
    }

    pub fn unknown_transaction(identifier: impl AsRef<str>) -> Self {
        Self::UnknownTransaction(format!("transaction not found: {}", identifier.as_ref()))
    }

    pub fn duplicate_profile(name: impl AsRef<str>) -> Self {
        Self::DuplicateProfile(format!("profile already exists: {}", name.as_ref()))
    }

    pub fn invalid_tag(index: usize) -> Self {
        Self::InvalidTag {
            index,
            message: format!("transaction tag [{}] must not be empty", index),
        }
    }

    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownProfile(_) => ErrorKind::UnknownProfile,
            Self::UnknownTransaction(_) => ErrorKind::UnknownTransaction,
            Self::DuplicateProfile(_) => ErrorKind::DuplicateProfile,
            Self::InvalidProfileId(_) => ErrorKind::InvalidProfileId,
            Self::InvalidTransactionId(_) => ErrorKind::InvalidTransactionId,
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::InvalidLabel(_) => ErrorKind::InvalidLabel,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::InvalidTag { .. } => ErrorKind::InvalidTag,
            Self::CouldNotReadSaveFile(_) => ErrorKind::CouldNotReadSaveFile,
            Self::CouldNotWriteSaveFile(_) => ErrorKind::CouldNotWriteSaveFile,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Stable string code of this error's kind
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Classification code of this error's kind
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Message without the code prefix
    pub fn message(&self) -> &str {
        match self {
            Self::UnknownProfile(m)
            | Self::UnknownTransaction(m)
            | Self::DuplicateProfile(m)
            | Self::InvalidProfileId(m)
            | Self::InvalidTransactionId(m)
            | Self::InvalidName(m)
            | Self::InvalidLabel(m)
            | Self::InvalidAmount(m)
            | Self::CouldNotReadSaveFile(m)
            | Self::CouldNotWriteSaveFile(m)
            | Self::Storage(m)
            | Self::Config(m)
            | Self::Unknown(m) => m,
            Self::InvalidTag { message, .. } => message,
        }
    }

    /// Prefix the message with `prefix`, keeping the kind
    pub fn context(mut self, prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        match &mut self {
            Self::UnknownProfile(m)
            | Self::UnknownTransaction(m)
            | Self::DuplicateProfile(m)
            | Self::InvalidProfileId(m)
            | Self::InvalidTransactionId(m)
            | Self::InvalidName(m)
            | Self::InvalidLabel(m)
            | Self::InvalidAmount(m)
            | Self::CouldNotReadSaveFile(m)
            | Self::CouldNotWriteSaveFile(m)
            | Self::Storage(m)
            | Self::Config(m)
            | Self::Unknown(m) => m.insert_str(0, prefix),
            Self::InvalidTag { message, .. } => message.insert_str(0, prefix),
        }
        self
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownProfile(_) | Self::UnknownTransaction(_))
    }
}

impl From<rusqlite::Error> for FinanceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for finance planner operations
pub type FinanceResult<T> = Result<T, FinanceError>;

/// Extension for attaching context to fallible results
pub trait ResultExt<T> {
    fn context(self, prefix: &str) -> FinanceResult<T>;
}

impl<T, E: Into<FinanceError>> ResultExt<T> for Result<T, E> {
    fn context(self, prefix: &str) -> FinanceResult<T> {
        self.map_err(|e| e.into().context(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FinanceError::InvalidLabel("missing transaction label".into());
        assert_eq!(err.to_string(), "[InvalidLabel] missing transaction label");
    }

    #[test]
    fn test_not_found_error() {
        let err = FinanceError::unknown_profile("alice");
        assert_eq!(err.to_string(), "[UnknownProfile] profile not found: alice");
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_invalid_tag_names_index() {
        let err = FinanceError::invalid_tag(2);
        assert_eq!(err.kind(), ErrorKind::InvalidTag);
        assert!(err.message().contains("[2]"));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = FinanceError::Storage("disk I/O error".into()).context("could not insert row: ");
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.message(), "could not insert row: disk I/O error");
    }

    #[test]
    fn test_result_context() {
        let res: Result<(), rusqlite::Error> = Err(rusqlite::Error::InvalidQuery);
        let err = res.context("could not query transactions: ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.message().starts_with("could not query transactions: "));
    }
}
