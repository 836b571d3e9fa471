use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session file is malformed: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("session could not be encoded: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transaction aborted after {0} conflicting attempts")]
    Contention(u32),

    #[error("transaction read {0} after a write")]
    ReadAfterWrite(String),

    #[error("name is empty after normalization")]
    InvalidName,

    #[error("name is already taken")]
    NameTaken,

    #[error("not found")]
    NotFound,

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl Error {
    /// Collapses storage failures into `BackendUnavailable`, leaving the
    /// protocol outcomes (`InvalidName`, `NameTaken`, `NotFound`) intact.
    #[must_use]
    pub fn into_protocol(self) -> Self {
        match self {
            Self::InvalidName | Self::NameTaken | Self::NotFound | Self::BackendUnavailable(_) => {
                self
            }
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_protocol_keeps_outcomes() {
        assert!(matches!(Error::NameTaken.into_protocol(), Error::NameTaken));
        assert!(matches!(Error::NotFound.into_protocol(), Error::NotFound));
        assert!(matches!(
            Error::InvalidName.into_protocol(),
            Error::InvalidName
        ));
    }

    #[test]
    fn test_into_protocol_wraps_storage_failures() {
        let err = Error::Contention(5).into_protocol();
        match err {
            Error::BackendUnavailable(msg) => assert!(msg.contains("5 conflicting attempts")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
