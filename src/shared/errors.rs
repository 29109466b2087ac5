use thiserror::Error;

/// Common storage-related errors for the tag file and settings.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse data: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),

    #[error("Unexpected document shape: {0}")]
    ShapeError(String),
}

impl StorageError {
    pub fn directory(msg: impl Into<String>) -> Self {
        StorageError::DirectoryError(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        StorageError::ShapeError(msg.into())
    }

    /// True when the backing file exists but could not be understood.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::ParseError(_) | StorageError::ShapeError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_classification() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(StorageError::from(parse).is_corrupt());
        assert!(StorageError::shape("array at root").is_corrupt());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!StorageError::from(io).is_corrupt());
        assert!(!StorageError::directory("/nope").is_corrupt());
    }
}
