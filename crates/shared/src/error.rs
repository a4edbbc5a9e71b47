use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageOperation {
    Open,
    Read,
    Write,
}

impl StorageOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl std::fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure to reach or update the persisted preference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("preference storage {operation} failed: {message}")]
pub struct StorageError {
    pub operation: StorageOperation,
    pub message: String,
}

impl StorageError {
    pub fn new(operation: StorageOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    pub fn open(message: impl Into<String>) -> Self {
        Self::new(StorageOperation::Open, message)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::new(StorageOperation::Read, message)
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::new(StorageOperation::Write, message)
    }
}
