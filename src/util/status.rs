use std::fmt;
use std::io;

/// Failure categories surfaced by the storage engine.
///
/// An absent row or column is never an error: lookups report absence as
/// `Ok(None)`. `NotFound` is reserved for missing on-disk artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    NotFound,
    Corruption,
    NotSupported,
    InvalidArgument,
    StorageUnavailable,
}

#[derive(Debug, Clone)]
pub struct Status {
    code: Code,
    message: Option<String>,
}

impl Status {
    fn with_message(code: Code, msg: impl Into<String>) -> Self {
        Status {
            code,
            message: Some(msg.into()),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_message(Code::NotFound, msg)
    }

    /// Malformed on-disk data: bad checksum, truncated block, undecodable row.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::with_message(Code::Corruption, msg)
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::with_message(Code::NotSupported, msg)
    }

    /// Caller error: unknown column family, malformed path, bad comparator index.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::with_message(Code::InvalidArgument, msg)
    }

    /// An I/O fault while reading or writing a storage source.
    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        Self::with_message(Code::StorageUnavailable, msg)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Code::NotFound
    }

    pub fn is_corruption(&self) -> bool {
        self.code == Code::Corruption
    }

    pub fn is_not_supported(&self) -> bool {
        self.code == Code::NotSupported
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == Code::InvalidArgument
    }

    pub fn is_storage_unavailable(&self) -> bool {
        self.code == Code::StorageUnavailable
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        self.code == Code::StorageUnavailable
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.code, msg),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

impl From<io::Error> for Status {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            // A short read of a file whose length we trusted means the file is damaged.
            io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => {
                Status::corruption(err.to_string())
            }
            io::ErrorKind::NotFound => Status::not_found(err.to_string()),
            _ => Status::storage_unavailable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::corruption(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Status>;
