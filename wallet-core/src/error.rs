//! Error types for the wallet ledger
//!
//! Only infrastructure failures travel through this channel; business
//! rejections are data ([`crate::outcome::Outcome`]). Any error raised
//! while a transaction scope is open implies the scope was rolled back.

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Row lock not acquired within the scope timeout
    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    /// Upstream collaborator (directory, blacklist gate) unreachable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
