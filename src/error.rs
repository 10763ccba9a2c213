use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for the trafmon application
#[derive(Error, Debug)]
pub enum TrafmonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Store at {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Another trafmon run holds the lock at {0}")]
    LockBusy(PathBuf),

    #[error("Poll failed for host '{host}': {reason}")]
    Poll { host: String, reason: String },

    #[error("Notification to '{to}' failed: {reason}")]
    Notify { to: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown host '{0}' (register an interface on it first)")]
    UnknownHost(String),

    #[error("Unknown interface '{interface}' on host '{host}'")]
    UnknownInterface { host: String, interface: String },
}

/// Result type alias for the trafmon application
pub type Result<T> = std::result::Result<T, TrafmonError>;

impl TrafmonError {
    /// Create a store-corruption error
    pub fn store_corrupt<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        TrafmonError::StoreCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a per-host poll error
    pub fn poll<H: Into<String>, S: Into<String>>(host: H, reason: S) -> Self {
        TrafmonError::Poll {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Create a notification delivery error
    pub fn notify<T: Into<String>, S: Into<String>>(to: T, reason: S) -> Self {
        TrafmonError::Notify {
            to: to.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        TrafmonError::Config(msg.into())
    }

    /// True when this error is the non-fatal "lock already held" case.
    pub fn is_lock_busy(&self) -> bool {
        matches!(self, TrafmonError::LockBusy(_))
    }
}
