//! Error taxonomy for the ingestion pipeline.
//!
//! Every failure falls into one of these categories, reported by
//! [`Error::kind`]:
//!
//! | kind              | raised when                                              |
//! |-------------------|----------------------------------------------------------|
//! | `Format`          | filename, MAT variable or event table does not parse      |
//! | `Config`          | registry lookup fails, band above Nyquist, bad window     |
//! | `MissingResource` | registry, raw file or companion event table absent        |
//! | `Numeric`         | zero-variance channel, unstable filter, signal too short  |
//! | `Io`              | a present file cannot be read (permissions, device error) |
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Config,
    MissingResource,
    Numeric,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("format error in {source_name}: {message}")]
    Format { source_name: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing resource {}: {what}", path.display())]
    MissingResource { path: PathBuf, what: &'static str },

    #[error("numeric error: {0}")]
    Numeric(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn format(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Format {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        Error::Numeric(message.into())
    }

    pub fn missing(path: impl Into<PathBuf>, what: &'static str) -> Self {
        Error::MissingResource {
            path: path.into(),
            what,
        }
    }

    /// Wrap an I/O error, promoting `NotFound` to a missing-resource error.
    pub fn io(path: impl Into<PathBuf>, what: &'static str, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::MissingResource { path, what }
        } else {
            Error::Io { path, source }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Format { .. } => ErrorKind::Format,
            Error::Config(_) => ErrorKind::Config,
            Error::MissingResource { .. } => ErrorKind::MissingResource,
            Error::Numeric(_) => ErrorKind::Numeric,
            Error::Io { .. } => ErrorKind::Io,
        }
    }
}
