//! ABR parsing error types

use std::io;
use thiserror::Error;

/// Errors that can occur during ABR file parsing
///
/// Only `UnsupportedVersion` and `Io` ever reach the caller of
/// [`AbrParser`](super::AbrParser). `Corrupt` is raised while decoding a
/// single record and is absorbed by the record loop.
#[derive(Error, Debug)]
pub enum AbrError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported ABR version: {}", version_label(.major, .minor))]
    UnsupportedVersion { major: i16, minor: Option<i16> },

    #[error("Corrupt brush data: {0}")]
    Corrupt(String),
}

impl AbrError {
    pub(crate) fn unsupported_major(major: i16) -> Self {
        Self::UnsupportedVersion { major, minor: None }
    }

    pub(crate) fn unsupported_minor(major: i16, minor: i16) -> Self {
        Self::UnsupportedVersion {
            major,
            minor: Some(minor),
        }
    }
}

fn version_label(major: &i16, minor: &Option<i16>) -> String {
    match minor {
        Some(minor) => format!("{}.{}", major, minor),
        None => major.to_string(),
    }
}

impl From<AbrError> for String {
    fn from(err: AbrError) -> Self {
        err.to_string()
    }
}
