use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A mutating call was made with a session that is no longer open.
    #[error("backup session {} is not open", .0.display())]
    SessionClosed(PathBuf),
    #[error("{op} {}: {source}", .path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("journal error: {0}")]
    Journal(String),
}

impl ApiError {
    #[must_use]
    pub fn id(&self) -> ErrorId {
        match self {
            ApiError::SessionClosed(_) => ErrorId::E_SESSION,
            ApiError::Filesystem { .. } => ErrorId::E_FILESYSTEM,
            ApiError::InvalidMapping(_) => ErrorId::E_MAPPING,
            ApiError::InvalidInput(_) => ErrorId::E_INPUT,
            ApiError::Journal(_) => ErrorId::E_JOURNAL,
        }
    }

    /// Path the failure is attached to, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ApiError::SessionClosed(p) | ApiError::Filesystem { path: p, .. } => Some(p),
            _ => None,
        }
    }
}

/// `map_err` adapter attaching operation and path context to an IO error.
pub(crate) fn io_at(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> ApiError {
    let path = path.to_path_buf();
    move |source| ApiError::Filesystem { op, path, source }
}

impl From<crate::types::errors::Error> for ApiError {
    fn from(e: crate::types::errors::Error) -> Self {
        use crate::types::errors::ErrorKind::{Descriptor, InvalidPath, Io, Policy};
        match e.kind {
            Policy => ApiError::InvalidMapping(e.msg),
            InvalidPath | Descriptor | Io => ApiError::InvalidInput(e.msg),
        }
    }
}

// Stable identifiers printed by the CLI; SCREAMING_SNAKE_CASE matches the emitted ids.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorId {
    E_SESSION,
    E_FILESYSTEM,
    E_MAPPING,
    E_INPUT,
    E_JOURNAL,
    E_GENERIC,
}

#[must_use]
pub const fn id_str(id: ErrorId) -> &'static str {
    match id {
        ErrorId::E_SESSION => "E_SESSION",
        ErrorId::E_FILESYSTEM => "E_FILESYSTEM",
        ErrorId::E_MAPPING => "E_MAPPING",
        ErrorId::E_INPUT => "E_INPUT",
        ErrorId::E_JOURNAL => "E_JOURNAL",
        ErrorId::E_GENERIC => "E_GENERIC",
    }
}

#[must_use]
pub const fn exit_code_for(id: ErrorId) -> i32 {
    match id {
        ErrorId::E_SESSION => 10,
        ErrorId::E_MAPPING => 20,
        ErrorId::E_INPUT => 30,
        ErrorId::E_FILESYSTEM => 40,
        ErrorId::E_JOURNAL => 60,
        ErrorId::E_GENERIC => 1,
    }
}
