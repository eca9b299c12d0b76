use std::path::PathBuf;

/// Errors surfaced to callers of the library.
///
/// Failures local to a single export file, photo or record never show up here; those are
/// absorbed as [`Ignored`] and logged.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Generation model is not loaded")]
    ModelNotLoaded,

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Invalid user info: {0}")]
    InvalidUserInfo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

/// An item-level failure that the surrounding batch swallows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Ignored {
    pub reason: String,
}

impl Ignored {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Ignored {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for Ignored {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}
