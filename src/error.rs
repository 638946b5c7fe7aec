use std::{fmt, io, path::PathBuf};

#[derive(Debug)]
pub enum AssetError {
    Network {
        url: String,
        source: reqwest::Error,
    },

    /// server answered with something other than 200
    Status {
        context: String,
        status: u16,
    },

    FileSystem {
        path: PathBuf,
        operation: String,
        source: io::Error,
    },

    Parse {
        context: String,
        source: serde_json::Error,
    },

    /// the source answered but had nothing usable
    NotFound {
        context: String,
    },

    DownloadFailed {
        name: String,
        attempts: usize,
    },
}

impl AssetError {
    pub fn not_found(context: impl Into<String>) -> Self {
        AssetError::NotFound {
            context: context.into(),
        }
    }

    pub fn fs(path: impl Into<PathBuf>, operation: &str, source: io::Error) -> Self {
        AssetError::FileSystem {
            path: path.into(),
            operation: operation.to_string(),
            source,
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Network { url, source } => {
                write!(f, "Request to {} failed: {}", url, source)
            }
            AssetError::Status { context, status } => {
                write!(f, "{} HTTP {}", context, status)
            }
            AssetError::FileSystem {
                path, operation, ..
            } => {
                write!(
                    f,
                    "File system error during {} on path '{}'",
                    operation,
                    path.display()
                )
            }
            AssetError::Parse { context, source } => {
                write!(f, "Parse error in {}: {}", context, source)
            }
            AssetError::NotFound { context } => f.write_str(context),
            AssetError::DownloadFailed { name, attempts } => {
                write!(
                    f,
                    "Download failed for '{}' after {} attempts",
                    name, attempts
                )
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Network { source, .. } => Some(source),
            AssetError::FileSystem { source, .. } => Some(source),
            AssetError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
