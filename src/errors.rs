use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::templates::Granularity;

/// Error type for table loading, template validation, configuration and output failures.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed stroke id '{id}' at line {line}: expected <game>_<set>_<frame>")]
    MalformedId { id: String, line: u64 },
    #[error("template '{template}' for {granularity} uses unsupported placeholder '{{{placeholder}}}'")]
    InvalidTemplate {
        granularity: Granularity,
        template: String,
        placeholder: String,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DatasetError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
