use thiserror::Error;

use crate::task::TaskId;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("column not found for status: {0}")]
    ColumnNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("stored value under `{key}` is malformed")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage i/o failed")]
    Storage(#[from] std::io::Error),

    #[error("failed to serialize value")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
