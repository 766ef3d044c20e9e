use std::path::PathBuf;
use thiserror::Error;

use storage::StorageError;

use super::stats::SyncResult;

/// 同步过程中会中止整个任务的错误
///
/// 单个文件的上传失败和单个对象的删除失败不在此列，它们被记录在结果中。
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to enumerate {}: {source}", path.display())]
    Enumerate {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Upload {} files failed", result.failed)]
    UploadsFailed { result: SyncResult },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<SyncError> for utils::error::Error {
    fn from(err: SyncError) -> Self {
        utils::error::Error::with_source("Sync failed", Box::new(err))
    }
}
