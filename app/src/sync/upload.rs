use chrono::{DateTime, Utc};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{LocalStorage, ObjectAcl, ObjectStorage, PutObject, StorageError};
use thiserror::Error;
use tokio::sync::Semaphore;

use super::key::LocalFile;
use super::params::SyncRequest;

/// 无法从扩展名识别类型时使用的Content-Type
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// 单个文件的上传错误，只记录不传播
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Upload task aborted: {0}")]
    Task(String),
}

/// 单个文件的上传结果
#[derive(Debug)]
pub enum UploadOutcome {
    Success { key: String },
    Failure { key: String, cause: UploadError },
}

impl UploadOutcome {
    pub fn key(&self) -> &str {
        match self {
            UploadOutcome::Success { key } | UploadOutcome::Failure { key, .. } => key,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

/// 每个上传任务共享的请求字段
#[derive(Clone)]
struct UploadSettings {
    bucket: String,
    acl: Option<ObjectAcl>,
    expires: Option<DateTime<Utc>>,
    ignore_errors: bool,
}

/// 根据扩展名推断Content-Type
pub fn content_type_for(path: &std::path::Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// 并发上传全部文件，等待所有任务完成后按输入顺序返回结果
///
/// `concurrency`为0时所有上传同时发起，否则同一时刻最多`concurrency`个上传在进行。
/// 任何一个文件失败都不会取消或阻塞其他文件。
pub async fn upload_all(
    store: Arc<dyn ObjectStorage>, files: Vec<LocalFile>, request: &SyncRequest,
    concurrency: usize,
) -> Vec<UploadOutcome> {
    let settings = UploadSettings {
        bucket: request.bucket.clone(),
        acl: request.acl,
        expires: request.expires,
        ignore_errors: request.ignore_upload_errors,
    };
    let limiter = (concurrency > 0).then(|| Arc::new(Semaphore::new(concurrency)));

    let mut handles = Vec::with_capacity(files.len());
    for file in files {
        let store = Arc::clone(&store);
        let settings = settings.clone();
        let limiter = limiter.clone();
        let key = file.key.clone();

        let handle = tokio::spawn(async move {
            // 信号量从不关闭，获取失败时按无限制处理
            let _permit = match limiter {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            upload_one(store.as_ref(), &settings, file).await
        });
        handles.push((key, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (key, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let cause = UploadError::Task(e.to_string());
                report_failure(&key, &cause, settings.ignore_errors);
                UploadOutcome::Failure { key, cause }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

async fn upload_one(
    store: &dyn ObjectStorage, settings: &UploadSettings, file: LocalFile,
) -> UploadOutcome {
    let LocalFile { path, key } = file;

    let result = match LocalStorage::read(&path).await {
        Ok(body) => store
            .put_object(PutObject {
                bucket: settings.bucket.clone(),
                key: key.clone(),
                content_type: content_type_for(&path),
                body,
                acl: settings.acl,
                expires: settings.expires,
            })
            .await
            .map_err(UploadError::from),
        Err(source) => Err(UploadError::Read { path, source }),
    };

    match result {
        Ok(()) => {
            log::info!("Uploaded {}", key);
            UploadOutcome::Success { key }
        }
        Err(cause) => {
            report_failure(&key, &cause, settings.ignore_errors);
            UploadOutcome::Failure { key, cause }
        }
    }
}

fn report_failure(key: &str, cause: &UploadError, ignore_errors: bool) {
    if ignore_errors {
        log::warn!("Failed to upload {}: {}", key, cause);
    } else {
        log::error!("Failed to upload {}: {}", key, cause);
    }
}
