//! 同步模块 - 把本地文件树上传到bucket前缀，并可选删除远端多余的对象
//!
//! 流程：枚举本地文件 → 计算key → 并发上传 → 统计 → 判定 → （删除） → 输出结果

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use storage::{resolve_local_path, ObjectStorage};

mod enumerate;
mod error;
mod key;
mod params;
mod prune;
mod report;
mod stats;
mod upload;


pub use enumerate::enumerate;
pub use error::SyncError;
pub use key::{listing_prefix, map_key, LocalFile};
pub use params::{parse_expires, parse_switch, SyncParams, SyncRequest};
pub use prune::{prune, PruneOutcome};
pub use report::{OutputFormat, Reporter, WriterReporter};
pub use stats::SyncResult;
pub use upload::{content_type_for, upload_all, UploadError, UploadOutcome, DEFAULT_CONTENT_TYPE};

/// 默认同时进行的上传数
pub const DEFAULT_CONCURRENCY: usize = 64;

/// 每次列举的key数量上限：S3单次列举和单次批量删除都最多1000个key
pub const MAX_PAGE_SIZE: usize = 1000;

/// 默认每次列举的key数量
pub const DEFAULT_PAGE_SIZE: usize = MAX_PAGE_SIZE;

/// 同步任务的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Enumerating,
    Uploading,
    Evaluating,
    Pruning,
    Reporting,
    Done,
    Aborted,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Enumerating => "enumerating",
            SyncState::Uploading => "uploading",
            SyncState::Evaluating => "evaluating",
            SyncState::Pruning => "pruning",
            SyncState::Reporting => "reporting",
            SyncState::Done => "done",
            SyncState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

fn transition(state: &mut SyncState, next: SyncState) {
    log::debug!("Sync state: {} -> {}", state, next);
    *state = next;
}

/// 同步编排器
pub struct Synchronizer {
    store: Arc<dyn ObjectStorage>,
    concurrency: usize,
    page_size: usize,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn ObjectStorage>) -> Self {
        Self {
            store,
            concurrency: DEFAULT_CONCURRENCY,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// 同时进行的上传数上限，0表示不限制
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// 每页列举的key数量，限制在`1..=MAX_PAGE_SIZE`
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        if self.page_size != page_size {
            log::warn!("Page size {} is out of range, using {}", page_size, self.page_size);
        }
        self
    }

    /// 执行一次同步
    ///
    /// 上传阶段有失败且未设置`ignore_upload_errors`时，仍然先输出统计结果，
    /// 再返回[`SyncError::UploadsFailed`]；此时跳过删除阶段。
    /// 其他错误直接中止，不输出任何结果。
    pub async fn sync(
        &self, request: &SyncRequest, reporter: &mut dyn Reporter,
    ) -> Result<SyncResult, SyncError> {
        log::info!("Starting sync with request: {:?}", request);

        let mut state = SyncState::Enumerating;
        let result = self.run(request, reporter, &mut state).await;

        match &result {
            Ok(_) | Err(SyncError::UploadsFailed { .. }) => transition(&mut state, SyncState::Done),
            Err(e) => {
                log::error!("Sync aborted while {}: {}", state, e);
                transition(&mut state, SyncState::Aborted);
            }
        }

        result
    }

    async fn run(
        &self, request: &SyncRequest, reporter: &mut dyn Reporter, state: &mut SyncState,
    ) -> Result<SyncResult, SyncError> {
        let root = resolve_local_path(&request.source)?;
        let files: Vec<LocalFile> = enumerate(&root)
            .await?
            .into_iter()
            .map(|path| LocalFile::new(&root, &request.target, path))
            .collect();
        log::info!("Found {} files to upload", files.len());

        transition(state, SyncState::Uploading);
        let outcomes = upload_all(Arc::clone(&self.store), files, request, self.concurrency).await;

        transition(state, SyncState::Evaluating);
        let mut result = SyncResult::count(&outcomes);
        let acceptable = result.failed == 0 || request.ignore_upload_errors;

        if request.delete_stale {
            if acceptable {
                transition(state, SyncState::Pruning);
                log::info!("Deleting files not present at local.");

                // 上传失败的文件本地仍然存在，它的远端副本同样保留
                let keep: HashSet<String> =
                    outcomes.iter().map(|o| o.key().to_string()).collect();
                let pruned = prune(
                    self.store.as_ref(),
                    &request.bucket,
                    &listing_prefix(&request.target),
                    &keep,
                    self.page_size,
                )
                .await?;

                result.deleted = pruned.deleted;
                if !pruned.errors.is_empty() {
                    log::warn!("{} stale objects could not be deleted", pruned.errors.len());
                }
            } else {
                log::warn!("Skipping deletion because {} uploads failed", result.failed);
            }
        }

        transition(state, SyncState::Reporting);
        log::info!(
            "Uploaded {} files successfully and {} files failed.",
            result.succeeded,
            result.failed
        );
        reporter.report(&result)?;

        if !acceptable {
            return Err(SyncError::UploadsFailed { result });
        }
        Ok(result)
    }
}
