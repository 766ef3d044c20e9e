use std::collections::HashSet;
use storage::{DeleteFailure, ObjectStorage};

use super::error::SyncError;
use super::MAX_PAGE_SIZE;

/// 删除阶段的结果
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// 服务端确认删除的对象数
    pub deleted: usize,
    /// 单个对象的删除失败
    pub errors: Vec<DeleteFailure>,
    /// 发出的列举请求数
    pub list_calls: usize,
}

/// 删除前缀下不在`keep`集合中的远端对象
///
/// 以上一页最后一个key作为start-after游标逐页列举。只有当一页"已满"
/// （返回数量等于请求上限且等于服务端报告的数量）时才继续请求下一页，
/// 因此恰好填满的最后一页会多产生一次空列举。每页的待删除key在请求下一页
/// 之前以一次批量删除发出。`page_size`超过[`MAX_PAGE_SIZE`]时按上限处理，
/// 否则服务端截断的页永远不会被判定为"已满"。
pub async fn prune(
    store: &dyn ObjectStorage, bucket: &str, prefix: &str, keep: &HashSet<String>,
    page_size: usize,
) -> Result<PruneOutcome, SyncError> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut outcome = PruneOutcome::default();
    let mut start_after: Option<String> = None;

    loop {
        let page = store
            .list_objects(bucket, prefix, start_after.as_deref(), page_size)
            .await?;
        outcome.list_calls += 1;

        let batch: Vec<String> = page
            .objects
            .iter()
            .filter(|object| !keep.contains(&object.key))
            .map(|object| object.key.clone())
            .collect();

        if !batch.is_empty() {
            log::debug!("Deleting {} objects from page {}", batch.len(), outcome.list_calls);
            let result = store.delete_objects(bucket, &batch).await?;

            for key in result.deleted {
                log::info!("Deleted {}", key);
                outcome.deleted += 1;
            }
            for failure in result.errors {
                log::warn!(
                    "Cannot delete {}; code: {}, message: {}",
                    failure.key,
                    failure.code,
                    failure.message
                );
                outcome.errors.push(failure);
            }
        }

        if !page.is_full() {
            if page.is_truncated {
                log::debug!("Listing reported truncation on a short page, stopping");
            }
            break;
        }
        start_after = page.last_key().map(str::to_string);
    }

    Ok(outcome)
}
