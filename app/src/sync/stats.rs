use serde::Serialize;
use std::fmt;

use super::upload::UploadOutcome;

/// 同步结果统计 - 最终输出给调用方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub succeeded: usize,
    pub failed: usize,
    pub deleted: usize,
}

impl SyncResult {
    /// 按上传结果计数，deleted保持为0
    pub fn count(outcomes: &[UploadOutcome]) -> Self {
        outcomes
            .iter()
            .fold(SyncResult::default(), |mut result, outcome| {
                if outcome.is_success() {
                    result.succeeded += 1;
                } else {
                    result.failed += 1;
                }
                result
            })
    }

    /// 输出字段，顺序固定
    pub fn outputs(&self) -> [(&'static str, usize); 3] {
        [
            ("succeeded", self.succeeded),
            ("failed", self.failed),
            ("deleted", self.deleted),
        ]
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uploaded {} files successfully and {} files failed, deleted {} stale objects.",
            self.succeeded, self.failed, self.deleted
        )
    }
}
