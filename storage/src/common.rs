use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::acl::ObjectAcl;

/// 底层SDK错误的统一包装类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to upload s3://{bucket}/{key}: {source}")]
    Put {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to list s3://{bucket}/{prefix}: {source}")]
    List {
        bucket: String,
        prefix: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to delete {count} objects from s3://{bucket}: {source}")]
    Delete {
        bucket: String,
        count: usize,
        #[source]
        source: BoxError,
    },

    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

/// 单个对象上传请求
#[derive(Debug, Clone)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub acl: Option<ObjectAcl>,
    pub expires: Option<DateTime<Utc>>,
}

/// 列举结果中的单个远端对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub size: u64,
}

/// 一次列举调用返回的一页对象
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// 按key字典序排列的对象
    pub objects: Vec<RemoteObject>,
    /// 服务端报告的本页key数量
    pub key_count: usize,
    /// 服务端报告的本次请求上限
    pub max_keys: usize,
    /// 服务端报告的截断标志，某些S3兼容服务并不可靠
    pub is_truncated: bool,
}

impl ObjectPage {
    /// 本页最后一个key，作为下一页的start-after游标
    pub fn last_key(&self) -> Option<&str> {
        self.objects.last().map(|o| o.key.as_str())
    }

    /// 判断本页是否"已满"：返回数量等于请求上限且等于报告的key数量
    pub fn is_full(&self) -> bool {
        !self.objects.is_empty()
            && self.objects.len() == self.max_keys
            && self.objects.len() == self.key_count
    }
}

/// 批量删除中单个对象的失败信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// 一次批量删除调用的结果
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
    pub errors: Vec<DeleteFailure>,
}
