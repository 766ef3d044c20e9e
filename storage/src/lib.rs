pub mod acl;
pub mod common;
pub mod file;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod s3;

pub use acl::*;
pub use common::*;
pub use file::*;
#[cfg(any(test, feature = "test-util"))]
pub use memory::*;
pub use s3::*;

/// 对象存储能力接口 - 同步引擎只通过此trait访问远端
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// 上传单个对象（整体写入，覆盖同名对象）
    async fn put_object(&self, request: PutObject) -> Result<(), StorageError>;

    /// 列举前缀下key严格大于`start_after`的对象，最多`max_keys`个，按字典序返回
    async fn list_objects(
        &self, bucket: &str, prefix: &str, start_after: Option<&str>, max_keys: usize,
    ) -> Result<ObjectPage, StorageError>;

    /// 批量删除，单个对象的失败记录在返回值中而不是作为错误返回
    async fn delete_objects(
        &self, bucket: &str, keys: &[String],
    ) -> Result<DeleteOutcome, StorageError>;
}
