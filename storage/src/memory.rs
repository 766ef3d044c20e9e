//! 内存对象存储 - 仅用于测试，支持注入失败和延迟

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::common::{
    DeleteFailure, DeleteOutcome, ObjectPage, PutObject, RemoteObject, StorageError,
};
use crate::ObjectStorage;

/// S3单次列举最多返回的key数量，与请求的上限无关
const SERVER_MAX_KEYS: usize = 1000;

/// 内存中保存的对象
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub acl: Option<crate::ObjectAcl>,
    pub expires: Option<chrono::DateTime<chrono::Utc>>,
}

/// 以(bucket, key)为索引的内存存储
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    failing_puts: Mutex<HashSet<String>>,
    panicking_puts: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    put_delay: Mutex<Option<Duration>>,
    list_calls: AtomicUsize,
    put_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delete_batches: Mutex<Vec<Vec<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入对象，不计入调用统计
    pub fn insert(&self, bucket: &str, key: &str, body: &[u8]) {
        lock(&self.objects).insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.to_vec(),
                content_type: String::from("application/octet-stream"),
                acl: None,
                expires: None,
            },
        );
    }

    /// 让指定key的上传失败
    pub fn fail_put(&self, key: &str) {
        lock(&self.failing_puts).insert(key.to_string());
    }

    /// 让指定key的上传任务panic
    pub fn panic_on_put(&self, key: &str) {
        lock(&self.panicking_puts).insert(key.to_string());
    }

    /// 让指定key的删除在批量结果中报告错误
    pub fn fail_delete(&self, key: &str) {
        lock(&self.failing_deletes).insert(key.to_string());
    }

    /// 每次上传前人为等待
    pub fn set_put_delay(&self, delay: Duration) {
        *lock(&self.put_delay) = Some(delay);
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// 某个bucket下的全部key，按字典序
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.objects)
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// 同时进行的上传数的最大值
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// 每次批量删除请求的key列表
    pub fn delete_batches(&self) -> Vec<Vec<String>> {
        lock(&self.delete_batches).clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(&self, request: PutObject) -> Result<(), StorageError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        if lock(&self.panicking_puts).contains(&request.key) {
            panic!("injected panic for {}", request.key);
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *lock(&self.put_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if lock(&self.failing_puts).contains(&request.key) {
            return Err(StorageError::Put {
                bucket: request.bucket,
                key: request.key,
                source: "injected failure".into(),
            });
        }

        lock(&self.objects).insert(
            (request.bucket, request.key),
            StoredObject {
                body: request.body,
                content_type: request.content_type,
                acl: request.acl,
                expires: request.expires,
            },
        );
        Ok(())
    }

    async fn list_objects(
        &self, bucket: &str, prefix: &str, start_after: Option<&str>, max_keys: usize,
    ) -> Result<ObjectPage, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let objects = lock(&self.objects);
        let mut matching = objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .filter(|((_, k), _)| start_after.map_or(true, |after| k.as_str() > after));

        let page: Vec<RemoteObject> = matching
            .by_ref()
            .take(max_keys.min(SERVER_MAX_KEYS))
            .map(|((_, key), obj)| RemoteObject {
                key: key.clone(),
                size: obj.body.len() as u64,
            })
            .collect();
        let is_truncated = matching.next().is_some();

        Ok(ObjectPage {
            key_count: page.len(),
            max_keys,
            is_truncated,
            objects: page,
        })
    }

    async fn delete_objects(
        &self, bucket: &str, keys: &[String],
    ) -> Result<DeleteOutcome, StorageError> {
        lock(&self.delete_batches).push(keys.to_vec());

        let failing = lock(&self.failing_deletes).clone();
        let mut objects = lock(&self.objects);
        let mut outcome = DeleteOutcome::default();

        for key in keys {
            if failing.contains(key) {
                outcome.errors.push(DeleteFailure {
                    key: key.clone(),
                    code: String::from("AccessDenied"),
                    message: String::from("Access Denied"),
                });
                continue;
            }
            // S3语义：删除不存在的对象同样视为成功
            objects.remove(&(bucket.to_string(), key.clone()));
            outcome.deleted.push(key.clone());
        }

        Ok(outcome)
    }
}
