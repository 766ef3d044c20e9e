use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use std::fmt;

use crate::common::{
    DeleteFailure, DeleteOutcome, ObjectPage, PutObject, RemoteObject, StorageError,
};
use crate::ObjectStorage;

/// S3连接参数
#[derive(Clone, Default)]
pub struct S3Options {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// S3兼容服务的自定义endpoint（MinIO、R2等），设置后使用path-style寻址
    pub endpoint: Option<String>,
}

impl fmt::Debug for S3Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Options")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl S3Options {
    /// 检查必填项，缺失时返回配置错误
    pub fn validate(&self) -> Result<(), StorageError> {
        let required = [
            ("region", &self.region),
            ("access key id", &self.access_key_id),
            ("secret access key", &self.secret_access_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(StorageError::Config(format!("missing {}", name)));
            }
        }
        Ok(())
    }
}

/// S3存储结构
pub struct S3Storage {
    client: aws_sdk_s3::Client,
}

impl S3Storage {
    /// 根据连接参数创建S3客户端，不发起任何网络请求
    pub async fn connect(options: &S3Options) -> Result<Self, StorageError> {
        options.validate()?;

        let credentials = Credentials::new(
            &options.access_key_id,
            &options.secret_access_key,
            None,
            None,
            "s3sync",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(options.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = options.endpoint.as_deref().filter(|e| !e.is_empty()) {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        log::debug!("S3 client ready: {:?}", options);

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(&self, request: PutObject) -> Result<(), StorageError> {
        let PutObject {
            bucket,
            key,
            body,
            content_type,
            acl,
            expires,
        } = request;

        self.client
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .set_acl(acl.map(Into::into))
            .set_expires(expires.map(|t| DateTime::from_secs(t.timestamp())))
            .send()
            .await
            .map_err(|e| StorageError::Put {
                bucket: bucket.clone(),
                key: key.clone(),
                source: Box::new(e),
            })?;

        Ok(())
    }

    async fn list_objects(
        &self, bucket: &str, prefix: &str, start_after: Option<&str>, max_keys: usize,
    ) -> Result<ObjectPage, StorageError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_start_after(start_after.map(str::to_string))
            .max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| StorageError::List {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                source: Box::new(e),
            })?;

        let objects: Vec<RemoteObject> = output
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key().map(|key| RemoteObject {
                    key: key.to_string(),
                    size: obj.size().map(|s| s.max(0) as u64).unwrap_or(0),
                })
            })
            .collect();

        Ok(ObjectPage {
            key_count: output
                .key_count()
                .map(|c| c.max(0) as usize)
                .unwrap_or(objects.len()),
            max_keys: output.max_keys().map(|m| m.max(0) as usize).unwrap_or(0),
            is_truncated: output.is_truncated().unwrap_or(false),
            objects,
        })
    }

    async fn delete_objects(
        &self, bucket: &str, keys: &[String],
    ) -> Result<DeleteOutcome, StorageError> {
        let delete_error = |source: aws_sdk_s3::error::BuildError| StorageError::Delete {
            bucket: bucket.to_string(),
            count: keys.len(),
            source: Box::new(source),
        };

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(delete_error)?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(delete_error)?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                bucket: bucket.to_string(),
                count: keys.len(),
                source: Box::new(e),
            })?;

        Ok(DeleteOutcome {
            deleted: output
                .deleted()
                .iter()
                .filter_map(|d| d.key().map(str::to_string))
                .collect(),
            errors: output
                .errors()
                .iter()
                .map(|e| DeleteFailure {
                    key: e.key().unwrap_or_default().to_string(),
                    code: e.code().unwrap_or_default().to_string(),
                    message: e.message().unwrap_or_default().to_string(),
                })
                .collect(),
        })
    }
}
