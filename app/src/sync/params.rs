use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::PathBuf;
use storage::{ObjectAcl, S3Options, StorageError};

use super::error::SyncError;

/// 被视为"开启"的布尔输入
const TRUTHY: [&str; 10] = ["y", "yes", "t", "true", "e", "enable", "enabled", "on", "ok", "1"];

/// 同步参数结构体 - 来自CLI和配置文件的原始输入
#[derive(Debug, Clone)]
pub struct SyncParams {
    /// 目标bucket
    pub bucket: String,

    /// 连接参数（区域、凭证、endpoint）
    pub connection: S3Options,

    /// 本地文件或目录
    pub source: String,

    /// 远端key前缀
    pub target: String,

    /// 对象ACL，空值表示不设置
    pub acl: Option<String>,

    /// 对象过期时间，早于当前时间时忽略
    pub expires: Option<String>,

    /// 是否删除远端多余对象
    pub delete: bool,

    /// 上传失败是否不影响整体结果
    pub ignore_error: bool,
}

impl Default for SyncParams {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            connection: S3Options::default(),
            source: String::from("."),
            target: String::new(),
            acl: None,
            expires: None,
            delete: false,
            ignore_error: false,
        }
    }
}

impl SyncParams {
    /// 校验参数并生成同步请求，任何缺失或非法的输入都在网络请求之前报错
    pub fn into_request(self) -> Result<SyncRequest, SyncError> {
        self.into_request_at(Utc::now())
    }

    pub fn into_request_at(self, now: DateTime<Utc>) -> Result<SyncRequest, SyncError> {
        if self.bucket.trim().is_empty() {
            return Err(SyncError::Configuration(String::from("missing bucket")));
        }

        self.connection.validate().map_err(|e| match e {
            StorageError::Config(msg) => SyncError::Configuration(msg),
            other => SyncError::Storage(other),
        })?;

        let acl = ObjectAcl::parse_optional(self.acl.as_deref()).map_err(SyncError::Configuration)?;

        let expires = match self.expires.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => {
                let expires = parse_expires(value).map_err(SyncError::Configuration)?;
                if expires <= now {
                    log::warn!("Ignoring expires {} because it is not in the future", expires);
                    None
                } else {
                    Some(expires)
                }
            }
        };

        let source = if self.source.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(self.source)
        };

        Ok(SyncRequest {
            source,
            target: self.target,
            bucket: self.bucket,
            connection: self.connection,
            acl,
            expires,
            delete_stale: self.delete,
            ignore_upload_errors: self.ignore_error,
        })
    }
}

/// 经过校验的同步请求，构造后不再修改
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub source: PathBuf,
    pub target: String,
    pub bucket: String,
    pub connection: S3Options,
    pub acl: Option<ObjectAcl>,
    pub expires: Option<DateTime<Utc>>,
    pub delete_stale: bool,
    pub ignore_upload_errors: bool,
}

impl SyncRequest {
    pub fn new(bucket: impl Into<String>, source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            bucket: bucket.into(),
            connection: S3Options::default(),
            acl: None,
            expires: None,
            delete_stale: false,
            ignore_upload_errors: false,
        }
    }
}

/// 解析布尔输入，不在识别列表中的值一律为false
pub fn parse_switch(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    TRUTHY.contains(&value.as_str())
}

/// 解析过期时间：RFC 3339、RFC 2822、`YYYY-MM-DDTHH:MM:SS`（UTC）或`YYYY-MM-DD`（UTC零点）
pub fn parse_expires(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(value) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(t.and_utc());
    }
    if let Some(t) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(t.and_utc());
    }

    Err(format!("Invalid expires value '{}'", value))
}
