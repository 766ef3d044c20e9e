use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;
use tokio::sync::mpsc;
use walkdir::{DirEntry, WalkDir};

/// Channel capacity between the blocking walker and the async consumer
const WALK_CHANNEL_SIZE: usize = 1000;

/// Local source tree rooted at an absolute path
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a local storage, resolving relative roots against the working directory
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: resolve_local_path(root.as_ref())?,
        })
    }

    /// Get the absolute root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get root metadata, following symlinks
    pub async fn metadata(&self) -> io::Result<Metadata> {
        tokio_fs::metadata(&self.root).await
    }

    /// 使用walkdir的流式版本 - 通过队列返回entry作为生产者
    ///
    /// 遍历错误同样通过队列传递，由调用方决定是否中止。
    pub fn walkdir(&self) -> mpsc::Receiver<walkdir::Result<DirEntry>> {
        let (tx, rx) = mpsc::channel(WALK_CHANNEL_SIZE);
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || {
            let walker = WalkDir::new(&root)
                .follow_links(false) // 不跟随符号链接，避免循环
                .max_open(100); // 限制同时打开的文件句柄数

            for entry in walker {
                if tx.blocking_send(entry).is_err() {
                    // 接收端已关闭，退出循环
                    break;
                }
            }
        });

        rx
    }

    /// Read a whole file into memory
    pub async fn read(path: &Path) -> io::Result<Vec<u8>> {
        tokio_fs::read(path).await
    }
}

/// 解析本地路径，支持相对路径和绝对路径
pub fn resolve_local_path(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
