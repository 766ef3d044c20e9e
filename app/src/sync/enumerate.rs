use std::io;
use std::path::{Path, PathBuf};
use storage::LocalStorage;

use super::error::SyncError;

/// 列出源路径下需要上传的全部普通文件（绝对路径）
///
/// 源路径是文件时只返回它自己；是目录时递归遍历，目录本身不会出现在结果中。
/// 符号链接不会被递归进入，指向普通文件的链接按文件处理。
pub async fn enumerate(source: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let storage = LocalStorage::new(source)?;
    let root = storage.root().to_path_buf();

    let metadata = match storage.metadata().await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SyncError::NotFound { path: root });
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Ok(vec![root]);
    }

    let mut rx = storage.walkdir();
    let mut files = Vec::new();

    while let Some(entry) = rx.recv().await {
        let entry = entry.map_err(|source| SyncError::Enumerate {
            path: source.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            source,
        })?;

        let file_type = entry.file_type();
        if file_type.is_file() {
            files.push(entry.into_path());
        } else if file_type.is_symlink() {
            match tokio::fs::metadata(entry.path()).await {
                Ok(target) if target.is_file() => files.push(entry.into_path()),
                Ok(_) => log::debug!("Skipping directory symlink {}", entry.path().display()),
                Err(e) => log::warn!("Skipping dangling symlink {}: {}", entry.path().display(), e),
            }
        }
    }

    log::debug!("Found {} files under {}", files.len(), root.display());
    Ok(files)
}
