use std::path::{Component, Path, PathBuf};

/// 待上传的本地文件及其远端key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub key: String,
}

impl LocalFile {
    pub fn new(source: &Path, target: &str, path: PathBuf) -> Self {
        let key = map_key(source, target, &path);
        Self { path, key }
    }
}

/// 根据源路径和目标前缀计算文件的远端key
///
/// 源路径本身就是文件时相对路径为空，此时使用文件名，保证单文件上传落在
/// `target/filename` 而不是 `target`。
pub fn map_key(source: &Path, target: &str, file: &Path) -> String {
    let local = match file.strip_prefix(source) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative,
        _ => file.file_name().map(Path::new).unwrap_or(file),
    };

    let mut segments = target_segments(target);
    for component in local.components() {
        match component {
            Component::Normal(part) => push_segment(&mut segments, &part.to_string_lossy()),
            Component::ParentDir => push_segment(&mut segments, ".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    segments.join("/")
}

fn target_segments(target: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for part in target.split('/') {
        push_segment(&mut segments, part);
    }
    segments
}

fn push_segment(segments: &mut Vec<String>, part: &str) {
    match part {
        "" | "." => {}
        ".." => {
            segments.pop();
        }
        _ => segments.push(part.to_string()),
    }
}

/// 删除阶段的列举前缀：非空目标前缀以 `/` 结尾，避免 `v1` 匹配到 `v10/`
pub fn listing_prefix(target: &str) -> String {
    let segments = target_segments(target);
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}
