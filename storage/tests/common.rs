use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Relative paths of every regular file in [`create_site`]
pub const SITE_FILES: [&str; 5] = [
    "index.html",
    "404.html",
    "css/site.css",
    "img/logo.png",
    "docs/guide/intro.md",
];

/// A small static site plus an empty directory that must not show up as a file
pub fn create_site() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::create_dir_all(root.join("drafts")).unwrap();
    for file in SITE_FILES {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, file.as_bytes()).unwrap();
    }

    temp_dir
}

/// Absolute paths of [`SITE_FILES`] under the fixture root
pub fn site_paths(temp_dir: &TempDir) -> Vec<PathBuf> {
    SITE_FILES.iter().map(|f| temp_dir.path().join(f)).collect()
}
