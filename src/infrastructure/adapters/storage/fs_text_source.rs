//! FS Text Source - 文件系统输入目录实现
//!
//! 实现 TextSourcePort trait

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{StorageError, TextSourcePort};

/// 文件系统文本输入源
#[derive(Debug, Default)]
pub struct FsTextSource;

impl FsTextSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextSourcePort for FsTextSource {
    async fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                // 目录缺失/不可读：报告后以空列表继续
                tracing::error!(dir = %dir.display(), error = %e, "Cannot read input directory");
                return Vec::new();
            }
        };

        let mut paths = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    match entry.file_type().await {
                        Ok(file_type) if file_type.is_file() => paths.push(entry.path()),
                        Ok(_) => {} // 子目录等非常规文件被排除
                        Err(e) => {
                            tracing::warn!(
                                path = %entry.path().display(),
                                error = %e,
                                "Cannot stat entry, skipping"
                            );
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(dir = %dir.display(), error = %e, "Error reading directory entry");
                    break;
                }
            }
        }

        // 固定处理顺序
        paths.sort();
        paths
    }

    async fn read_text(&self, path: &Path) -> Result<String, StorageError> {
        fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_string_lossy().to_string())
            } else {
                StorageError::IoError(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lists_exactly_the_regular_files() {
        let dir = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let source = FsTextSource::new();
        let files = source.list_files(dir.path()).await;
        assert_eq!(files.len(), 3);
    }

    #[tokio::test]
    async fn test_subdirectories_excluded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("nested.txt"), "x").unwrap();

        let source = FsTextSource::new();
        let files = source.list_files(dir.path()).await;
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.txt"));
    }

    #[tokio::test]
    async fn test_missing_dir_yields_empty_list() {
        let source = FsTextSource::new();
        let files = source.list_files(Path::new("/nonexistent/recite-dir")).await;
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_list_order_is_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let source = FsTextSource::new();
        let files = source.list_files(dir.path()).await;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn test_read_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Hello\nWorld").unwrap();

        let source = FsTextSource::new();
        let text = source.read_text(&path).await.unwrap();
        assert_eq!(text, "Hello\nWorld");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let source = FsTextSource::new();
        let result = source.read_text(Path::new("/nonexistent/notes.txt")).await;
        assert!(matches!(result, Err(StorageError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_read_non_utf8_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [0xFFu8, 0xFE, 0x80]).unwrap();

        let source = FsTextSource::new();
        assert!(source.read_text(&path).await.is_err());
    }
}
