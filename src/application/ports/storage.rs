//! Storage Port - 文件系统存储抽象
//!
//! 定义输入文本读取和输出音频写入的抽象接口

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Text Source Port
///
/// 输入目录的抽象接口
#[async_trait]
pub trait TextSourcePort: Send + Sync {
    /// 列出目录下的常规文件（非递归，不含子目录）
    ///
    /// 目录缺失或不可读时记录错误并返回空列表，不中断批处理
    async fn list_files(&self, dir: &Path) -> Vec<PathBuf>;

    /// 读取 UTF-8 文本文件的全部内容
    async fn read_text(&self, path: &Path) -> Result<String, StorageError>;
}

/// Audio Sink Port
///
/// 输出目录的抽象接口
#[async_trait]
pub trait AudioSinkPort: Send + Sync {
    /// 确保输出目录存在（不存在则创建）
    async fn ensure_dir(&self, dir: &Path) -> Result<(), StorageError>;

    /// 写出编码后的音频文件
    async fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;
}
