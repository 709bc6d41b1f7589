//! FS Audio Sink - 文件系统输出目录实现
//!
//! 实现 AudioSinkPort trait

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

use crate::application::ports::{AudioSinkPort, StorageError};

/// 文件系统音频输出
#[derive(Debug, Default)]
pub struct FsAudioSink;

impl FsAudioSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioSinkPort for FsAudioSink {
    async fn ensure_dir(&self, dir: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    async fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        fs::write(path, data)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            size = data.len(),
            "Saved audio file"
        );

        Ok(())
    }
}
