//! 应用层错误定义
//!
//! 流水线各端口错误的统一汇聚类型

use thiserror::Error;

use crate::application::ports::{CodecError, StorageError, TtsError};

/// 流水线错误
///
/// 在 per-file 边界被捕获并报告；单个文件的失败不影响批处理的其他文件
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 读取输入 / 写出输出失败
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// 语音合成失败
    #[error("TTS error: {0}")]
    Synthesis(#[from] TtsError),

    /// 音频解码或编码失败
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}
