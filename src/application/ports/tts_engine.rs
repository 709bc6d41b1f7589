//! TTS Engine Port - 语音合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 语音合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的一行文本
    pub text: String,
    /// 语言代码（如 "en"、"zh"）
    pub lang: String,
}

/// 语音合成响应
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    /// 合成的音频字节流（压缩格式，需经解码器解码）
    pub audio_data: Vec<u8>,
    /// 音频容器格式提示（如 "mp3"、"wav"），供解码器 probe 使用
    pub format_hint: Option<String>,
    /// 音频时长（毫秒），服务可能不提供
    pub duration_ms: Option<u64>,
    /// 采样率，服务可能不提供
    pub sample_rate: Option<u32>,
}

/// TTS Engine Port
///
/// 外部语音合成服务的抽象接口
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成一行文本的语音
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
