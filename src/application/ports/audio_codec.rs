//! Audio Codec Port - 音频编解码抽象
//!
//! 定义音频解码（合成结果 → PCM 片段）和编码（时间线 → MP3）的抽象接口

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Clip;

/// 编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// MP3 编码配置
#[derive(Debug, Clone)]
pub struct EncodeConfig {
    /// 目标比特率（bps）
    /// 语音推荐: 32000-64000
    pub bitrate: u32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            bitrate: 32000, // 32kbps，语音足够
        }
    }
}

/// Audio Codec Port
///
/// 音频编解码的抽象接口
#[async_trait]
pub trait AudioCodecPort: Send + Sync {
    /// 解码压缩音频为单声道 PCM 片段
    ///
    /// # Arguments
    /// * `data` - 压缩音频字节流（MP3/WAV）
    /// * `format_hint` - 容器格式提示（如 "mp3"），帮助 probe
    ///
    /// 多声道音频会被混合为单声道
    async fn decode(&self, data: &[u8], format_hint: Option<&str>) -> Result<Clip, CodecError>;

    /// 将单声道 PCM 样本编码为 MP3
    async fn encode_mp3(
        &self,
        samples: &[f32],
        sample_rate: u32,
        config: &EncodeConfig,
    ) -> Result<Vec<u8>, CodecError>;
}
