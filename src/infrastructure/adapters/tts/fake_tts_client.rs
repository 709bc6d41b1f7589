//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 在内存中生成固定时长的正弦波 WAV，不实际调用 TTS 服务

use async_trait::async_trait;

use crate::application::ports::{
    SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError,
};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每行文本生成的音频时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 正弦波频率（Hz）
    pub frequency_hz: f32,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            sample_rate: 22050,
            frequency_hz: 440.0,
        }
    }
}

/// Fake TTS Client
///
/// 用于测试，对任何文本返回固定时长的正弦波音频
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    /// 预生成的 WAV 字节流
    audio_data: Vec<u8>,
}

impl FakeTtsClient {
    /// 创建新的 FakeTtsClient
    pub fn new(config: FakeTtsClientConfig) -> Self {
        let audio_data = sine_wav(
            config.duration_ms,
            config.sample_rate,
            config.frequency_hz,
        );
        Self { config, audio_data }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        tracing::debug!(
            text_len = request.text.len(),
            lang = %request.lang,
            "FakeTtsClient: returning fixed audio"
        );

        Ok(SynthesisResponse {
            audio_data: self.audio_data.clone(),
            format_hint: Some("wav".to_string()),
            duration_ms: Some(self.config.duration_ms),
            sample_rate: Some(self.config.sample_rate),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// 生成单声道 16 位 PCM 正弦波 WAV
fn sine_wav(duration_ms: u64, sample_rate: u32, frequency_hz: f32) -> Vec<u8> {
    let num_samples = (sample_rate as u64 * duration_ms / 1000) as usize;
    let bits_per_sample: u16 = 16;
    let num_channels: u16 = 1;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);

    let data_size = num_samples * 2;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());

    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let value = (t * frequency_hz * 2.0 * std::f32::consts::PI).sin() * 0.5;
        let sample = (value.clamp(-1.0, 1.0) * 32767.0) as i16;
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}
