//! Symphonia Codec - 基于 symphonia + LAME 的音频编解码器
//!
//! 支持：
//! - MP3 / WAV 解码为单声道 PCM（多声道混合为单声道）
//! - PCM → MP3 编码（mp3lame-encoder）

use async_trait::async_trait;
use mp3lame_encoder::{max_required_buffer_size, Bitrate, Builder, FlushNoGap, MonoPcm, Quality};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioCodecPort, CodecError, EncodeConfig};
use crate::domain::Clip;

/// Symphonia + LAME 编解码器
#[derive(Debug, Default)]
pub struct SymphoniaCodec;

impl SymphoniaCodec {
    pub fn new() -> Self {
        Self
    }

    /// 使用 symphonia 解码压缩音频为交错 PCM
    fn decode_to_pcm(
        &self,
        data: &[u8],
        format_hint: Option<&str>,
    ) -> Result<DecodedAudio, CodecError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = format_hint {
            hint.with_extension(ext);
        }

        let format_opts = FormatOptions::default();
        let metadata_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| CodecError::DecodingError(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| CodecError::DecodingError("No audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| CodecError::DecodingError("Unknown sample rate".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| CodecError::DecodingError("Unknown channel count".to_string()))?;

        let decoder_opts = DecoderOptions::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &decoder_opts)
            .map_err(|e| CodecError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();
        let track_id = track.id;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(CodecError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            // Only take the actual samples, not the entire buffer capacity
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        if samples.is_empty() {
            return Err(CodecError::InvalidInput(
                "No audio samples decoded".to_string(),
            ));
        }

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }

    /// 将交错多声道样本混合为单声道
    fn downmix(samples: Vec<f32>, channels: usize) -> Vec<f32> {
        if channels <= 1 {
            return samples;
        }

        let frame_count = samples.len() / channels;
        let mut mono = Vec::with_capacity(frame_count);
        for frame in samples.chunks_exact(channels) {
            mono.push(frame.iter().sum::<f32>() / channels as f32);
        }
        mono
    }

    /// 将单声道 f32 样本编码为 MP3
    fn encode_pcm_to_mp3(
        &self,
        samples: &[f32],
        sample_rate: u32,
        bitrate: u32,
    ) -> Result<Vec<u8>, CodecError> {
        if samples.is_empty() {
            return Err(CodecError::InvalidInput(
                "No samples to encode".to_string(),
            ));
        }

        // 转换 f32 到 i16
        let pcm: Vec<i16> = samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();

        let mut builder = Builder::new().ok_or_else(|| {
            CodecError::EncodingError("Failed to create LAME encoder builder".to_string())
        })?;
        builder
            .set_num_channels(1)
            .map_err(|e| CodecError::EncodingError(format!("Failed to set channels: {}", e)))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| CodecError::EncodingError(format!("Failed to set sample rate: {}", e)))?;
        builder
            .set_brate(nearest_bitrate(bitrate))
            .map_err(|e| CodecError::EncodingError(format!("Failed to set bitrate: {}", e)))?;
        builder
            .set_quality(Quality::Best)
            .map_err(|e| CodecError::EncodingError(format!("Failed to set quality: {}", e)))?;

        let mut encoder = builder
            .build()
            .map_err(|e| CodecError::EncodingError(format!("Failed to build encoder: {}", e)))?;

        let mut mp3_data: Vec<u8> = Vec::new();
        mp3_data.reserve(max_required_buffer_size(pcm.len()));

        let encoded = encoder
            .encode(MonoPcm(&pcm), mp3_data.spare_capacity_mut())
            .map_err(|e| CodecError::EncodingError(format!("MP3 encode failed: {}", e)))?;
        // encode 返回已写入 spare capacity 的字节数
        unsafe {
            mp3_data.set_len(mp3_data.len() + encoded);
        }

        let flushed = encoder
            .flush::<FlushNoGap>(mp3_data.spare_capacity_mut())
            .map_err(|e| CodecError::EncodingError(format!("MP3 flush failed: {}", e)))?;
        unsafe {
            mp3_data.set_len(mp3_data.len() + flushed);
        }

        Ok(mp3_data)
    }
}

/// 解码后的交错 PCM
#[derive(Debug)]
struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

/// 选择不小于目标比特率的最小 LAME 档位
fn nearest_bitrate(bps: u32) -> Bitrate {
    match bps {
        b if b <= 8_000 => Bitrate::Kbps8,
        b if b <= 16_000 => Bitrate::Kbps16,
        b if b <= 24_000 => Bitrate::Kbps24,
        b if b <= 32_000 => Bitrate::Kbps32,
        b if b <= 40_000 => Bitrate::Kbps40,
        b if b <= 48_000 => Bitrate::Kbps48,
        b if b <= 64_000 => Bitrate::Kbps64,
        b if b <= 80_000 => Bitrate::Kbps80,
        b if b <= 96_000 => Bitrate::Kbps96,
        b if b <= 112_000 => Bitrate::Kbps112,
        b if b <= 128_000 => Bitrate::Kbps128,
        b if b <= 160_000 => Bitrate::Kbps160,
        b if b <= 192_000 => Bitrate::Kbps192,
        b if b <= 224_000 => Bitrate::Kbps224,
        b if b <= 256_000 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

#[async_trait]
impl AudioCodecPort for SymphoniaCodec {
    async fn decode(&self, data: &[u8], format_hint: Option<&str>) -> Result<Clip, CodecError> {
        let decoded = self.decode_to_pcm(data, format_hint)?;
        let mono = Self::downmix(decoded.samples, decoded.channels);

        tracing::debug!(
            sample_rate = decoded.sample_rate,
            channels = decoded.channels,
            samples = mono.len(),
            "Decoded audio clip"
        );

        Ok(Clip::new(mono, decoded.sample_rate))
    }

    async fn encode_mp3(
        &self,
        samples: &[f32],
        sample_rate: u32,
        config: &EncodeConfig,
    ) -> Result<Vec<u8>, CodecError> {
        let mp3_data = self.encode_pcm_to_mp3(samples, sample_rate, config.bitrate)?;

        tracing::debug!(
            samples = samples.len(),
            bitrate = config.bitrate,
            mp3_size = mp3_data.len(),
            "Encoded to MP3"
        );

        Ok(mp3_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 创建测试 WAV：指定时长、采样率、声道数，16 位 PCM 静音
    fn create_test_wav(duration_ms: u64, sample_rate: u32, num_channels: u16) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let num_frames = (sample_rate as u64 * duration_ms / 1000) as usize;
        let num_samples = num_frames * num_channels as usize;

        let data_size = num_samples * 2;
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(44 + data_size);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(file_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        let block_align = num_channels * (bits_per_sample / 8);
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());

        for _ in 0..num_samples {
            wav.extend_from_slice(&0i16.to_le_bytes());
        }

        wav
    }

    #[tokio::test]
    async fn test_decode_wav() {
        let codec = SymphoniaCodec::new();
        let wav = create_test_wav(1000, 16000, 1);

        let clip = codec.decode(&wav, Some("wav")).await.unwrap();
        assert_eq!(clip.sample_rate, 16000);
        assert_eq!(clip.samples.len(), 16000);
        assert!(clip.duration_ms() >= 990 && clip.duration_ms() <= 1010);
    }

    #[tokio::test]
    async fn test_decode_without_hint() {
        // probe 应通过 RIFF 魔数识别格式
        let codec = SymphoniaCodec::new();
        let wav = create_test_wav(500, 22050, 1);

        let clip = codec.decode(&wav, None).await.unwrap();
        assert_eq!(clip.sample_rate, 22050);
    }

    #[tokio::test]
    async fn test_decode_stereo_downmixed_to_mono() {
        let codec = SymphoniaCodec::new();
        let wav = create_test_wav(1000, 16000, 2);

        let clip = codec.decode(&wav, Some("wav")).await.unwrap();
        // 立体声 16000 帧 -> 单声道 16000 样本
        assert_eq!(clip.samples.len(), 16000);
    }

    #[tokio::test]
    async fn test_decode_garbage_fails() {
        let codec = SymphoniaCodec::new();
        let result = codec.decode(&[0u8; 32], Some("mp3")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_encode_mp3_produces_frame_sync() {
        let codec = SymphoniaCodec::new();
        let samples = vec![0.1f32; 22050]; // 1s @ 22.05kHz
        let config = EncodeConfig { bitrate: 32000 };

        let mp3 = codec.encode_mp3(&samples, 22050, &config).await.unwrap();
        assert!(!mp3.is_empty());
        // MPEG frame sync: 前 11 位全 1
        assert_eq!(mp3[0], 0xFF);
        assert_eq!(mp3[1] & 0xE0, 0xE0);
    }

    #[tokio::test]
    async fn test_encode_empty_fails() {
        let codec = SymphoniaCodec::new();
        let config = EncodeConfig::default();
        assert!(codec.encode_mp3(&[], 22050, &config).await.is_err());
    }

    #[test]
    fn test_nearest_bitrate() {
        assert!(matches!(nearest_bitrate(32000), Bitrate::Kbps32));
        assert!(matches!(nearest_bitrate(33000), Bitrate::Kbps40));
        assert!(matches!(nearest_bitrate(1), Bitrate::Kbps8));
        assert!(matches!(nearest_bitrate(999_000), Bitrate::Kbps320));
    }

    #[test]
    fn test_downmix_averages_channels() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5];
        let mono = SymphoniaCodec::downmix(interleaved, 2);
        assert_eq!(mono, vec![0.5, 0.5]);
    }
}
