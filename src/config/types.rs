//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 合成语言代码（全局默认，不按文件或行推断）
    #[serde(default = "default_lang")]
    pub lang: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            lang: default_lang(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 音频配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 行间静音时长（毫秒）
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u64,

    /// MP3 输出比特率（bps）
    /// 语音推荐: 32000-64000
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,

    /// 输出采样率（Hz）
    /// 如果为 0，则由第一个语音片段决定
    #[serde(default)]
    pub sample_rate: u32,
}

fn default_silence_ms() -> u64 {
    2000
}

fn default_bitrate() -> u32 {
    32000 // 32kbps，语音足够
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            silence_ms: default_silence_ms(),
            bitrate: default_bitrate(),
            sample_rate: 0,
        }
    }
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存目录；未设置时禁用缓存
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// 最大缓存大小（字节）
    #[serde(default = "default_cache_max_size")]
    pub max_size_bytes: u64,
}

fn default_cache_max_size() -> u64 {
    1024 * 1024 * 1024 // 1GB
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_size_bytes: default_cache_max_size(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
