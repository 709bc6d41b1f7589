//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值
//!
//! 命令行参数的覆盖在 main 中应用，之后需重新调用 `validate_config`

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `RECITE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `RECITE_TTS__URL=http://tts-server:8000`
/// - `RECITE_TTS__LANG=fr`
/// - `RECITE_AUDIO__SILENCE_MS=1000`
/// - `RECITE_CACHE__DIR=/data/cache`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.lang", "en")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("audio.silence_ms", 2000)?
        .set_default("audio.bitrate", 32000)?
        .set_default("audio.sample_rate", 0)?
        .set_default("cache.max_size_bytes", 1024_u64 * 1024 * 1024)?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: RECITE_
    // 层级分隔符: __ (双下划线)
    // 例如: RECITE_TTS__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("RECITE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证 TTS URL
    if config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    // 验证语言代码
    if config.tts.lang.is_empty() {
        return Err(ConfigError::ValidationError(
            "Language code cannot be empty".to_string(),
        ));
    }

    // 验证静音时长
    if config.audio.silence_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Silence duration cannot be 0".to_string(),
        ));
    }

    // 验证比特率
    if config.audio.bitrate == 0 {
        return Err(ConfigError::ValidationError(
            "Bitrate cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Language: {}", config.tts.lang);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("Silence Duration: {}ms", config.audio.silence_ms);
    tracing::info!("MP3 Bitrate: {}bps", config.audio.bitrate);
    if config.audio.sample_rate > 0 {
        tracing::info!("Output Sample Rate: {}Hz", config.audio.sample_rate);
    }
    match &config.cache.dir {
        Some(dir) => tracing::info!("Audio Cache: {:?}", dir),
        None => tracing::info!("Audio Cache: disabled"),
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_lang() {
        let mut config = AppConfig::default();
        config.tts.lang = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_silence() {
        let mut config = AppConfig::default();
        config.audio.silence_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_bitrate() {
        let mut config = AppConfig::default();
        config.audio.bitrate = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[tts]\nlang = \"fr\"\n\n[audio]\nsilence_ms = 500\n",
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.tts.lang, "fr");
        assert_eq!(config.audio.silence_ms, 500);
        // 未指定的键保持默认值
        assert_eq!(config.tts.url, "http://localhost:8000");
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let result = load_config_from_path(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
    }
}
