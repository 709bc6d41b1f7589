//! Recite - 文本目录批量转语音工具
//!
//! 装配流程：
//! - 加载配置（命令行 > 环境变量 > 配置文件 > 默认值）
//! - 构建适配器（HTTP TTS、Symphonia+LAME 编解码、FS 存储、可选 Sled 缓存）
//! - 运行批处理流水线

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use recite::application::ports::{AudioCachePort, TtsEnginePort};
use recite::application::{PipelineConfig, SpeechPipeline};
use recite::config::{load_config_from_path, print_config, validate_config};
use recite::infrastructure::adapters::{
    FsAudioSink, FsTextSource, HttpTtsClient, HttpTtsClientConfig, SymphoniaCodec,
};
use recite::infrastructure::persistence::sled::{SledAudioCache, SledCacheConfig};

/// Generate spoken MP3 audio files from the text files in a directory.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input directory containing text files
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output directory for generated audio files
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Silence duration between text lines in milliseconds (default: 2000)
    #[arg(long)]
    silence_duration: Option<u64>,

    /// Language code for speech synthesis (default: en)
    #[arg(long)]
    lang: Option<String>,

    /// Base URL of the TTS service
    #[arg(long)]
    tts_url: Option<String>,

    /// Directory for the synthesized-audio cache
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Disable the synthesized-audio cache
    #[arg(long)]
    no_cache: bool,

    /// Path to a configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let mut config = load_config_from_path(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 命令行参数覆盖配置
    if let Some(ms) = args.silence_duration {
        config.audio.silence_ms = ms;
    }
    if let Some(lang) = args.lang {
        config.tts.lang = lang;
    }
    if let Some(url) = args.tts_url {
        config.tts.url = url;
    }
    if args.no_cache {
        config.cache.dir = None;
    } else if let Some(dir) = args.cache_dir {
        config.cache.dir = Some(dir);
    }
    validate_config(&config).map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},recite={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    print_config(&config);

    // 创建 HTTP TTS 引擎
    let tts_config = HttpTtsClientConfig {
        base_url: config.tts.url.clone(),
        timeout_secs: config.tts.timeout_secs,
    };
    let tts_engine = Arc::new(HttpTtsClient::new(tts_config)?);

    if !tts_engine.health_check().await {
        tracing::warn!(url = %config.tts.url, "TTS service health check failed, proceeding anyway");
    }

    // 创建 Sled 音频缓存（配置了缓存目录时启用）
    let audio_cache: Option<Arc<dyn AudioCachePort>> = match &config.cache.dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir).await?;
            let cache_config = SledCacheConfig {
                db_path: dir.join("cache.sled").to_string_lossy().to_string(),
                max_size_bytes: config.cache.max_size_bytes,
            };
            let cache: Arc<dyn AudioCachePort> = SledAudioCache::new(&cache_config)?.arc();
            Some(cache)
        }
        None => None,
    };

    // 装配流水线
    let pipeline_config = PipelineConfig {
        lang: config.tts.lang.clone(),
        silence_ms: config.audio.silence_ms,
        bitrate: config.audio.bitrate,
        sample_rate: config.audio.sample_rate,
    };
    let pipeline = SpeechPipeline::new(
        Arc::new(FsTextSource::new()),
        Arc::new(FsAudioSink::new()),
        tts_engine,
        Arc::new(SymphoniaCodec::new()),
        audio_cache,
        pipeline_config,
    );

    // 运行批处理；per-file 失败已在流水线内报告，不影响退出码
    pipeline
        .run_batch(&args.input_dir, &args.output_dir)
        .await?;

    Ok(())
}
