//! Speech Pipeline - 批处理流水线
//!
//! 驱动整个转换流程：列出输入目录 → 逐文件逐行合成 → 拼接时间线 →
//! 编码为 MP3 → 写出。单个文件的失败被捕获并报告，批处理继续

use std::path::Path;
use std::sync::Arc;

use crate::application::error::PipelineError;
use crate::application::ports::{
    generate_cache_key, AudioCachePort, AudioCodecPort, AudioSinkPort, CacheMetadata,
    EncodeConfig, SynthesisRequest, TextSourcePort, TtsEnginePort,
};
use crate::domain::{speakable_lines, Clip, Timeline};

/// 输出文件扩展名（固定容器格式）
pub const OUTPUT_EXTENSION: &str = "mp3";

/// 流水线配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 合成语言代码（全局默认，不按文件推断）
    pub lang: String,
    /// 行间静音时长（毫秒）
    pub silence_ms: u64,
    /// MP3 输出比特率（bps）
    pub bitrate: u32,
    /// 输出采样率（Hz），0 表示由第一个语音片段决定
    pub sample_rate: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            silence_ms: 2000,
            bitrate: 32000,
            sample_rate: 0,
        }
    }
}

/// 批处理结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// 成功写出的文件数
    pub processed: usize,
    /// 没有可朗读行而被跳过的文件数
    pub skipped: usize,
    /// 处理失败的文件数
    pub failed: usize,
}

/// 单个文件的处理结果
#[derive(Debug)]
enum FileOutcome {
    /// 已写出输出文件
    Written { duration_ms: u64, lines: usize },
    /// 文件没有可朗读的行，不产生输出
    NoSpeakableLines,
}

/// 批处理流水线
///
/// 所有外部协作者通过端口注入；顺序执行，一次一个文件、一次一行
pub struct SpeechPipeline {
    text_source: Arc<dyn TextSourcePort>,
    audio_sink: Arc<dyn AudioSinkPort>,
    tts_engine: Arc<dyn TtsEnginePort>,
    codec: Arc<dyn AudioCodecPort>,
    audio_cache: Option<Arc<dyn AudioCachePort>>,
    config: PipelineConfig,
}

impl SpeechPipeline {
    pub fn new(
        text_source: Arc<dyn TextSourcePort>,
        audio_sink: Arc<dyn AudioSinkPort>,
        tts_engine: Arc<dyn TtsEnginePort>,
        codec: Arc<dyn AudioCodecPort>,
        audio_cache: Option<Arc<dyn AudioCachePort>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            text_source,
            audio_sink,
            tts_engine,
            codec,
            audio_cache,
            config,
        }
    }

    /// 处理整个输入目录
    ///
    /// 每个文件恰好尝试一次；per-file 错误被报告后继续。
    /// 返回 Err 仅当输出目录无法创建
    pub async fn run_batch(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<BatchReport, PipelineError> {
        let input_files = self.text_source.list_files(input_dir).await;
        if input_files.is_empty() {
            tracing::info!(dir = %input_dir.display(), "No files to process");
            return Ok(BatchReport::default());
        }

        self.audio_sink.ensure_dir(output_dir).await?;

        let mut report = BatchReport::default();

        for input_path in &input_files {
            let stem = match input_path.file_stem() {
                Some(s) => s.to_string_lossy().into_owned(),
                None => {
                    tracing::warn!(file = %input_path.display(), "Cannot derive output name, skipping");
                    report.failed += 1;
                    continue;
                }
            };
            let output_path = output_dir.join(format!("{}.{}", stem, OUTPUT_EXTENSION));

            match self.process_file(input_path, &output_path).await {
                Ok(FileOutcome::Written { duration_ms, lines }) => {
                    report.processed += 1;
                    tracing::info!(
                        output = %output_path.display(),
                        lines = lines,
                        duration_ms = duration_ms,
                        "Audio file generated"
                    );
                }
                Ok(FileOutcome::NoSpeakableLines) => {
                    report.skipped += 1;
                    tracing::warn!(
                        file = %input_path.display(),
                        "No speakable lines, skipping"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        file = %input_path.display(),
                        error = %e,
                        "Error processing file"
                    );
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Batch complete"
        );

        Ok(report)
    }

    /// 处理单个输入文件：读行 → 合成+拼接 → 编码 → 写出
    async fn process_file(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<FileOutcome, PipelineError> {
        let text = self.text_source.read_text(input_path).await?;
        let lines = speakable_lines(&text);
        if lines.is_empty() {
            return Ok(FileOutcome::NoSpeakableLines);
        }

        let mut timeline = if self.config.sample_rate > 0 {
            Timeline::with_sample_rate(self.config.sample_rate)
        } else {
            Timeline::new()
        };

        // 按文件内顺序逐行合成，每个语音片段后跟一段静音
        for line in &lines {
            let clip = self.synthesize_line(line).await?;
            timeline.append_speech(clip);
            timeline.append_silence(self.config.silence_ms);
        }

        let sample_rate = timeline.sample_rate().ok_or_else(|| {
            PipelineError::Internal("timeline has no sample rate after synthesis".to_string())
        })?;

        let encode_config = EncodeConfig {
            bitrate: self.config.bitrate,
        };
        let mp3_data = self
            .codec
            .encode_mp3(timeline.samples(), sample_rate, &encode_config)
            .await?;

        self.audio_sink.save(output_path, &mp3_data).await?;

        Ok(FileOutcome::Written {
            duration_ms: timeline.duration_ms(),
            lines: lines.len(),
        })
    }

    /// 合成一行文本并解码为 PCM 片段
    ///
    /// 缓存命中时跳过 HTTP 调用；缓存故障只降级为重新合成，不影响文件处理
    async fn synthesize_line(&self, text: &str) -> Result<Clip, PipelineError> {
        let cache_key = generate_cache_key(text, &self.config.lang);

        if let Some(cache) = &self.audio_cache {
            match cache.get(&cache_key).await {
                Ok(Some(audio_data)) => {
                    tracing::debug!(cache_key = %cache_key, "Cache hit");
                    return Ok(self.codec.decode(&audio_data, None).await?);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Cache lookup failed, synthesizing");
                }
            }
        }

        let request = SynthesisRequest {
            text: text.to_string(),
            lang: self.config.lang.clone(),
        };
        let response = self.tts_engine.synthesize(request).await?;

        if let Some(cache) = &self.audio_cache {
            let metadata = CacheMetadata {
                content_hash: cache_key.clone(),
                lang: self.config.lang.clone(),
                duration_ms: response.duration_ms,
                sample_rate: response.sample_rate,
            };
            if let Err(e) = cache
                .put(&cache_key, response.audio_data.clone(), metadata)
                .await
            {
                tracing::warn!(error = %e, "Failed to cache audio");
            }
        }

        let clip = self
            .codec
            .decode(&response.audio_data, response.format_hint.as_deref())
            .await?;
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{SynthesisResponse, TtsError};
    use crate::infrastructure::adapters::{
        FakeTtsClient, FakeTtsClientConfig, FsAudioSink, FsTextSource, SymphoniaCodec,
    };
    use crate::infrastructure::persistence::sled::{SledAudioCache, SledCacheConfig};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// 统计合成调用次数的 TTS 包装器
    struct CountingTts {
        inner: FakeTtsClient,
        calls: AtomicUsize,
    }

    impl CountingTts {
        fn new() -> Self {
            Self {
                inner: FakeTtsClient::new(FakeTtsClientConfig::default()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TtsEnginePort for CountingTts {
        async fn synthesize(
            &self,
            request: SynthesisRequest,
        ) -> Result<SynthesisResponse, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.synthesize(request).await
        }
    }

    fn test_pipeline(
        tts: Arc<dyn TtsEnginePort>,
        cache: Option<Arc<dyn AudioCachePort>>,
    ) -> SpeechPipeline {
        SpeechPipeline::new(
            Arc::new(FsTextSource::new()),
            Arc::new(FsAudioSink::new()),
            tts,
            Arc::new(SymphoniaCodec::new()),
            cache,
            PipelineConfig {
                silence_ms: 100,
                ..Default::default()
            },
        )
    }

    fn fake_tts() -> Arc<dyn TtsEnginePort> {
        Arc::new(FakeTtsClient::new(FakeTtsClientConfig::default()))
    }

    #[tokio::test]
    async fn test_notes_txt_yields_notes_mp3() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        std::fs::write(input.path().join("notes.txt"), "Hello\n\nWorld\n").unwrap();

        let pipeline = test_pipeline(fake_tts(), None);
        let report = pipeline
            .run_batch(input.path(), output.path())
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
        let out_path = output.path().join("notes.mp3");
        assert!(out_path.exists());
        assert!(std::fs::metadata(&out_path).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_bad_file_does_not_stop_batch() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        std::fs::write(input.path().join("good.txt"), "Hello\n").unwrap();
        // 非 UTF-8 内容，读取阶段失败
        std::fs::write(input.path().join("bad.txt"), [0xFFu8, 0xFE, 0x80, 0x81]).unwrap();

        let pipeline = test_pipeline(fake_tts(), None);
        let report = pipeline
            .run_batch(input.path(), output.path())
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert!(output.path().join("good.mp3").exists());
        assert!(!output.path().join("bad.mp3").exists());
    }

    #[tokio::test]
    async fn test_blank_only_file_skipped() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        std::fs::write(input.path().join("empty.txt"), "\n   \n\t\n").unwrap();

        let pipeline = test_pipeline(fake_tts(), None);
        let report = pipeline
            .run_batch(input.path(), output.path())
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed, 0);
        assert!(!output.path().join("empty.mp3").exists());
    }

    #[tokio::test]
    async fn test_missing_input_dir_yields_empty_report() {
        let output = tempdir().unwrap();
        let pipeline = test_pipeline(fake_tts(), None);

        let report = pipeline
            .run_batch(Path::new("/nonexistent/recite-input"), output.path())
            .await
            .unwrap();

        assert_eq!(report, BatchReport::default());
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cache_skips_repeat_synthesis() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        std::fs::write(input.path().join("notes.txt"), "Hello\nWorld\n").unwrap();

        let cache = SledAudioCache::new(&SledCacheConfig {
            db_path: cache_dir
                .path()
                .join("cache.sled")
                .to_string_lossy()
                .to_string(),
            max_size_bytes: 64 * 1024 * 1024,
        })
        .unwrap();

        let cache: Arc<dyn AudioCachePort> = Arc::new(cache);
        let counting = Arc::new(CountingTts::new());
        let pipeline = test_pipeline(counting.clone(), Some(cache));

        pipeline
            .run_batch(input.path(), output.path())
            .await
            .unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);

        // 第二次运行：两行均命中缓存，不再调用 TTS
        pipeline
            .run_batch(input.path(), output.path())
            .await
            .unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }
}
