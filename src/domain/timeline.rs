//! 音频时间线
//!
//! 维护单个输出文件的音频拼接状态：依次追加（语音片段, 静音间隔）对，
//! 记录每个段的边界，供导出和测试观察结构

/// 单声道 PCM 音频片段
///
/// 由解码器从合成语音的字节流产生，立即被时间线消费
#[derive(Debug, Clone)]
pub struct Clip {
    /// 单声道 f32 样本（-1.0 ~ 1.0）
    pub samples: Vec<f32>,
    /// 采样率（Hz）
    pub sample_rate: u32,
}

impl Clip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// 片段时长（毫秒）
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}

/// 时间线段的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// 合成语音
    Speech,
    /// 行间静音
    Silence,
}

/// 时间线中的一个段（语音或静音）
#[derive(Debug, Clone)]
pub struct Segment {
    pub kind: SegmentKind,
    /// 段长度（样本数）
    pub len: usize,
}

/// 音频时间线
///
/// 采样率由第一个语音片段确定（或通过 `with_sample_rate` 预先固定），
/// 之后追加的片段若采样率不同则线性重采样到时间线采样率
#[derive(Debug, Default)]
pub struct Timeline {
    samples: Vec<f32>,
    sample_rate: Option<u32>,
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建固定采样率的时间线
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: Some(sample_rate),
            segments: Vec::new(),
        }
    }

    /// 追加一个语音片段
    ///
    /// 第一个片段确定时间线采样率；后续片段按需重采样
    pub fn append_speech(&mut self, clip: Clip) {
        let rate = *self.sample_rate.get_or_insert(clip.sample_rate);

        let samples = if clip.sample_rate != rate {
            resample(&clip.samples, clip.sample_rate, rate)
        } else {
            clip.samples
        };

        self.segments.push(Segment {
            kind: SegmentKind::Speech,
            len: samples.len(),
        });
        self.samples.extend(samples);
    }

    /// 追加一段静音间隔
    ///
    /// 在任何语音片段之前（采样率未知时）追加的静音会被丢弃
    pub fn append_silence(&mut self, duration_ms: u64) {
        let Some(rate) = self.sample_rate else {
            return;
        };
        let len = (rate as u64 * duration_ms / 1000) as usize;
        if len == 0 {
            return;
        }

        self.segments.push(Segment {
            kind: SegmentKind::Silence,
            len,
        });
        self.samples.extend(std::iter::repeat(0.0f32).take(len));
    }

    /// 时间线是否不含任何语音段
    pub fn is_empty(&self) -> bool {
        !self
            .segments
            .iter()
            .any(|s| s.kind == SegmentKind::Speech)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// 时间线采样率；没有追加过语音时为 None
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 语音段数量
    pub fn speech_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Speech)
            .count()
    }

    /// 静音段数量
    pub fn silence_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Silence)
            .count()
    }

    /// 总时长（毫秒）
    pub fn duration_ms(&self) -> u64 {
        match self.sample_rate {
            Some(rate) if rate > 0 => (self.samples.len() as u64 * 1000) / rate as u64,
            _ => 0,
        }
    }
}

/// 单声道线性重采样
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f64;

        let s0 = samples.get(src_idx).copied().unwrap_or(0.0);
        let s1 = samples.get(src_idx + 1).copied().unwrap_or(s0);

        // 线性插值
        resampled.push(s0 + (s1 - s0) * frac as f32);
    }

    resampled
}
