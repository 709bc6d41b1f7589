//! Recite - 文本目录批量转语音工具
//!
//! 读取输入目录中的文本文件，逐行调用外部 TTS 服务合成语音，
//! 行间插入固定时长的静音，每个输入文件输出一个 MP3
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - text: 可朗读行的提取
//! - timeline: 音频片段与静音的拼接
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, AudioCodec, AudioCache, Storage）
//! - Pipeline: 批处理流水线
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP/Fake TTS Client, Symphonia+LAME Codec, FS Storage
//! - Persistence: Sled 音频缓存

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
