//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、AudioCodec、AudioCache、Storage）
//! - pipeline: 批处理流水线（驱动 per-file / per-line 循环）
//! - error: 应用层错误定义

pub mod error;
pub mod pipeline;
pub mod ports;

pub use error::PipelineError;
pub use pipeline::{BatchReport, PipelineConfig, SpeechPipeline, OUTPUT_EXTENSION};
