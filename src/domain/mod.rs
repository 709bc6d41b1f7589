//! Domain Layer - 领域层
//!
//! 包含：
//! - text: 文本行提取（可朗读行的判定）
//! - timeline: 音频时间线（片段与静音的拼接）

mod text;
mod timeline;

pub use text::speakable_lines;
pub use timeline::{Clip, Segment, SegmentKind, Timeline};
