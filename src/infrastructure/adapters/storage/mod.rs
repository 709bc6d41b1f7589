//! Storage Adapter - 文件系统存储实现

mod fs_audio_sink;
mod fs_text_source;

pub use fs_audio_sink::FsAudioSink;
pub use fs_text_source::FsTextSource;
