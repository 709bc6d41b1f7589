//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod codec;
pub mod storage;
pub mod tts;

pub use codec::SymphoniaCodec;
pub use storage::{FsAudioSink, FsTextSource};
pub use tts::{FakeTtsClient, FakeTtsClientConfig, HttpTtsClient, HttpTtsClientConfig};
