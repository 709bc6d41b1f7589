//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod audio_codec;
mod storage;
mod tts_engine;

pub use audio_cache::{
    generate_cache_key, AudioCachePort, CacheError, CacheMetadata, CacheStats,
};
pub use audio_codec::{AudioCodecPort, CodecError, EncodeConfig};
pub use storage::{AudioSinkPort, StorageError, TextSourcePort};
pub use tts_engine::{SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError};
