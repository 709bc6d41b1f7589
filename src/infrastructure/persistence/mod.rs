//! Persistence Layer - 数据持久化
//!
//! Sled 音频缓存实现

pub mod sled;

pub use self::sled::SledAudioCache;
