//! Audio Cache Port - 音频缓存管理
//!
//! 定义合成音频缓存的抽象接口，具体实现使用 Sled (LRU 缓存)

use async_trait::async_trait;
use thiserror::Error;

/// Audio Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存元数据
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    /// 文本内容的 md5
    pub content_hash: String,
    /// 合成语言代码
    pub lang: String,
    /// 音频时长（毫秒），服务可能不提供
    pub duration_ms: Option<u64>,
    /// 采样率
    pub sample_rate: Option<u32>,
}

/// Audio Cache Port
///
/// 基于 content hash + 语言代码的 LRU 缓存
/// - 缓存 key: md5(text) + lang
/// - 缓存值为 TTS 服务返回的原始音频字节流（解码前）
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 存储音频数据
    ///
    /// 自动执行 LRU 淘汰以保持缓存大小在限制内
    async fn put(
        &self,
        cache_key: &str,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError>;

    /// 根据缓存 key 获取音频数据
    ///
    /// 同时更新 last_accessed 时间戳（LRU touch）
    async fn get(&self, cache_key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// 检查缓存是否存在
    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError>;

    /// 删除缓存条目
    async fn remove(&self, cache_key: &str) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// 生成缓存 key
///
/// 使用 md5(text) + 语言代码作为缓存 key
pub fn generate_cache_key(text: &str, lang: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    let content_hash = format!("{:x}", digest);
    format!("{}:{}", content_hash, lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        let key = generate_cache_key("Hello", "en");
        assert!(key.ends_with(":en"));
        // md5 十六进制为 32 字符
        assert_eq!(key.len(), 32 + 1 + 2);
    }

    #[test]
    fn test_cache_key_distinguishes_lang() {
        assert_ne!(
            generate_cache_key("Hello", "en"),
            generate_cache_key("Hello", "fr")
        );
    }

    #[test]
    fn test_cache_key_deterministic() {
        assert_eq!(
            generate_cache_key("Hello", "en"),
            generate_cache_key("Hello", "en")
        );
    }
}
