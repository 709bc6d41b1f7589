//! Sled-based LRU Audio Cache Implementation

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{AudioCachePort, CacheError, CacheMetadata, CacheStats};

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 最大缓存大小（字节）
    pub max_size_bytes: u64,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/cache.sled".to_string(),
            max_size_bytes: 1024 * 1024 * 1024, // 1GB
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    audio_data: Vec<u8>,
    size_bytes: u64,
    content_hash: String,
    lang: String,
    duration_ms: Option<u64>,
    sample_rate: Option<u32>,
    last_accessed: i64,
    created_at: i64,
}

/// Sled 音频缓存
///
/// 缓存 TTS 服务返回的原始音频字节流，key 为 md5(text):lang
pub struct SledAudioCache {
    db: Db,
    max_size_bytes: u64,
    current_size: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledAudioCache {
    /// 创建新的缓存实例
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        // 计算当前缓存大小
        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            max_size_bytes = config.max_size_bytes,
            current_size = current_size,
            "SledAudioCache initialized"
        );

        Ok(Self {
            db,
            max_size_bytes: config.max_size_bytes,
            current_size: AtomicU64::new(current_size),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P, max_size_bytes: u64) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            max_size_bytes,
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 计算数据库中所有条目的总大小
    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix("cache:") {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                total += entry.size_bytes;
            }
        }
        Ok(total)
    }

    /// LRU 淘汰
    ///
    /// 返回是否淘汰了条目（空缓存返回 false）
    fn evict_lru(&self) -> Result<bool, CacheError> {
        let mut oldest: Option<(String, InternalCacheEntry)> = None;

        for item in self.db.scan_prefix("cache:") {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                let is_older = oldest
                    .as_ref()
                    .map(|(_, e)| entry.last_accessed < e.last_accessed)
                    .unwrap_or(true);

                if is_older {
                    let key_str = String::from_utf8(key.to_vec())
                        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                    oldest = Some((key_str, entry));
                }
            }
        }

        let Some((key, entry)) = oldest else {
            return Ok(false);
        };

        self.db
            .remove(&key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
        tracing::debug!(
            key = %key,
            size_bytes = entry.size_bytes,
            "LRU evicted cache entry"
        );

        Ok(true)
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AudioCachePort for SledAudioCache {
    async fn put(
        &self,
        cache_key: &str,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError> {
        let size = audio_data.len() as u64;

        // 淘汰以腾出空间
        while self.current_size.load(Ordering::Relaxed) + size > self.max_size_bytes {
            if !self.evict_lru()? {
                break;
            }
        }

        let now = Utc::now().timestamp();
        let entry = InternalCacheEntry {
            audio_data,
            size_bytes: size,
            content_hash: metadata.content_hash,
            lang: metadata.lang,
            duration_ms: metadata.duration_ms,
            sample_rate: metadata.sample_rate,
            last_accessed: now,
            created_at: now,
        };

        let entry_bytes = bincode::serialize(&entry)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(format!("cache:{}", cache_key), entry_bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        self.current_size.fetch_add(size, Ordering::Relaxed);

        tracing::debug!(
            cache_key = %cache_key,
            size_bytes = size,
            "Audio cached"
        );

        Ok(())
    }

    async fn get(&self, cache_key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = format!("cache:{}", cache_key);

        match self.db.get(&key) {
            Ok(Some(data)) => {
                let mut entry: InternalCacheEntry = bincode::deserialize(&data)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;

                // 更新 last_accessed (LRU touch)
                entry.last_accessed = Utc::now().timestamp();
                let entry_bytes = bincode::serialize(&entry)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                self.db
                    .insert(&key, entry_bytes)
                    .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.audio_data))
            }
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError> {
        let key = format!("cache:{}", cache_key);
        self.db
            .contains_key(&key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))
    }

    async fn remove(&self, cache_key: &str) -> Result<(), CacheError> {
        let key = format!("cache:{}", cache_key);

        if let Some(data) = self
            .db
            .remove(&key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?
        {
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&data) {
                self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let total_entries = self.db.scan_prefix("cache:").count();

        CacheStats {
            total_entries,
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.max_size_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_cache(dir: &Path, max_size_bytes: u64) -> SledAudioCache {
        let config = SledCacheConfig {
            db_path: dir.join("test.sled").to_string_lossy().to_string(),
            max_size_bytes,
        };
        SledAudioCache::new(&config).unwrap()
    }

    fn test_metadata(hash: &str) -> CacheMetadata {
        CacheMetadata {
            content_hash: hash.to_string(),
            lang: "en".to_string(),
            duration_ms: Some(1000),
            sample_rate: Some(22050),
        }
    }

    #[tokio::test]
    async fn test_cache_put_get() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 1024 * 1024);

        let audio_data = vec![1, 2, 3, 4, 5];
        cache
            .put("test_key", audio_data.clone(), test_metadata("h1"))
            .await
            .unwrap();

        let result = cache.get("test_key").await.unwrap();
        assert_eq!(result, Some(audio_data));

        assert!(cache.exists("test_key").await.unwrap());

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[tokio::test]
    async fn test_cache_miss_counted() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 1024 * 1024);

        assert_eq!(cache.get("absent").await.unwrap(), None);

        let stats = cache.stats().await;
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 0);
    }

    #[tokio::test]
    async fn test_cache_remove() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 1024 * 1024);

        cache
            .put("k", vec![0; 100], test_metadata("h"))
            .await
            .unwrap();
        cache.remove("k").await.unwrap();

        assert!(!cache.exists("k").await.unwrap());
        assert_eq!(cache.stats().await.total_size_bytes, 0);
    }

    #[tokio::test]
    async fn test_lru_eviction_when_over_max_size() {
        let dir = tempdir().unwrap();
        // 上限只够放一个 100 字节条目
        let cache = test_cache(dir.path(), 150);

        cache
            .put("first", vec![0; 100], test_metadata("h1"))
            .await
            .unwrap();
        cache
            .put("second", vec![0; 100], test_metadata("h2"))
            .await
            .unwrap();

        // 最早的条目被淘汰
        assert!(!cache.exists("first").await.unwrap());
        assert!(cache.exists("second").await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_entry_still_stored() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 50);

        // 条目超过总上限：淘汰空转后仍然写入（单条目不拒绝）
        cache
            .put("big", vec![0; 100], test_metadata("h"))
            .await
            .unwrap();
        assert!(cache.exists("big").await.unwrap());
    }
}
