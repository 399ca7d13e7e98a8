//! 单词集合存储
//!
//! 整个单词列表序列化为一个 JSON 数组存放在单个 key 下，没有按记录的粒度。

use std::sync::Arc;

use crate::storage::{KeyValueStore, StorageResult, Word};

#[derive(Clone)]
pub struct WordStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl WordStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 读取全部单词。
    ///
    /// 未存储过或反序列化失败时返回空列表，错误只记录日志。
    pub fn load_all(&self) -> Vec<Word> {
        match self.try_load_all() {
            Ok(words) => words,
            Err(err) => {
                tracing::error!(key = %self.key, error = %err, "failed to load words");
                Vec::new()
            }
        }
    }

    /// 读取全部单词，读取或反序列化失败时返回错误
    pub fn try_load_all(&self) -> StorageResult<Vec<Word>> {
        match self.kv.get(&self.key)? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn save_all(&self, words: &[Word]) -> StorageResult<()> {
        let data = serde_json::to_string(words)?;
        self.kv.set(&self.key, &data)
    }

    /// 删除整个 key
    pub fn clear(&self) -> StorageResult<bool> {
        self.kv.remove(&self.key)
    }
}
