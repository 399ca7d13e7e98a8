//! 键值持久化原语
//!
//! 词汇仓库只依赖“按 key 读写字符串”这一能力；这里提供 SQLite 与内存两种实现。

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use parking_lot::RwLock;
use rusqlite::{params, Connection, OptionalExtension};

use crate::storage::migrations;
use crate::storage::{StorageError, StorageResult};

/// 持久化键值存储
pub trait KeyValueStore: Send + Sync {
    /// 读取 key 对应的值，不存在时返回 `None`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// 写入（插入或覆盖）
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// 删除 key，返回是否确实删除了记录
    fn remove(&self, key: &str) -> StorageResult<bool>;
}

// ============================================================
// SqliteKvStore
// ============================================================

/// 基于 SQLite 单表的键值存储
pub struct SqliteKvStore {
    connection: Mutex<Connection>,
    db_path: String,
}

impl SqliteKvStore {
    /// 打开（或创建）数据库文件
    ///
    /// 自动启用 WAL 模式并运行迁移。父目录不存在时会先创建。
    pub fn open<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Migration(format!("创建数据目录 {} 失败: {}", parent.display(), e))
            })?;
        }

        let connection = Connection::open(path)?;
        connection.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;

        Self::with_connection(connection, path.to_string_lossy().to_string())
    }

    /// 创建内存数据库（用于测试）
    pub fn in_memory() -> StorageResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::with_connection(connection, ":memory:".to_string())
    }

    fn with_connection(connection: Connection, db_path: String) -> StorageResult<Self> {
        let version = migrations::run_migrations(&connection)?;
        tracing::debug!(db_path = %db_path, version, "kv store ready");

        Ok(Self {
            connection: Mutex::new(connection),
            db_path,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn get_conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;

        Ok(affected > 0)
    }
}

// ============================================================
// MemoryKvStore
// ============================================================

/// 进程内键值存储，不落盘
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));

        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_kv_operations() {
        let store = SqliteKvStore::in_memory().expect("Failed to create in-memory store");
        assert_eq!(store.db_path(), ":memory:");
        exercise(&store);
    }

    #[test]
    fn test_memory_kv_operations() {
        exercise(&MemoryKvStore::new());
    }

    #[test]
    fn test_sqlite_kv_persists_across_reopen() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("nested").join("kv.db");

        {
            let store = SqliteKvStore::open(&path).unwrap();
            store.set("@lingoflow_vocabulary", "[]").unwrap();
        }

        let reopened = SqliteKvStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("@lingoflow_vocabulary").unwrap().as_deref(),
            Some("[]")
        );
    }
}
