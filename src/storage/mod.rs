//! 本地词汇存储模块
//!
//! 提供：
//! - 单词数据模型（`models`）
//! - 键值持久化原语及其 SQLite / 内存实现（`kv`）
//! - 单键 JSON 文档形式的单词集合存储（`word_store`）
//! - 基于读-改-写的词汇仓库（`word`）

// ============================================================
// 子模块声明
// ============================================================

pub mod kv;
pub mod migrations;
pub mod models;
pub mod word;
pub mod word_store;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore};
pub use migrations::run_migrations;
pub use models::*;
pub use word::{ImportReport, WordRepository};
pub use word_store::WordStore;

use thiserror::Error;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("数据未找到: {0}")]
    NotFound(String),

    #[error("数据校验失败: {0}")]
    Validation(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StorageError::Validation(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
