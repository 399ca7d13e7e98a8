//! 数据库迁移模块
//!
//! 键值表的结构很小，但仍按版本号记录在 schema_migrations 表中，
//! 后续如需为单词建立独立行存储可在此追加迁移。

use rusqlite::Connection;

use crate::storage::{StorageError, StorageResult};

/// 当前数据库 schema 版本
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// 迁移记录
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// 获取所有迁移定义（按版本号升序）
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        name: "键值存储表",
        sql: r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
        "#,
    }]
}

fn ensure_migrations_table(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        );
        "#,
    )
    .map_err(|e| StorageError::Migration(format!("创建迁移表失败: {}", e)))?;

    Ok(())
}

/// 获取当前数据库版本，没有迁移记录时返回 0
pub fn get_current_version(conn: &Connection) -> i32 {
    if ensure_migrations_table(conn).is_err() {
        return 0;
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// 运行数据库迁移
///
/// 每个迁移在独立事务中执行，失败时回滚该迁移并返回错误。
/// 成功返回最终版本号。
pub fn run_migrations(conn: &Connection) -> StorageResult<i32> {
    ensure_migrations_table(conn)?;

    let mut current = get_current_version(conn);
    tracing::debug!(
        current,
        target = CURRENT_SCHEMA_VERSION,
        "checking kv store schema"
    );

    for migration in get_migrations() {
        if migration.version <= current {
            continue;
        }

        tracing::info!(version = migration.version, name = migration.name, "running migration");
        execute_migration_in_transaction(conn, &migration).map_err(|e| {
            tracing::error!(version = migration.version, error = %e, "migration failed");
            e
        })?;
        current = migration.version;
    }

    Ok(current)
}

fn execute_migration_in_transaction(conn: &Connection, migration: &Migration) -> StorageResult<()> {
    conn.execute("BEGIN IMMEDIATE", [])?;

    let applied = conn.execute_batch(migration.sql).and_then(|_| {
        conn.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                migration.version,
                migration.name,
                chrono::Utc::now().timestamp()
            ],
        )
    });

    match applied {
        Ok(_) => {
            conn.execute("COMMIT", [])?;
            Ok(())
        }
        Err(e) => {
            conn.execute("ROLLBACK", []).ok();
            Err(StorageError::Migration(format!(
                "迁移 v{} 执行失败: {}",
                migration.version, e
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_migrations_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        let version = run_migrations(&conn).unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_store')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn test_run_migrations_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let version = run_migrations(&conn).unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, get_migrations().len() as i64);
    }

    #[test]
    fn test_get_current_version_empty() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_current_version(&conn), 0);
    }
}
