//! System configuration key/value store.
//!
//! Values are JSON documents; the column carries a `json_valid` check.

use crate::repo::{ensure_schema_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// Repository interface for `sys_configs`.
pub trait ConfigRepository {
    fn get_value(&self, key: &str) -> RepoResult<Option<Value>>;
    /// Inserts or replaces one key.
    fn set_value(&self, key: &str, value: &Value) -> RepoResult<()>;
    /// All keys in ascending order.
    fn list_values(&self) -> RepoResult<Vec<(String, Value)>>;
}

pub struct SqliteConfigRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConfigRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ConfigRepository for SqliteConfigRepository<'_> {
    fn get_value(&self, key: &str) -> RepoResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM sys_configs WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|text| decode_value(key, &text)).transpose()
    }

    fn set_value(&self, key: &str, value: &Value) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO sys_configs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    fn list_values(&self) -> RepoResult<Vec<(String, Value)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM sys_configs ORDER BY key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let text: String = row.get(1)?;
            let value = decode_value(&key, &text)?;
            values.push((key, value));
        }
        Ok(values)
    }
}

fn decode_value(key: &str, text: &str) -> RepoResult<Value> {
    serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!("invalid JSON in sys_configs `{key}`: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::{ConfigRepository, SqliteConfigRepository};
    use crate::db::open_db_in_memory;
    use serde_json::json;

    #[test]
    fn set_value_overwrites_existing_key() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteConfigRepository::try_new(&conn).expect("repo");

        repo.set_value("page.max_size", &json!(50)).expect("first write");
        repo.set_value("page.max_size", &json!(80)).expect("second write");

        assert_eq!(
            repo.get_value("page.max_size").expect("read"),
            Some(json!(80))
        );
        assert_eq!(repo.list_values().expect("list").len(), 1);
    }

    #[test]
    fn missing_key_reads_as_none() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteConfigRepository::try_new(&conn).expect("repo");
        assert_eq!(repo.get_value("nope").expect("read"), None);
    }
}
