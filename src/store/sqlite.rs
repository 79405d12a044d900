use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tracing::info;

use crate::app::{AppError, Result};
use crate::domain::{Column, NewColumn};
use crate::store::ColumnStore;

const COLUMN_FIELDS: &str = r#"id, url, name, author, avatar, description, subscribers, "contentCount",
    "categoryId", "isPublished", "createdAt", "updatedAt""#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| AppError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            AppError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn row_to_column(row: &Row<'_>) -> rusqlite::Result<Column> {
        Ok(Column {
            id: row.get(0)?,
            url: row.get(1)?,
            name: row.get(2)?,
            author: row.get(3)?,
            avatar: row.get(4)?,
            description: row.get(5)?,
            subscribers: row.get::<_, i64>(6)?.max(0) as u64,
            content_count: row.get::<_, i64>(7)?.max(0) as u64,
            category_id: row.get(8)?,
            is_published: row.get(9)?,
            created_at: row
                .get::<_, String>(10)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            updated_at: row
                .get::<_, String>(11)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

fn validate(column: &NewColumn, index: usize) -> Result<()> {
    if column.url.trim().is_empty() {
        return Err(AppError::Validation(format!("column {index}: url is required")));
    }
    if column.name.trim().is_empty() {
        return Err(AppError::Validation(format!("column {index}: name is required")));
    }
    Ok(())
}

impl ColumnStore for SqliteStore {
    fn insert_columns(&self, columns: &[NewColumn]) -> Result<Vec<Column>> {
        for (index, column) in columns.iter().enumerate() {
            validate(column, index)?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now();
        let mut saved = Vec::with_capacity(columns.len());

        for (seq, new) in columns.iter().enumerate() {
            let column = Column::from_new(new, seq, now);
            tx.execute(
                r#"INSERT INTO columns (id, url, name, author, avatar, description, subscribers,
                    "contentCount", "categoryId", "isPublished", "createdAt", "updatedAt")
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
                params![
                    column.id,
                    column.url,
                    column.name,
                    column.author,
                    column.avatar,
                    column.description,
                    i64::try_from(column.subscribers).unwrap_or(i64::MAX),
                    i64::try_from(column.content_count).unwrap_or(i64::MAX),
                    column.category_id,
                    column.is_published,
                    column.created_at.to_rfc3339(),
                    column.updated_at.to_rfc3339()
                ],
            )?;
            saved.push(column);
        }

        tx.commit()?;
        info!("Saved {} columns", saved.len());
        Ok(saved)
    }

    fn get_column(&self, id: &str) -> Result<Option<Column>> {
        let conn = self.conn()?;
        let column = conn
            .query_row(
                &format!("SELECT {COLUMN_FIELDS} FROM columns WHERE id = ?1"),
                params![id],
                Self::row_to_column,
            )
            .optional()?;
        Ok(column)
    }

    fn list_columns(&self) -> Result<Vec<Column>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"SELECT {COLUMN_FIELDS} FROM columns ORDER BY "createdAt" DESC, rowid DESC"#
        ))?;
        let columns = stmt
            .query_map([], Self::row_to_column)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PreviewRecord;

    fn new_column(url: &str, name: &str) -> NewColumn {
        NewColumn {
            url: url.into(),
            name: name.into(),
            author: "阿明".into(),
            avatar: "https://img.example.com/a.png".into(),
            description: Some("每周一篇深度文章".into()),
            subscribers: 1280,
            content_count: 56,
        }
    }

    #[test]
    fn test_insert_and_get_column() {
        let store = SqliteStore::in_memory().unwrap();
        let saved = store
            .insert_columns(&[new_column("https://site/p/abc", "效率手册")])
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id.len(), 24);
        assert!(!saved[0].is_published);
        assert!(saved[0].category_id.is_none());

        let retrieved = store.get_column(&saved[0].id).unwrap().unwrap();
        assert_eq!(retrieved.name, "效率手册");
        assert_eq!(retrieved.subscribers, 1280);
        assert_eq!(retrieved.content_count, 56);
        assert_eq!(retrieved.description.as_deref(), Some("每周一篇深度文章"));
        assert!(!retrieved.is_published);
    }

    #[test]
    fn test_empty_description_stored_as_null() {
        let store = SqliteStore::in_memory().unwrap();
        let record = PreviewRecord {
            url: "https://site/p/x".into(),
            name: "X".into(),
            author: "unknown author".into(),
            description: String::new(),
            avatar: String::new(),
            reader_count: 3,
            content_count: 0,
        };
        let saved = store.insert_columns(&[NewColumn::from(record)]).unwrap();

        let retrieved = store.get_column(&saved[0].id).unwrap().unwrap();
        assert!(retrieved.description.is_none());
        assert_eq!(retrieved.subscribers, 3);
    }

    #[test]
    fn test_batch_ids_are_distinct() {
        let store = SqliteStore::in_memory().unwrap();
        let saved = store
            .insert_columns(&[
                new_column("https://site/p/same", "A"),
                new_column("https://site/p/same", "A"),
            ])
            .unwrap();
        assert_ne!(saved[0].id, saved[1].id);
        assert_eq!(store.list_columns().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_row_rejects_whole_batch() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store.insert_columns(&[
            new_column("https://site/p/ok", "Fine"),
            new_column("https://site/p/bad", "  "),
        ]);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.list_columns().unwrap().is_empty());
    }

    #[test]
    fn test_get_missing_column() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_column("nope").unwrap().is_none());
    }

    #[test]
    fn test_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("columns.db");
        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .insert_columns(&[new_column("https://site/p/abc", "效率手册")])
                .unwrap();
        }
        let store = SqliteStore::new(&path).unwrap();
        let columns = store.list_columns().unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].url, "https://site/p/abc");
    }
}
