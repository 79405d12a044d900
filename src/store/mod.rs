pub mod sqlite;

use crate::app::Result;
use crate::domain::{Column, NewColumn};

pub use sqlite::SqliteStore;

/// Destination for reviewed preview records
pub trait ColumnStore: Send + Sync {
    /// Insert every column in one transaction; nothing is written if any row fails.
    fn insert_columns(&self, columns: &[NewColumn]) -> Result<Vec<Column>>;
    fn get_column(&self, id: &str) -> Result<Option<Column>>;
    /// Newest first
    fn list_columns(&self) -> Result<Vec<Column>>;
}
