use rusqlite::Row;

/// Manual row mapping, one impl per persisted model.
pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}
