// Database module

pub mod label_sets;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use crate::error::{LabelError, Result};

/// Open an existing annotations database. The schema is owned by the backend,
/// so a missing file is an error rather than a new database.
pub fn open_existing_db(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(LabelError::not_found("Database file", db_path));
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    Ok(conn)
}
