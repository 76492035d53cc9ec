use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;
use tracing::info;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".blog-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "blogs.sqlite";

/// Open (creating if absent) the application database in its default home
/// location and make sure the schema exists.
pub fn open_default() -> Result<Connection> {
    let path = data_dir()?.join(DB_FILE_NAME);
    open_at(&path)
}

/// Open a database at an arbitrary path. Split out from [`open_default`] so
/// tests can point the store at a scratch directory.
pub fn open_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    init_schema(&conn)?;
    info!(path = %path.display(), "blog database opened");
    Ok(conn)
}

/// Create the `blogs` table if it does not exist yet.
///
/// The schema deliberately leaves `name` and `body` nullable; the non-empty
/// invariant is enforced at the insertion boundary, not by SQLite.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS blogs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            body TEXT
        )",
        [],
    )
    .context("failed to create blogs table")?;
    Ok(())
}

/// Resolve the application data directory inside the user's home. The log
/// file lives here as well, so the path is public to the bootstrap code.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_at_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("blogs.sqlite");
        let conn = open_at(&path).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM blogs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert!(path.exists());
    }

    #[test]
    fn init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        conn.execute("INSERT INTO blogs (name, body) VALUES ('a', 'b')", [])
            .unwrap();
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM blogs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
