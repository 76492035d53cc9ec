//! Binary entry point that glues the SQLite-backed domain model to the TUI:
//! set up logging, bring up the database, hydrate the initial list, and drive
//! the Ratatui event loop until the user exits.

use std::fs::{self, File};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use blog_manager::db::data_dir;
use blog_manager::{fetch_blogs, open_default, run_app, App};

/// Log file name inside the application data directory. The terminal itself
/// belongs to ratatui, so diagnostics go to disk instead of stdout.
const LOG_FILE_NAME: &str = "blog-manager.log";

fn main() -> Result<()> {
    init_logging()?;

    let conn = open_default()?;
    let blogs = fetch_blogs(&conn)?;

    let mut app = App::new(conn, blogs);
    run_app(&mut app)
}

fn init_logging() -> Result<()> {
    let dir = data_dir()?;
    fs::create_dir_all(&dir).context("failed to create data directory")?;
    let log_file = File::create(dir.join(LOG_FILE_NAME)).context("failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
