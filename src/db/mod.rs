//! Persistence module split across logical submodules.

mod blogs;
mod connection;
mod error;

pub use blogs::{create_blog, delete_blog, fetch_blogs, search_blogs};
pub use connection::{data_dir, init_schema, open_at, open_default};
pub use error::StoreError;
