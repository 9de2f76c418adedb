//! AutoVault: a local-first vehicle expense tracker. SQLite-backed store with
//! live queries, typed command handlers, reporting rollups and CSV export.

pub mod aggregate;
pub mod catalog;
pub mod commands;
pub mod db;
mod error;
pub mod export;
mod id;
pub mod live;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod remote;
pub mod store;
pub mod time;

pub use error::{AppError, AppResult};
pub use id::new_uuid_v7;
pub use live::{LiveHub, QuerySpec, Subscription};
pub use store::{CascadeOutcome, Filter, SortOrder, Store};
