pub mod calendar;
pub mod cli;
pub mod config;
pub mod database;
pub mod export;
pub mod journal;
pub mod models;
pub mod quotes;
pub mod search;
pub mod stats;
pub mod store;
pub mod utils;
pub mod word_cloud;

pub use config::Config;
pub use database::Database;
pub use journal::{JournalError, JournalService};
pub use models::{Entry, Todo};
pub use store::{EntityStore, MemoryStore, PersistenceError};
pub use utils::Profile;
