//! Settings and queue-file persistence.

pub mod paths;
pub mod schema;
pub mod store;

pub use schema::{QueueFile, Settings};
pub use store::{SettingsStore, load_queue_file, save_queue_file};
