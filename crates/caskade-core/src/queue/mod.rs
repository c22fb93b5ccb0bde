//! The install queue: item model and the pure operations over it.

pub mod item;
pub mod ops;

pub use item::{InputPrompt, InstallItem, ItemKind, MAX_ITEM_LOG_LINES};
pub use ops::{
    AddOutcome, NewItem, add, add_multiple, create_item, generate_id, is_duplicate,
    is_duplicate_by_kind_and_name, merge, move_item, reindex, remove,
};
