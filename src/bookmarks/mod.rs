pub mod reader;
pub mod table;
pub mod tags;
pub mod types;
pub mod watcher;

pub use types::{BookmarkNode, BookmarkRecord, DisplayRow, TagSet};
