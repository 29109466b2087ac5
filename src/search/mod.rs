pub mod filter;
pub mod query;
pub mod suggest;

pub use filter::{filter_rows, VisibilityResult};
pub use query::{apply_suggestion, drop_last_segment, FilterState};
pub use suggest::{rank, SuggestionCursor, DEFAULT_SUGGESTION_THRESHOLD};
