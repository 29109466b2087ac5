//! Searchable, taggable index over the Safari bookmark store.
//!
//! Bookmarks are read from the browser's plist file, joined with tags kept
//! in a sideband JSON file and exposed through [`session::Session`], which a
//! front end drives. The [`status`] module answers whether the page in the
//! browser's front tab is already bookmarked.

pub mod bookmarks;
pub mod core;
pub mod search;
pub mod session;
pub mod shared;
pub mod status;

pub use session::{ActionOutcome, Session, SessionError};
