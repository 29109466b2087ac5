pub mod automation;
pub mod matcher;
pub mod normalize;
pub mod poller;
pub mod prober;

pub use automation::SafariAutomation;
pub use matcher::{best_match, MatchKind};
pub use poller::StatusPoller;
pub use prober::{
    AutomationError, BookmarkSource, BookmarkStatus, BrowserAutomation, PlistBookmarks,
    StatusProber,
};
