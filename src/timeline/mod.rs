//! Conversation timeline module
//!
//! This module drives the chat message panel:
//! - `store` - Ordered, deduplicated message history
//! - `cursor` - Backward pagination and the single-flight fetch guard
//! - `grouping` - Day buckets for presentation
//! - `anchor` - Viewport geometry and scroll anchoring across prepends
//! - `unread` - Auto-follow versus unread counting
//! - `controller` - State machine composing the above
//! - `driver` - Async runner executing fetch effects

pub mod anchor;
pub mod controller;
pub mod cursor;
pub mod driver;
pub mod grouping;
pub mod store;
pub mod unread;

// Re-export commonly used types
pub use anchor::{ScrollAnchor, Viewport};
pub use controller::{
    ActiveConversation, ConversationView, CursorState, Effect, Phase, SelectedContact,
    TimelineController, TimelineEvent,
};
pub use cursor::{FetchTicket, PageKind, PageRequest, PaginationCursor, RetryPolicy};
pub use driver::TimelineDriver;
pub use grouping::{group_by_day, DayGroup};
pub use store::{MessageStore, StoredMessage};
pub use unread::{Arrival, UnreadTracker};
