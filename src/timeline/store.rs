//! Ordered message history for the active conversation

use crate::message::{Message, MessageStatus};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A message together with its ordering key
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    /// The message itself
    pub message: Message,
    /// Timestamp used for ordering and grouping
    ///
    /// Equals `message.sent_at`, or the insertion time when that is missing.
    pub sort_at: DateTime<Utc>,
    /// Secondary ordering key for identical timestamps
    pub seq: i64,
}

impl StoredMessage {
    fn key(&self) -> (DateTime<Utc>, i64) {
        (self.sort_at, self.seq)
    }
}

/// Ordered, deduplicated message history
///
/// Entries are kept sorted by `(sort_at, seq)`. Tail inserts take increasing
/// sequence numbers and head inserts take decreasing ones, so existing
/// entries never change their relative order.
#[derive(Debug, Clone)]
pub struct MessageStore {
    entries: Vec<StoredMessage>,
    ids: HashSet<String>,
    next_tail_seq: i64,
    next_head_seq: i64,
}

impl MessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            next_tail_seq: 0,
            next_head_seq: -1,
        }
    }

    /// Insert newly arrived messages at the tail
    ///
    /// Messages whose id is already present are skipped. Returns the number
    /// of messages inserted.
    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        let mut inserted = 0;
        for message in messages {
            if self.ids.contains(&message.id) {
                continue;
            }
            let seq = self.next_tail_seq;
            self.next_tail_seq += 1;
            self.insert(message, seq);
            inserted += 1;
        }
        inserted
    }

    /// Insert an older page at the head
    ///
    /// The page is sorted ascending first; messages already present are
    /// skipped. Returns the number of messages inserted.
    pub fn prepend(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        let now = Utc::now();
        let mut page: Vec<Message> = messages
            .into_iter()
            .filter(|m| !self.ids.contains(&m.id))
            .collect();
        page.sort_by_key(|m| m.sent_at.unwrap_or(now));

        let mut seen = HashSet::new();
        page.retain(|m| seen.insert(m.id.clone()));

        // Newest of the page sits closest to the existing head
        let count = page.len() as i64;
        let first_seq = self.next_head_seq - count + 1;
        self.next_head_seq -= count;

        for (offset, message) in page.into_iter().enumerate() {
            self.insert(message, first_seq + offset as i64);
        }
        count as usize
    }

    /// Drop everything and load `messages` as the new history
    pub fn replace(&mut self, messages: impl IntoIterator<Item = Message>) {
        *self = Self::new();
        let now = Utc::now();
        let mut page: Vec<Message> = messages.into_iter().collect();
        page.sort_by_key(|m| m.sent_at.unwrap_or(now));
        self.append(page);
    }

    /// Advance the delivery status of a stored message
    pub fn update_status(&mut self, id: &str, status: MessageStatus) -> bool {
        self.entries
            .iter_mut()
            .find(|e| e.message.id == id)
            .map(|e| e.message.advance_status(status))
            .unwrap_or(false)
    }

    /// Effective timestamp of the oldest loaded message
    pub fn oldest_sent_at(&self) -> Option<DateTime<Utc>> {
        self.entries.first().map(|e| e.sort_at)
    }

    /// Check whether a message id is stored
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Look up a message by id
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.entries
            .iter()
            .find(|e| e.message.id == id)
            .map(|e| &e.message)
    }

    /// Stored entries in order
    pub fn entries(&self) -> &[StoredMessage] {
        &self.entries
    }

    /// Iterate over messages in order
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    /// Messages in order, cloned
    pub fn messages(&self) -> Vec<Message> {
        self.iter().cloned().collect()
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, message: Message, seq: i64) {
        let sort_at = match message.sent_at {
            Some(ts) => ts,
            None => {
                tracing::debug!("Message {} has no sent_at, using insertion time", message.id);
                Utc::now()
            }
        };
        let entry = StoredMessage {
            message,
            sort_at,
            seq,
        };
        let key = entry.key();
        let position = self.entries.partition_point(|e| e.key() < key);
        self.ids.insert(entry.message.id.clone());
        self.entries.insert(position, entry);
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}
