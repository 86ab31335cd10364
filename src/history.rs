//! History collaborator interface
//!
//! The controller never talks to the network. Older pages come from a
//! [`HistorySource`], which the [`crate::timeline::TimelineDriver`] calls
//! for every `Fetch` effect.

use crate::message::Message;
use crate::timeline::cursor::PageRequest;
use crate::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Supplier of message history pages
pub trait HistorySource: Send + Sync + 'static {
    /// Fetch one page
    ///
    /// Returns at most `request.limit` messages of `request.conversation_id`
    /// strictly older than `request.cursor` (or the newest ones when the
    /// cursor is `None`), ascending by `sent_at`. May fail; the driver
    /// applies its own timeout.
    fn fetch_page(&self, request: &PageRequest) -> impl Future<Output = Result<Vec<Message>>> + Send;
}

#[derive(Debug, Default)]
struct MemoryState {
    conversations: HashMap<String, Vec<Message>>,
    fail_next: u32,
    stalled: bool,
    fetches: Vec<PageRequest>,
}

/// In-memory history with simulated latency and failures
///
/// Cheap to clone; clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    state: Arc<RwLock<MemoryState>>,
    latency: Duration,
}

impl MemoryHistory {
    /// Create an empty history that answers immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Add messages to their conversations
    pub async fn insert(&self, messages: impl IntoIterator<Item = Message>) {
        let mut state = self.state.write().await;
        for message in messages {
            let thread = state
                .conversations
                .entry(message.conversation_id.clone())
                .or_default();
            thread.push(message);
        }
        for thread in state.conversations.values_mut() {
            thread.sort_by_key(|m| m.sent_at);
        }
    }

    /// Make the next `count` fetches fail
    pub async fn fail_next(&self, count: u32) {
        self.state.write().await.fail_next = count;
    }

    /// Make fetches hang forever (or stop hanging)
    pub async fn set_stalled(&self, stalled: bool) {
        self.state.write().await.stalled = stalled;
    }

    /// Requests received so far
    pub async fn fetches(&self) -> Vec<PageRequest> {
        self.state.read().await.fetches.clone()
    }

    /// Number of stored messages in a conversation
    pub async fn message_count(&self, conversation_id: &str) -> usize {
        self.state
            .read()
            .await
            .conversations
            .get(conversation_id)
            .map_or(0, Vec::len)
    }
}

impl HistorySource for MemoryHistory {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Message>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let stalled = {
            let mut state = self.state.write().await;
            state.fetches.push(request.clone());
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(Error::Fetch(format!(
                    "History unavailable for {}",
                    request.conversation_id
                )));
            }
            state.stalled
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let state = self.state.read().await;
        let Some(thread) = state.conversations.get(&request.conversation_id) else {
            return Ok(Vec::new());
        };
        let older: Vec<&Message> = thread
            .iter()
            .filter(|m| match request.cursor {
                Some(cursor) => m.sent_at.is_some_and(|ts| ts < cursor),
                None => true,
            })
            .collect();
        let start = older.len().saturating_sub(request.limit);
        Ok(older[start..].iter().map(|m| (*m).clone()).collect())
    }
}
