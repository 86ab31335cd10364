//! Backward pagination state
//!
//! Tracks where the next older page starts, whether history is exhausted,
//! and which fetch (if any) is currently in flight.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Identity of a single fetch
///
/// `generation` changes on every conversation switch, so a ticket from an
/// earlier conversation never matches the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    /// Conversation generation the fetch belongs to
    pub generation: u64,
    /// Per-generation fetch number
    pub id: u64,
}

/// Which page a fetch is loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Newest page of a freshly selected conversation
    Initial,
    /// Page older than the oldest loaded message
    Older,
}

/// A page request handed to the history collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Fetch identity for the stale-response guard
    pub ticket: FetchTicket,
    /// Initial or older page
    pub kind: PageKind,
    /// Contact the conversation belongs to
    pub contact_id: String,
    /// Conversation to load
    pub conversation_id: String,
    /// Maximum page size
    pub limit: usize,
    /// Load messages strictly older than this; `None` loads the newest page
    pub cursor: Option<DateTime<Utc>>,
}

/// Retry behaviour for failed fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failure; 0 gives up immediately
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    ///
    /// The first retry waits `base_delay`, each later one twice as long.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Outcome of reporting a failed fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FailureOutcome {
    /// Ticket did not match the in-flight fetch
    Stale,
    /// Re-issue the request after `delay`; the guard stays held
    Retry {
        /// Request to send again
        request: PageRequest,
        /// Backoff before sending
        delay: Duration,
    },
    /// Retries exhausted; the guard is released
    GaveUp,
}

/// In-flight fetch bookkeeping
#[derive(Debug, Clone)]
struct InFlight {
    request: PageRequest,
    attempts: u32,
}

/// Pagination cursor with a single-flight guard
#[derive(Debug, Clone, Default)]
pub struct PaginationCursor {
    exhausted: bool,
    in_flight: Option<InFlight>,
    next_fetch_id: u64,
    retry: RetryPolicy,
}

impl PaginationCursor {
    /// Create a cursor with the given retry policy
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            exhausted: false,
            in_flight: None,
            next_fetch_id: 0,
            retry,
        }
    }

    /// Start a fetch if none is running and history is not exhausted
    ///
    /// `oldest` is the timestamp of the oldest loaded message, or `None` for
    /// an empty conversation. A second call while a fetch is in flight is
    /// dropped, not queued.
    pub fn request(
        &mut self,
        kind: PageKind,
        generation: u64,
        contact_id: &str,
        conversation_id: &str,
        oldest: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.exhausted {
            return None;
        }
        let request = PageRequest {
            ticket: FetchTicket {
                generation,
                id: self.next_fetch_id,
            },
            kind,
            contact_id: contact_id.to_string(),
            conversation_id: conversation_id.to_string(),
            limit,
            cursor: oldest,
        };
        self.next_fetch_id += 1;
        self.in_flight = Some(InFlight {
            request: request.clone(),
            attempts: 0,
        });
        Some(request)
    }

    /// Whether `ticket` is the fetch currently in flight
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| f.request.ticket == ticket)
    }

    /// Record a successful fetch that returned `returned` messages
    ///
    /// A short page marks history as exhausted. Returns the finished request,
    /// or `None` when the ticket is not the one in flight.
    pub fn complete(&mut self, ticket: FetchTicket, returned: usize) -> Option<PageRequest> {
        if !self.is_current(ticket) {
            return None;
        }
        let finished = self.in_flight.take()?.request;
        if returned < finished.limit {
            self.exhausted = true;
        }
        Some(finished)
    }

    /// Record a failed fetch
    ///
    /// The cursor position is unchanged either way.
    pub fn fail(&mut self, ticket: FetchTicket) -> FailureOutcome {
        if !self.is_current(ticket) {
            return FailureOutcome::Stale;
        }
        let max_retries = self.retry.max_retries;
        let Some(flight) = self.in_flight.as_mut() else {
            return FailureOutcome::Stale;
        };
        if flight.attempts < max_retries {
            flight.attempts += 1;
            let delay = self.retry.delay_for(flight.attempts);
            return FailureOutcome::Retry {
                request: flight.request.clone(),
                delay,
            };
        }
        self.in_flight = None;
        FailureOutcome::GaveUp
    }

    /// Stop paging even though the last page was full
    pub fn exhaust(&mut self) {
        self.exhausted = true;
    }

    /// Forget in-flight state and exhaustion for a new conversation
    pub fn reset(&mut self) {
        self.exhausted = false;
        self.in_flight = None;
    }

    /// Whether a fetch is running
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Kind of the fetch in flight, if any
    pub fn loading_kind(&self) -> Option<PageKind> {
        self.in_flight.as_ref().map(|f| f.request.kind)
    }

    /// Whether the start of history has been reached
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Retry policy in use
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}
