//! Conversation timeline state machine
//!
//! The controller owns the message store, pagination cursor, unread badge
//! and pending scroll anchor of the active conversation. Every input is a
//! [`TimelineEvent`]; [`TimelineController::update`] applies it and returns
//! the [`Effect`]s the host has to carry out (fetches, scrolling, layout
//! measurement, failure notices). The controller itself never performs I/O.

use crate::message::{Message, MessageStatus};
use crate::settings::TimelineSettings;
use crate::timeline::anchor::{ScrollAnchor, Viewport};
use crate::timeline::cursor::{FailureOutcome, FetchTicket, PageKind, PageRequest, PaginationCursor};
use crate::timeline::grouping::{group_by_day, DayGroup};
use crate::timeline::store::{MessageStore, StoredMessage};
use crate::timeline::unread::{Arrival, UnreadTracker};
use crate::Error;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// Contact chosen in the contact list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedContact {
    /// Contact ID
    pub contact_id: String,
    /// Conversation ID; `None` means the contact has no conversation yet
    pub conversation_id: Option<String>,
}

impl SelectedContact {
    /// Contact with an existing conversation
    pub fn new(contact_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            conversation_id: Some(conversation_id.into()),
        }
    }
}

/// Conversation the controller is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConversation {
    /// Contact ID
    pub contact_id: String,
    /// Conversation ID
    pub conversation_id: String,
}

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loading
    Idle,
    /// Waiting for the newest page of a freshly selected conversation
    LoadingInitial,
    /// Waiting for an older page
    LoadingOlder,
    /// The initial page could not be loaded
    Error,
}

/// Where the next older page starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Oldest loaded timestamp, `None` when nothing is loaded
    Oldest(Option<DateTime<Utc>>),
    /// Start of history reached
    Exhausted,
}

/// Inputs to the controller
#[derive(Debug, Clone)]
pub enum TimelineEvent {
    /// A contact was selected, or the panel was left (`None`)
    ConversationSelected(Option<SelectedContact>),
    /// The host reported new viewport geometry after a user scroll
    Scrolled(Viewport),
    /// The host finished a layout pass
    LayoutMeasured {
        /// Total content height after layout
        content_height: f64,
    },
    /// A live message arrived (not history backfill)
    MessageArrived(Message),
    /// Delivery status update for a stored message
    StatusChanged {
        /// Message ID
        id: String,
        /// New status
        status: MessageStatus,
    },
    /// Remote typing indicator changed
    TypingChanged(bool),
    /// Explicit "jump to latest" action
    JumpToLatest,
    /// Try loading the initial page again after a failure
    Retry,
    /// A fetch resolved
    PageLoaded {
        /// Ticket of the originating request
        ticket: FetchTicket,
        /// Page contents, ascending by `sent_at`
        messages: Vec<Message>,
    },
    /// A fetch rejected or timed out
    PageFailed {
        /// Ticket of the originating request
        ticket: FetchTicket,
        /// Failure reason
        error: Error,
    },
}

/// Work the host has to carry out
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the history collaborator for a page after `delay`
    Fetch {
        /// Page to load
        request: PageRequest,
        /// Backoff before sending, zero for first attempts
        delay: Duration,
    },
    /// Move the viewport to an absolute offset
    ScrollTo {
        /// Target offset
        offset: f64,
        /// Whether to animate
        animated: bool,
    },
    /// Move the viewport to the bottom of the content
    ScrollToBottom {
        /// Whether to animate
        animated: bool,
    },
    /// Report the content height after the next layout pass
    MeasureLayout,
    /// A fetch failed for good
    FetchFailed {
        /// Conversation of the failed fetch
        conversation_id: String,
        /// Which page failed
        kind: PageKind,
        /// Failure reason
        error: Error,
    },
}

/// Read-only snapshot of the active conversation
#[derive(Debug, Clone)]
pub struct ConversationView<'a> {
    /// Active conversation
    pub conversation: Option<&'a ActiveConversation>,
    /// Ordered history
    pub messages: &'a [StoredMessage],
    /// Pagination position
    pub cursor: CursorState,
    /// Whether an older page is being fetched
    pub loading_older: bool,
    /// Unread badge
    pub unread_count: usize,
    /// Remote typing indicator
    pub is_typing: bool,
    /// Controller phase
    pub phase: Phase,
    /// Last surfaced fetch failure
    pub last_error: Option<&'a Error>,
}

impl<'a> ConversationView<'a> {
    /// Day buckets of the history as seen at `now`
    pub fn groups<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<DayGroup<'a>> {
        group_by_day(self.messages, now)
    }
}

/// Timeline controller for the chat panel
#[derive(Debug, Clone)]
pub struct TimelineController {
    page_size: usize,
    top_threshold: f64,
    conversation: Option<ActiveConversation>,
    generation: u64,
    phase: Phase,
    store: MessageStore,
    cursor: PaginationCursor,
    unread: UnreadTracker,
    viewport: Viewport,
    is_typing: bool,
    pending_anchor: Option<ScrollAnchor>,
    pending_bottom: bool,
    last_error: Option<Error>,
}

impl TimelineController {
    /// Create a controller with no conversation selected
    pub fn new(settings: &TimelineSettings) -> Self {
        Self {
            page_size: settings.page_size.max(1),
            top_threshold: settings.top_threshold,
            conversation: None,
            generation: 0,
            phase: Phase::Idle,
            store: MessageStore::new(),
            cursor: PaginationCursor::new(settings.retry_policy()),
            unread: UnreadTracker::new(settings.follow_threshold),
            viewport: Viewport::default(),
            is_typing: false,
            pending_anchor: None,
            pending_bottom: false,
            last_error: None,
        }
    }

    /// Apply one event and return the effects it produced
    pub fn update(&mut self, event: TimelineEvent) -> Vec<Effect> {
        if let TimelineEvent::ConversationSelected(selected) = event {
            return self.select(selected);
        }
        if self.conversation.is_none() {
            tracing::debug!("Ignoring {:?} with no conversation selected", event);
            return Vec::new();
        }

        match event {
            TimelineEvent::ConversationSelected(_) => Vec::new(),
            TimelineEvent::Scrolled(viewport) => self.on_scroll(viewport),
            TimelineEvent::LayoutMeasured { content_height } => self.on_layout(content_height),
            TimelineEvent::MessageArrived(message) => self.on_message(message),
            TimelineEvent::StatusChanged { id, status } => {
                if !self.store.update_status(&id, status) {
                    tracing::debug!("Status {:?} for message {} not applied", status, id);
                }
                Vec::new()
            }
            TimelineEvent::TypingChanged(typing) => {
                self.is_typing = typing;
                Vec::new()
            }
            TimelineEvent::JumpToLatest => {
                self.unread.reset();
                self.pending_bottom = true;
                vec![Effect::ScrollToBottom { animated: true }]
            }
            TimelineEvent::Retry => self.retry_initial(),
            TimelineEvent::PageLoaded { ticket, messages } => self.on_page(ticket, messages),
            TimelineEvent::PageFailed { ticket, error } => self.on_failure(ticket, error),
        }
    }

    /// Consume the controller, apply `event`, and return the new state
    pub fn reduce(mut self, event: TimelineEvent) -> (Self, Vec<Effect>) {
        let effects = self.update(event);
        (self, effects)
    }

    /// Snapshot of the active conversation
    pub fn view(&self) -> ConversationView<'_> {
        ConversationView {
            conversation: self.conversation.as_ref(),
            messages: self.store.entries(),
            cursor: self.cursor_state(),
            loading_older: self.phase == Phase::LoadingOlder,
            unread_count: self.unread.count(),
            is_typing: self.is_typing,
            phase: self.phase,
            last_error: self.last_error.as_ref(),
        }
    }

    /// Pagination position
    pub fn cursor_state(&self) -> CursorState {
        if self.cursor.is_exhausted() {
            CursorState::Exhausted
        } else {
            CursorState::Oldest(self.store.oldest_sent_at())
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Unread badge
    pub fn unread_count(&self) -> usize {
        self.unread.count()
    }

    /// Last known viewport geometry
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Message history
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Active conversation, if any
    pub fn conversation(&self) -> Option<&ActiveConversation> {
        self.conversation.as_ref()
    }

    /// Identity of the current conversation session
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a prepend is waiting for its layout measurement
    pub fn has_pending_anchor(&self) -> bool {
        self.pending_anchor.is_some()
    }

    fn select(&mut self, selected: Option<SelectedContact>) -> Vec<Effect> {
        let next = selected.and_then(|s| {
            s.conversation_id.map(|conversation_id| ActiveConversation {
                contact_id: s.contact_id,
                conversation_id,
            })
        });

        if next.is_some() && next == self.conversation {
            tracing::debug!("Conversation already selected");
            return Vec::new();
        }

        self.generation += 1;
        self.store = MessageStore::new();
        self.cursor.reset();
        self.unread.reset();
        self.is_typing = false;
        self.pending_anchor = None;
        self.pending_bottom = false;
        self.last_error = None;
        self.viewport = Viewport::new(0.0, 0.0, self.viewport.viewport_height);
        self.conversation = next;

        match &self.conversation {
            Some(active) => {
                tracing::info!(
                    "Opening conversation {} (contact {}, generation {})",
                    active.conversation_id,
                    active.contact_id,
                    self.generation
                );
                self.phase = Phase::LoadingInitial;
                self.request_page(PageKind::Initial).into_iter().collect()
            }
            None => {
                tracing::info!("Conversation closed");
                self.phase = Phase::Idle;
                Vec::new()
            }
        }
    }

    fn request_page(&mut self, kind: PageKind) -> Option<Effect> {
        let active = self.conversation.as_ref()?;
        let oldest = match kind {
            PageKind::Initial => None,
            PageKind::Older => self.store.oldest_sent_at(),
        };
        let request = self.cursor.request(
            kind,
            self.generation,
            &active.contact_id,
            &active.conversation_id,
            oldest,
            self.page_size,
        )?;
        tracing::debug!("Requesting {:?} page for {} before {:?}", kind, request.conversation_id, request.cursor);
        Some(Effect::Fetch {
            request,
            delay: Duration::ZERO,
        })
    }

    fn retry_initial(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Error {
            return Vec::new();
        }
        self.cursor.reset();
        self.last_error = None;
        self.phase = Phase::LoadingInitial;
        self.request_page(PageKind::Initial).into_iter().collect()
    }

    fn on_scroll(&mut self, viewport: Viewport) -> Vec<Effect> {
        self.viewport = viewport;
        self.unread.on_scroll(viewport.distance_from_bottom());

        let can_page = self.phase == Phase::Idle
            && self.pending_anchor.is_none()
            && !self.cursor.is_exhausted()
            && viewport.is_near_top(self.top_threshold);
        if !can_page {
            return Vec::new();
        }
        match self.request_page(PageKind::Older) {
            Some(effect) => {
                self.phase = Phase::LoadingOlder;
                vec![effect]
            }
            None => Vec::new(),
        }
    }

    fn on_layout(&mut self, content_height: f64) -> Vec<Effect> {
        self.viewport.content_height = content_height;

        if let Some(anchor) = self.pending_anchor.take() {
            let offset = anchor.resolve(content_height);
            tracing::debug!("Anchoring viewport: content grew by {}", anchor.delta(content_height));
            self.viewport.offset = offset;
            return vec![Effect::ScrollTo {
                offset,
                animated: false,
            }];
        }
        if self.pending_bottom {
            self.pending_bottom = false;
            self.viewport.pin_to_bottom();
        }
        Vec::new()
    }

    fn on_message(&mut self, message: Message) -> Vec<Effect> {
        let Some(active) = self.conversation.as_ref() else {
            return Vec::new();
        };
        if message.conversation_id != active.conversation_id {
            tracing::debug!(
                "Dropping message {} for inactive conversation {}",
                message.id,
                message.conversation_id
            );
            return Vec::new();
        }
        if self.store.contains(&message.id) {
            // Redelivery may still carry a newer status
            self.store.update_status(&message.id, message.status);
            return Vec::new();
        }

        let from_me = message.from_me;
        self.store.append([message]);

        match self
            .unread
            .on_arrival(self.viewport.distance_from_bottom(), from_me, self.is_typing)
        {
            Arrival::Follow => {
                self.pending_bottom = true;
                vec![Effect::ScrollToBottom { animated: true }]
            }
            Arrival::CountUnread => Vec::new(),
        }
    }

    fn on_page(&mut self, ticket: FetchTicket, messages: Vec<Message>) -> Vec<Effect> {
        if ticket.generation != self.generation {
            tracing::debug!("Discarding stale page from generation {}", ticket.generation);
            return Vec::new();
        }
        let returned = messages.len();
        let Some(request) = self.cursor.complete(ticket, returned) else {
            tracing::debug!("Discarding page for unknown fetch {:?}", ticket);
            return Vec::new();
        };

        let messages: Vec<Message> = messages
            .into_iter()
            .filter(|m| {
                let belongs = m.conversation_id == request.conversation_id;
                if !belongs {
                    tracing::warn!("History page contained message {} from {}", m.id, m.conversation_id);
                }
                belongs
            })
            .collect();

        self.phase = Phase::Idle;
        match request.kind {
            PageKind::Initial => {
                tracing::info!("Loaded {} messages for {}", messages.len(), request.conversation_id);
                // Live messages received while loading are already in the store
                self.store.append(messages);
                self.pending_bottom = true;
                vec![Effect::ScrollToBottom { animated: false }]
            }
            PageKind::Older => {
                let anchor = ScrollAnchor::capture(&self.viewport);
                let oldest_before = self.store.oldest_sent_at();
                let inserted = self.store.prepend(messages);
                tracing::debug!("Prepended {} older messages", inserted);
                if inserted == 0 {
                    if !self.cursor.is_exhausted() && self.store.oldest_sent_at() == oldest_before {
                        tracing::warn!(
                            "Older page for {} added nothing, stopping pagination",
                            request.conversation_id
                        );
                        self.cursor.exhaust();
                    }
                    return Vec::new();
                }
                self.pending_anchor = Some(anchor);
                vec![Effect::MeasureLayout]
            }
        }
    }

    fn on_failure(&mut self, ticket: FetchTicket, error: Error) -> Vec<Effect> {
        if ticket.generation != self.generation {
            tracing::debug!("Discarding stale failure from generation {}", ticket.generation);
            return Vec::new();
        }
        let kind = self.cursor.loading_kind();
        match self.cursor.fail(ticket) {
            FailureOutcome::Stale => Vec::new(),
            FailureOutcome::Retry { request, delay } => {
                tracing::warn!("Fetch failed: {}. Retrying in {:?}", error, delay);
                vec![Effect::Fetch { request, delay }]
            }
            FailureOutcome::GaveUp => {
                let kind = kind.unwrap_or(PageKind::Older);
                tracing::warn!("Giving up on {:?} page: {}", kind, error);
                self.phase = match kind {
                    PageKind::Initial => Phase::Error,
                    PageKind::Older => Phase::Idle,
                };
                self.last_error = Some(error.clone());
                let conversation_id = self
                    .conversation
                    .as_ref()
                    .map(|c| c.conversation_id.clone())
                    .unwrap_or_default();
                vec![Effect::FetchFailed {
                    conversation_id,
                    kind,
                    error,
                }]
            }
        }
    }
}
