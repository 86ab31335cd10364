//! Chat panel application state
//!
//! Bridges terminal input and layout to the timeline driver. Scroll
//! positions and content heights are measured in rendered lines.

use crate::history::MemoryHistory;
use crate::message::Message;
use crate::render::{dispatch, PlainTextRenderer};
use crate::settings::TimelineSettings;
use crate::timeline::{ConversationView, Effect, SelectedContact, TimelineDriver, TimelineEvent, Viewport};
use chrono::{DateTime, TimeZone, Utc};

/// One rendered row of the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelLine {
    /// Day separator
    Day(String),
    /// A message row
    Message {
        /// Local time of day, "--:--" when unknown
        time: String,
        /// Sent by the local user
        from_me: bool,
        /// Rendered body
        text: String,
        /// Delivery indicator
        status: String,
    },
}

/// Flatten the day groups of `view` into rows
pub fn timeline_lines<Tz: TimeZone>(view: &ConversationView<'_>, now: &DateTime<Tz>) -> Vec<PanelLine> {
    let renderer = PlainTextRenderer;
    let tz = now.timezone();
    let mut lines = Vec::with_capacity(view.messages.len() + 4);

    for group in view.groups(now) {
        lines.push(PanelLine::Day(group.label));
        for message in group.messages {
            let time = message
                .sent_at
                .map(|ts| ts.with_timezone(&tz).naive_local().format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            lines.push(PanelLine::Message {
                time,
                from_me: message.from_me,
                text: dispatch(&renderer, message, message.from_me),
                status: message.status.indicator().to_string(),
            });
        }
    }
    lines
}

/// A contact entry in the side list
#[derive(Debug, Clone)]
pub struct PanelContact {
    /// Display name
    pub name: String,
    /// Selection handed to the controller
    pub selection: SelectedContact,
}

/// Chat panel application
pub struct PanelApp {
    /// Timeline driver
    pub driver: TimelineDriver<MemoryHistory>,
    /// Contacts shown in the side list
    pub contacts: Vec<PanelContact>,
    /// Index of the selected contact
    pub selected_index: usize,
    /// First visible line
    pub offset: usize,
    /// Visible lines in the message area
    pub viewport_height: usize,
    /// Status message
    pub status_message: Option<String>,
    /// Should quit
    pub should_quit: bool,
    content_height: usize,
    measure_pending: bool,
    follow_bottom: bool,
    typing: bool,
    simulated: usize,
}

const CANNED_REPLIES: &[&str] = &[
    "Thanks for the update!",
    "Can you send the brochure again?",
    "Is the offer still valid this week?",
    "Perfect, see you then.",
    "Please remove me from the Friday broadcast.",
];

impl PanelApp {
    /// Create the panel over `history`
    pub fn new(history: MemoryHistory, settings: &TimelineSettings, contacts: Vec<PanelContact>) -> Self {
        Self {
            driver: TimelineDriver::new(history, settings),
            contacts,
            selected_index: 0,
            offset: 0,
            viewport_height: 0,
            status_message: None,
            should_quit: false,
            content_height: 0,
            measure_pending: false,
            follow_bottom: false,
            typing: false,
            simulated: 0,
        }
    }

    /// Open the contact at `index`
    pub fn select_contact(&mut self, index: usize) {
        let Some(contact) = self.contacts.get(index) else {
            return;
        };
        if index == self.selected_index && self.driver.controller().conversation().is_some() {
            return;
        }
        self.selected_index = index;
        self.offset = 0;
        self.content_height = 0;
        self.typing = false;
        self.status_message = match contact.selection.conversation_id {
            Some(_) => None,
            None => Some(format!("{} has no conversation yet", contact.name)),
        };
        let effects = self
            .driver
            .dispatch(TimelineEvent::ConversationSelected(Some(contact.selection.clone())));
        self.apply_effects(effects);
    }

    /// Move to the next contact
    pub fn next_contact(&mut self) {
        if !self.contacts.is_empty() {
            self.select_contact((self.selected_index + 1) % self.contacts.len());
        }
    }

    /// Scroll towards older messages
    pub fn scroll_up(&mut self, lines: usize) {
        self.follow_bottom = false;
        self.offset = self.offset.saturating_sub(lines);
        self.report_scroll();
    }

    /// Scroll towards newer messages
    pub fn scroll_down(&mut self, lines: usize) {
        self.follow_bottom = false;
        self.offset = (self.offset + lines).min(self.max_offset());
        self.report_scroll();
    }

    /// Jump to the newest message and clear the badge
    pub fn jump_to_latest(&mut self) {
        let effects = self.driver.dispatch(TimelineEvent::JumpToLatest);
        self.apply_effects(effects);
    }

    /// Retry a failed initial load
    pub fn retry(&mut self) {
        self.status_message = None;
        let effects = self.driver.dispatch(TimelineEvent::Retry);
        self.apply_effects(effects);
    }

    /// Toggle the remote typing indicator
    pub fn toggle_typing(&mut self) {
        self.typing = !self.typing;
        let effects = self.driver.dispatch(TimelineEvent::TypingChanged(self.typing));
        self.apply_effects(effects);
    }

    /// Simulate a message from the contact
    pub fn simulate_incoming(&mut self) {
        let reply = CANNED_REPLIES[self.simulated % CANNED_REPLIES.len()];
        self.simulate(|id, conversation| Message::incoming(id, conversation, Utc::now(), reply));
    }

    /// Simulate a message typed by the local user
    pub fn simulate_outgoing(&mut self) {
        let body = format!("Follow-up #{}", self.simulated + 1);
        self.simulate(|id, conversation| Message::outgoing(id, conversation, Utc::now(), &body));
    }

    fn simulate(&mut self, build: impl FnOnce(String, String) -> Message) {
        let Some(conversation) = self.driver.controller().conversation() else {
            self.status_message = Some("No conversation selected".to_string());
            return;
        };
        let message = build(uuid::Uuid::new_v4().to_string(), conversation.conversation_id.clone());
        self.simulated += 1;

        let history = self.driver.source().clone();
        let stored = message.clone();
        tokio::spawn(async move { history.insert([stored]).await });

        let effects = self.driver.dispatch(TimelineEvent::MessageArrived(message));
        self.apply_effects(effects);
    }

    /// Apply finished fetches and queued events
    pub fn tick(&mut self) {
        let effects = self.driver.drain_events();
        self.apply_effects(effects);
    }

    /// Feed the latest layout back to the controller
    ///
    /// Called once per frame with the rendered line count and the height of
    /// the message area.
    pub fn sync_layout(&mut self, content_height: usize, viewport_height: usize) {
        let resized = viewport_height != self.viewport_height;
        self.viewport_height = viewport_height;

        if content_height != self.content_height || self.measure_pending {
            self.content_height = content_height;
            self.measure_pending = false;
            let effects = self.driver.dispatch(TimelineEvent::LayoutMeasured {
                content_height: content_height as f64,
            });
            self.apply_effects(effects);
        }

        if self.follow_bottom {
            self.follow_bottom = false;
            self.offset = self.max_offset();
            self.report_scroll();
        } else if resized {
            self.offset = self.offset.min(self.max_offset());
            self.report_scroll();
        }
    }

    /// Snapshot for rendering
    pub fn view(&self) -> ConversationView<'_> {
        self.driver.controller().view()
    }

    fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn report_scroll(&mut self) {
        let viewport = Viewport::new(
            self.offset as f64,
            self.content_height as f64,
            self.viewport_height as f64,
        );
        let effects = self.driver.dispatch(TimelineEvent::Scrolled(viewport));
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ScrollTo { offset, .. } => {
                    self.offset = (offset.max(0.0).round() as usize).min(self.max_offset());
                }
                Effect::ScrollToBottom { .. } => self.follow_bottom = true,
                Effect::MeasureLayout => self.measure_pending = true,
                Effect::FetchFailed { error, .. } => {
                    self.status_message = Some(format!("Could not load history: {}", error));
                }
                Effect::Fetch { .. } => {}
            }
        }
    }
}
