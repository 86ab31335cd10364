//! Shared test helpers

use crate::message::Message;
use crate::settings::TimelineSettings;
use crate::timeline::{
    Effect, FetchTicket, PageRequest, SelectedContact, TimelineController, TimelineEvent, Viewport,
};
use chrono::{DateTime, Duration, Utc};

/// Parse an RFC 3339 timestamp
pub fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("Invalid test timestamp")
        .with_timezone(&Utc)
}

/// Incoming text message in conversation "conv-1"
pub fn create_test_message(id: &str, sent_at: &str) -> Message {
    Message::incoming(id, "conv-1", ts(sent_at), &format!("body of {}", id))
}

/// `count` incoming messages one minute apart, ending one minute before `end`
pub fn minute_series(prefix: &str, end: &str, count: usize) -> Vec<Message> {
    let end = ts(end);
    (0..count)
        .rev()
        .map(|i| {
            Message::incoming(
                format!("{}-{}", prefix, i),
                "conv-1",
                end - Duration::minutes(i as i64 + 1),
                "series",
            )
        })
        .collect()
}

/// The contact used across controller tests
pub fn contact() -> SelectedContact {
    SelectedContact::new("contact-1", "conv-1")
}

/// Extract the single fetch request from a set of effects
pub fn fetch_request(effects: &[Effect]) -> PageRequest {
    let requests: Vec<&PageRequest> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Fetch { request, .. } => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(requests.len(), 1, "Expected exactly one fetch in {:?}", effects);
    requests[0].clone()
}

/// Whether the effects contain any fetch
pub fn has_fetch(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Fetch { .. }))
}

/// Controller with "conv-1" loaded from `initial`, viewport at the bottom
///
/// Content height is 50 units per message, viewport height 400.
pub fn loaded_controller(settings: &TimelineSettings, initial: Vec<Message>) -> TimelineController {
    let mut controller = TimelineController::new(settings);
    let effects = controller.update(TimelineEvent::ConversationSelected(Some(contact())));
    let request = fetch_request(&effects);

    let height = initial.len() as f64 * 50.0;
    controller.update(TimelineEvent::PageLoaded {
        ticket: request.ticket,
        messages: initial,
    });
    controller.update(TimelineEvent::LayoutMeasured {
        content_height: height,
    });
    let bottom = (height - 400.0).max(0.0);
    controller.update(TimelineEvent::Scrolled(Viewport::new(bottom, height, 400.0)));
    controller
}

/// Ticket for a fetch that never existed
pub fn bogus_ticket(generation: u64) -> FetchTicket {
    FetchTicket { generation, id: 999 }
}
