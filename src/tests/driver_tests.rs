// Driver Tests - Testing fetch execution against MemoryHistory

use super::helpers::{contact, minute_series, ts};
use crate::history::MemoryHistory;
use crate::message::Message;
use crate::settings::TimelineSettings;
use crate::timeline::{
    Effect, PageKind, Phase, SelectedContact, TimelineDriver, TimelineEvent, Viewport,
};
use crate::Error;
use std::time::Duration;

/// Wait for the next event, failing the test instead of hanging
async fn next(driver: &mut TimelineDriver<MemoryHistory>) -> Vec<Effect> {
    tokio::time::timeout(Duration::from_secs(2), driver.next_event())
        .await
        .expect("Driver produced no event in time")
}

async fn seeded(count: usize) -> MemoryHistory {
    let history = MemoryHistory::new();
    history
        .insert(minute_series("h", "2024-01-01T09:20:00Z", count))
        .await;
    history
}

#[tokio::test]
async fn test_initial_and_older_pages() {
    let history = seeded(30).await;
    let mut driver = TimelineDriver::new(history, &TimelineSettings::default());

    // Fetch effects are executed, not returned
    let effects = driver.dispatch(TimelineEvent::ConversationSelected(Some(contact())));
    assert!(effects.is_empty());
    assert_eq!(driver.controller().phase(), Phase::LoadingInitial);

    let effects = next(&mut driver).await;
    assert_eq!(effects, vec![Effect::ScrollToBottom { animated: false }]);
    assert_eq!(driver.controller().store().len(), 20);

    driver.dispatch(TimelineEvent::LayoutMeasured { content_height: 1000.0 });
    driver.dispatch(TimelineEvent::Scrolled(Viewport::new(0.0, 1000.0, 400.0)));
    assert_eq!(driver.controller().phase(), Phase::LoadingOlder);

    let effects = next(&mut driver).await;
    assert_eq!(effects, vec![Effect::MeasureLayout]);
    assert_eq!(driver.controller().store().len(), 30);
    assert_eq!(driver.controller().phase(), Phase::Idle);

    let fetches = driver.source().fetches().await;
    assert_eq!(fetches.len(), 2);
    assert_eq!(fetches[0].kind, PageKind::Initial);
    assert_eq!(fetches[1].cursor, Some(ts("2024-01-01T09:00:00Z")));
}

#[tokio::test]
async fn test_stalled_fetch_times_out() {
    let history = seeded(5).await;
    history.set_stalled(true).await;
    let settings = TimelineSettings {
        fetch_timeout_ms: 50,
        ..TimelineSettings::default()
    };
    let mut driver = TimelineDriver::new(history, &settings);

    driver.dispatch(TimelineEvent::ConversationSelected(Some(contact())));
    let effects = next(&mut driver).await;

    assert_eq!(
        effects,
        vec![Effect::FetchFailed {
            conversation_id: "conv-1".to_string(),
            kind: PageKind::Initial,
            error: Error::Timeout(50),
        }]
    );
    assert_eq!(driver.controller().phase(), Phase::Error);

    // Guard released: retry goes out and succeeds
    driver.source().set_stalled(false).await;
    driver.dispatch(TimelineEvent::Retry);
    next(&mut driver).await;
    assert_eq!(driver.controller().phase(), Phase::Idle);
    assert_eq!(driver.controller().store().len(), 5);
}

#[tokio::test]
async fn test_failed_fetch_is_retried_with_backoff() {
    let history = seeded(5).await;
    history.fail_next(2).await;
    let settings = TimelineSettings {
        max_fetch_retries: 2,
        retry_base_delay_ms: 1,
        ..TimelineSettings::default()
    };
    let mut driver = TimelineDriver::new(history, &settings);

    driver.dispatch(TimelineEvent::ConversationSelected(Some(contact())));
    assert!(next(&mut driver).await.is_empty());
    assert!(next(&mut driver).await.is_empty());
    assert_eq!(driver.controller().phase(), Phase::LoadingInitial);

    let effects = next(&mut driver).await;
    assert_eq!(effects, vec![Effect::ScrollToBottom { animated: false }]);
    assert_eq!(driver.source().fetches().await.len(), 3);
}

#[tokio::test]
async fn test_failure_without_retries_surfaces() {
    let history = seeded(5).await;
    history.fail_next(1).await;
    let mut driver = TimelineDriver::new(history, &TimelineSettings::default());

    driver.dispatch(TimelineEvent::ConversationSelected(Some(contact())));
    let effects = next(&mut driver).await;

    assert!(matches!(
        effects.as_slice(),
        [Effect::FetchFailed { error: Error::Fetch(_), .. }]
    ));
    assert!(driver.controller().view().last_error.is_some());
}

#[tokio::test]
async fn test_page_for_previous_conversation_is_discarded() {
    let history = seeded(5).await;
    history
        .insert([Message::incoming("c2-1", "conv-2", ts("2024-01-02T10:00:00Z"), "other")])
        .await;
    let mut driver = TimelineDriver::new(history, &TimelineSettings::default());

    driver.dispatch(TimelineEvent::ConversationSelected(Some(contact())));
    driver.dispatch(TimelineEvent::ConversationSelected(Some(SelectedContact::new(
        "contact-2",
        "conv-2",
    ))));

    next(&mut driver).await;
    next(&mut driver).await;

    let store = driver.controller().store();
    assert_eq!(store.len(), 1);
    assert!(store.contains("c2-1"));
    assert!(store.iter().all(|m| m.conversation_id == "conv-2"));
}

#[tokio::test]
async fn test_external_events_via_sender() {
    let history = seeded(5).await;
    let mut driver = TimelineDriver::new(history, &TimelineSettings::default());
    driver.dispatch(TimelineEvent::ConversationSelected(Some(contact())));
    next(&mut driver).await;

    let sender = driver.sender();
    sender
        .send(TimelineEvent::MessageArrived(Message::incoming(
            "live-1",
            "conv-1",
            ts("2024-01-01T12:00:00Z"),
            "hello",
        )))
        .expect("Driver dropped");
    sender.send(TimelineEvent::TypingChanged(true)).expect("Driver dropped");

    let effects = driver.drain_events();

    assert_eq!(effects, vec![Effect::ScrollToBottom { animated: true }]);
    assert!(driver.controller().store().contains("live-1"));
    assert!(driver.controller().view().is_typing);
    assert!(driver.drain_events().is_empty());
}
