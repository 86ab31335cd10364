// Grouping Tests - Testing day buckets

use super::helpers::{create_test_message, ts};
use crate::timeline::grouping::day_label;
use crate::timeline::{group_by_day, MessageStore};
use chrono::{FixedOffset, NaiveDate, Utc};

fn store_of(messages: Vec<crate::message::Message>) -> MessageStore {
    let mut store = MessageStore::new();
    store.append(messages);
    store
}

#[test]
fn test_past_day_uses_long_date() {
    let store = store_of(vec![
        create_test_message("1", "2024-01-01T10:00:00Z"),
        create_test_message("2", "2024-01-01T10:05:00Z"),
    ]);
    let now = ts("2024-03-15T12:00:00Z");

    let groups = group_by_day(store.entries(), &now);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "January 1, 2024");
    let ids: Vec<&str> = groups[0].messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[test]
fn test_today_and_yesterday_labels() {
    let store = store_of(vec![
        create_test_message("old", "2024-03-10T10:00:00Z"),
        create_test_message("yesterday", "2024-03-14T23:30:00Z"),
        create_test_message("today", "2024-03-15T00:10:00Z"),
    ]);
    let now = ts("2024-03-15T12:00:00Z");

    let labels: Vec<String> = group_by_day(store.entries(), &now)
        .into_iter()
        .map(|g| g.label)
        .collect();

    assert_eq!(labels, vec!["March 10, 2024", "Yesterday", "Today"]);
}

#[test]
fn test_days_follow_the_given_time_zone() {
    let store = store_of(vec![
        create_test_message("late", "2024-03-14T23:30:00Z"),
        create_test_message("early", "2024-03-15T00:10:00Z"),
    ]);
    // UTC+2: both messages fall on March 15 local time
    let tz = FixedOffset::east_opt(2 * 3600).expect("Valid offset");
    let now = ts("2024-03-15T12:00:00Z").with_timezone(&tz);

    let groups = group_by_day(store.entries(), &now);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "Today");
    assert_eq!(groups[0].messages.len(), 2);
}

#[test]
fn test_partition_has_no_loss_or_duplication() {
    let store = store_of(vec![
        create_test_message("a", "2024-01-01T08:00:00Z"),
        create_test_message("b", "2024-01-01T09:00:00Z"),
        create_test_message("c", "2024-01-03T08:00:00Z"),
        create_test_message("d", "2024-01-05T08:00:00Z"),
        create_test_message("e", "2024-01-05T08:00:00Z"),
        create_test_message("f", "2024-01-07T18:00:00Z"),
    ]);
    let now = Utc::now();

    let groups = group_by_day(store.entries(), &now);

    let flattened: Vec<&str> = groups
        .iter()
        .flat_map(|g| g.messages.iter().map(|m| m.id.as_str()))
        .collect();
    let stored: Vec<&str> = store.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(flattened, stored);

    let dates: Vec<NaiveDate> = groups.iter().map(|g| g.date).collect();
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_empty_history_has_no_groups() {
    let store = MessageStore::new();
    assert!(group_by_day(store.entries(), &Utc::now()).is_empty());
}

#[test]
fn test_day_label_formats() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 6).expect("Valid date");
    let five = NaiveDate::from_ymd_opt(2024, 1, 5).expect("Valid date");
    let fourth = NaiveDate::from_ymd_opt(2024, 1, 4).expect("Valid date");

    assert_eq!(day_label(today, today), "Today");
    assert_eq!(day_label(five, today), "Yesterday");
    assert_eq!(day_label(fourth, today), "January 4, 2024");
}
