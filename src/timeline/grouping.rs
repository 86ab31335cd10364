//! Day buckets for presentation

use crate::message::Message;
use crate::timeline::store::StoredMessage;
use chrono::{DateTime, Days, NaiveDate, TimeZone};
use std::collections::HashMap;

/// Messages sharing one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a> {
    /// Calendar day in the grouping time zone
    pub date: NaiveDate,
    /// "Today", "Yesterday" or a long date such as "January 5, 2024"
    pub label: String,
    /// Messages of that day in store order
    pub messages: Vec<&'a Message>,
}

/// Label for `date` as seen on `today`
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.checked_sub_days(Days::new(1)) == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%B %-d, %Y").to_string()
    }
}

/// Partition ordered entries into day buckets
///
/// Days are taken in the time zone of `now`. Each message lands in exactly
/// one bucket, buckets are ordered by their first message, and messages keep
/// their store order inside a bucket.
pub fn group_by_day<'a, Tz: TimeZone>(
    entries: &'a [StoredMessage],
    now: &DateTime<Tz>,
) -> Vec<DayGroup<'a>> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut groups: Vec<(usize, DayGroup<'a>)> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for (position, entry) in entries.iter().enumerate() {
        let date = entry.sort_at.with_timezone(&tz).date_naive();
        match index.get(&date) {
            Some(&slot) => groups[slot].1.messages.push(&entry.message),
            None => {
                index.insert(date, groups.len());
                groups.push((
                    position,
                    DayGroup {
                        date,
                        label: day_label(date, today),
                        messages: vec![&entry.message],
                    },
                ));
            }
        }
    }

    groups.sort_by_key(|(first, _)| entries[*first].sort_at);
    groups.into_iter().map(|(_, group)| group).collect()
}
