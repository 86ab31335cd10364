//! Auto-follow versus unread counting for live messages

/// What to do with a newly arrived message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Scroll the viewport to the newest message
    Follow,
    /// Leave the viewport alone and bump the unread badge
    CountUnread,
}

/// Unread badge state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnreadTracker {
    count: usize,
    follow_threshold: f64,
}

impl UnreadTracker {
    /// Create a tracker that follows when within `follow_threshold` of the bottom
    pub fn new(follow_threshold: f64) -> Self {
        Self {
            count: 0,
            follow_threshold,
        }
    }

    /// Decide how to handle one live message and update the count
    pub fn on_arrival(&mut self, distance_from_bottom: f64, from_me: bool, is_typing: bool) -> Arrival {
        if distance_from_bottom <= self.follow_threshold || from_me || is_typing {
            Arrival::Follow
        } else {
            self.count += 1;
            Arrival::CountUnread
        }
    }

    /// Reset when the user reaches the bottom
    ///
    /// Returns whether the viewport counts as at the bottom.
    pub fn on_scroll(&mut self, distance_from_bottom: f64) -> bool {
        let at_bottom = distance_from_bottom <= self.follow_threshold;
        if at_bottom {
            self.count = 0;
        }
        at_bottom
    }

    /// Clear the badge unconditionally
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Current unread count
    pub fn count(&self) -> usize {
        self.count
    }

    /// Proximity threshold in layout units
    pub fn follow_threshold(&self) -> f64 {
        self.follow_threshold
    }
}
