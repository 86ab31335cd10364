//! Async runner for the timeline controller
//!
//! The controller is pure; the driver carries out its `Fetch` effects on
//! tokio and feeds the results back as events. Everything else is returned
//! to the host (scrolling, layout measurement, failure notices).

use crate::history::HistorySource;
use crate::settings::TimelineSettings;
use crate::timeline::controller::{Effect, TimelineController, TimelineEvent};
use crate::timeline::cursor::PageRequest;
use crate::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs a [`TimelineController`] against a [`HistorySource`]
pub struct TimelineDriver<S: HistorySource> {
    controller: TimelineController,
    source: Arc<S>,
    fetch_timeout: Duration,
    events_tx: mpsc::UnboundedSender<TimelineEvent>,
    events_rx: mpsc::UnboundedReceiver<TimelineEvent>,
}

impl<S: HistorySource> TimelineDriver<S> {
    /// Create a driver
    pub fn new(source: S, settings: &TimelineSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller: TimelineController::new(settings),
            source: Arc::new(source),
            fetch_timeout: settings.fetch_timeout(),
            events_tx,
            events_rx,
        }
    }

    /// Sender for events produced elsewhere (live messages, typing, status)
    ///
    /// Events sent here are applied by [`Self::next_event`] and
    /// [`Self::drain_events`] in arrival order, together with fetch results.
    pub fn sender(&self) -> mpsc::UnboundedSender<TimelineEvent> {
        self.events_tx.clone()
    }

    /// Apply an event and start any fetches it requested
    ///
    /// Must be called within a tokio runtime. Returns the effects the host
    /// has to carry out.
    pub fn dispatch(&mut self, event: TimelineEvent) -> Vec<Effect> {
        let effects = self.controller.update(event);
        let mut host_effects = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Fetch { request, delay } => self.spawn_fetch(request, delay),
                other => host_effects.push(other),
            }
        }
        host_effects
    }

    /// Wait for the next queued event and apply it
    pub async fn next_event(&mut self) -> Vec<Effect> {
        match self.events_rx.recv().await {
            Some(event) => self.dispatch(event),
            None => Vec::new(),
        }
    }

    /// Apply every event that is already queued, without waiting
    pub fn drain_events(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            effects.extend(self.dispatch(event));
        }
        effects
    }

    /// The controller
    pub fn controller(&self) -> &TimelineController {
        &self.controller
    }

    /// The history collaborator
    pub fn source(&self) -> &S {
        &self.source
    }

    fn spawn_fetch(&self, request: PageRequest, delay: Duration) {
        let source = Arc::clone(&self.source);
        let events_tx = self.events_tx.clone();
        let timeout = self.fetch_timeout;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let ticket = request.ticket;
            let event = match tokio::time::timeout(timeout, source.fetch_page(&request)).await {
                Ok(Ok(messages)) => TimelineEvent::PageLoaded { ticket, messages },
                Ok(Err(error)) => TimelineEvent::PageFailed { ticket, error },
                Err(_) => {
                    tracing::warn!(
                        "Fetch for {} timed out after {:?}",
                        request.conversation_id,
                        timeout
                    );
                    TimelineEvent::PageFailed {
                        ticket,
                        error: Error::Timeout(timeout.as_millis() as u64),
                    }
                }
            };
            // Receiver only goes away with the driver
            let _ = events_tx.send(event);
        });
    }
}
