//! Event stream feeding the application loop.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use crossterm::event::EventStream;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::Event;

/// Collects terminal events and ticks on a background task.
pub struct EventHandler {
    event_rx: mpsc::UnboundedReceiver<Event>,
    token: CancellationToken,
}

impl EventHandler {
    /// Spawns the reader. Must be called from within a tokio runtime.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        tokio::spawn(read_events(tx, tick_rate, token.clone()));

        Self {
            event_rx: rx,
            token,
        }
    }

    /// Builds a handler over an existing channel, without touching the
    /// terminal.
    pub fn from_channel(event_rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self {
            event_rx,
            token: CancellationToken::new(),
        }
    }

    fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        Pin::new(&mut self.event_rx).poll_recv(cx)
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl Stream for EventHandler {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_event(cx)
    }
}

async fn read_events(
    tx: mpsc::UnboundedSender<Event>,
    tick_rate: Duration,
    token: CancellationToken,
) {
    let mut reader = EventStream::new();
    let mut ticks = time::interval(tick_rate);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            _ = ticks.tick() => Event::Tick,
            next = reader.next() => match next {
                Some(Ok(raw)) => match Event::from_crossterm(raw) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(error)) => {
                    warn!(%error, "failed to read terminal event");
                    continue;
                }
                None => break,
            },
        };

        if tx.send(event).is_err() {
            break;
        }
    }
}
