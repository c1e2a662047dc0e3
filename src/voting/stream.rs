//! Async stream of committed voting events.
//!
//! `EventStream::new()` returns the stream and its sender half; the sender is
//! an [`EventSink`] that can be handed to `VotingService`. Listeners consume
//! the stream with `futures::StreamExt` or inside `tokio::select!`.

use super::events::VotingEvent;
use super::traits::EventSink;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Stream of events in commit order.
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<VotingEvent>,
}

impl EventStream {
    /// Create a stream and the sink feeding it.
    pub fn new() -> (Self, EventStreamSender) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver }, EventStreamSender { sender })
    }
}

impl Stream for EventStream {
    type Item = VotingEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Sink side of an [`EventStream`].
#[derive(Clone)]
pub struct EventStreamSender {
    sender: mpsc::UnboundedSender<VotingEvent>,
}

impl EventSink for EventStreamSender {
    fn emit(&self, event: &VotingEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!(event = event.name(), "event stream closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_receives_events_in_order() {
        let (mut stream, sender) = EventStream::new();
        sender.emit(&VotingEvent::ProposalRegistered { proposal_id: 1 });
        sender.emit(&VotingEvent::ProposalRegistered { proposal_id: 2 });

        assert_eq!(
            stream.next().await,
            Some(VotingEvent::ProposalRegistered { proposal_id: 1 })
        );
        assert_eq!(
            stream.next().await,
            Some(VotingEvent::ProposalRegistered { proposal_id: 2 })
        );
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let (mut stream, sender) = EventStream::new();
        drop(sender);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_emit_after_stream_dropped_is_harmless() {
        let (stream, sender) = EventStream::new();
        drop(stream);
        sender.emit(&VotingEvent::ProposalRegistered { proposal_id: 1 });
    }
}
