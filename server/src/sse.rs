// Server-Sent Events adaptation of live call sessions
//
// Each stream owns its session's cancellation token through a drop guard:
// when the client goes away axum drops the stream and every pending phase
// of that session is cancelled.

use crate::sessions::SessionTicket;
use axum::response::sse::Event;
use callsim_core::call::{simulate_live, CallRequest};
use callsim_core::{ArtifactStore, CallSimError, ChannelSink, StreamMessage};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

/// Named SSE event carrying the message's JSON payload
pub fn to_event(msg: &StreamMessage) -> Event {
    Event::default()
        .event(msg.event_name())
        .data(msg.data().to_string())
}

/// Phase messages of one live session, closing when the session finishes.
pub struct LiveCallStream {
    rx: mpsc::Receiver<StreamMessage>,
    _cancel_on_drop: DropGuard,
}

impl Stream for LiveCallStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
            .map(|msg| msg.map(|m| Ok(to_event(&m))))
    }
}

/// Spawn the session task and hand back the stream that feeds the client.
pub fn start_live_call(
    store: Arc<ArtifactStore>,
    request: CallRequest,
    ticket: SessionTicket,
    capacity: usize,
) -> LiveCallStream {
    let (mut sink, rx) = ChannelSink::channel(capacity);
    let cancel = CancellationToken::new();
    let session_cancel = cancel.clone();

    tokio::spawn(async move {
        let res = simulate_live(ticket.id(), &store, &request, &mut sink, &session_cancel).await;
        match res {
            Ok(()) => {}
            Err(CallSimError::CancelledSession) => {
                debug!(target: "server", session = %ticket.id(), "Client disconnected");
            }
            Err(e) => {
                debug!(target: "server", session = %ticket.id(), error = %e, "Live call aborted");
            }
        }
        // Deregister before the stream closes.
        drop(ticket);
        drop(sink);
    });

    LiveCallStream {
        rx,
        _cancel_on_drop: cancel.drop_guard(),
    }
}
