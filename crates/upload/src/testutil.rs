//! In-memory channel doubles for the transfer loop tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures_util::{Sink, Stream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

use dubhub_protocol::JobStatus;

use crate::error::UploadError;
use crate::poller::StatusSource;
use crate::types::SessionEvent;

pub(crate) type FrameResult = Result<Message, tungstenite::Error>;
pub(crate) type FrameStream = Pin<Box<dyn Stream<Item = FrameResult> + Send>>;

/// Upload sink that forwards frames to a receiver. Closing it drops the
/// sender, so the receiver sees `None`.
pub(crate) struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<Message>>,
}

impl ChannelSink {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }
}

impl Sink<Message> for ChannelSink {
    type Error = tungstenite::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        match &self.tx {
            Some(tx) => tx
                .send(item)
                .map_err(|_| tungstenite::Error::ConnectionClosed),
            None => Err(tungstenite::Error::AlreadyClosed),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.tx = None;
        Poll::Ready(Ok(()))
    }
}

/// A frame stream fed from the returned sender. Dropping the sender ends
/// the stream.
pub(crate) fn frame_stream() -> (mpsc::UnboundedSender<FrameResult>, FrameStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (frame, rx))
    });
    (tx, Box::pin(stream))
}

/// A frame stream that never yields.
pub(crate) fn silent() -> FrameStream {
    Box::pin(futures_util::stream::pending())
}

pub(crate) fn text(json: &str) -> FrameResult {
    Ok(Message::text(json.to_string()))
}

/// Collects every event currently queued.
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Lets spawned tasks run without advancing paused time.
pub(crate) async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Returns scripted statuses in order, then `Processing` forever.
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Result<JobStatus, String>>>,
    pub(crate) calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new(script: Vec<Result<JobStatus, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl StatusSource for ScriptedSource {
    fn job_status(
        &self,
        _project_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus, UploadError>> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(JobStatus::Processing));
        Box::pin(async move { next.map_err(UploadError::Status) })
    }
}
