//! Single-task transfer loop.
//!
//! One `select!` multiplexes cancellation, event-channel frames,
//! upload-channel inbound frames and the chunk throttle. Chunk reads and
//! sends run inside the arm body, so an incoming event is handled between
//! chunks and never while one is half-sent.

use std::io::Read;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, Message, protocol::CloseFrame};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use dubhub_protocol::framing::encode_tagged;
use dubhub_protocol::{ProgressEvent, UploadMetadata};
use dubhub_transfer::{ChunkReader, SpeedCalculator, TransferError, TransferProgress, UploadSession};

use crate::error::{Channel, UploadError};
use crate::types::{ChunkFraming, SessionConfig, SessionEvent, TransferSummary};

/// Borrowed session plumbing shared with the transfer loop.
pub(crate) struct TransferContext<'a> {
    pub config: &'a SessionConfig,
    pub events_tx: &'a mpsc::UnboundedSender<SessionEvent>,
    pub cancel: &'a CancellationToken,
}

enum EventFlow {
    Continue,
    Complete(Option<String>),
}

/// Drives one upload over already-open channels.
pub(crate) struct Transfer<'a, U, R> {
    ctx: TransferContext<'a>,
    session: UploadSession,
    upload: U,
    upload_open: bool,
    reader: Option<ChunkReader<R>>,
    speed: SpeedCalculator,
}

impl<'a, U, R> Transfer<'a, U, R>
where
    U: Sink<Message, Error = tungstenite::Error> + Unpin,
    R: Read + Send + 'static,
{
    pub(crate) fn new(
        ctx: TransferContext<'a>,
        session: UploadSession,
        upload: U,
        reader: ChunkReader<R>,
    ) -> Self {
        Self {
            ctx,
            session,
            upload,
            upload_open: true,
            reader: Some(reader),
            speed: SpeedCalculator::default(),
        }
    }

    /// Runs until `complete`, the first terminal error, or cancellation.
    /// The upload channel is closed on every exit path.
    pub(crate) async fn run<UI, E>(
        mut self,
        extension: &str,
        mut upload_rx: UI,
        mut events: E,
    ) -> Result<TransferSummary, UploadError>
    where
        UI: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
        E: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        self.session.start();
        let result = self.drive(extension, &mut upload_rx, &mut events).await;

        match &result {
            Ok(_) => self.session.complete(),
            Err(UploadError::Cancelled) => self.session.cancel(),
            Err(e) => self.session.fail(&e.to_string()),
        }
        if self.upload_open {
            self.close_upload().await;
        }
        debug!(
            session = self.session.id(),
            status = %self.session.status(),
            chunks = self.session.current_chunk_index(),
            "transfer loop finished"
        );
        result
    }

    async fn drive<UI, E>(
        &mut self,
        extension: &str,
        upload_rx: &mut UI,
        events: &mut E,
    ) -> Result<TransferSummary, UploadError>
    where
        UI: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
        E: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        if self.ctx.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        self.send_metadata(extension).await?;
        if !self.session.has_pending_chunks() {
            self.session.finish_empty();
            self.emit(SessionEvent::LocalProgress(TransferProgress::from_session(
                &self.session,
                &self.speed,
            )));
            self.close_upload().await;
            self.emit(SessionEvent::Status("upload finished, waiting for server".into()));
        }

        let throttle = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(throttle);

        loop {
            let sending = self.upload_open && self.session.has_pending_chunks();

            tokio::select! {
                biased;

                _ = self.ctx.cancel.cancelled() => return Err(UploadError::Cancelled),

                frame = events.next() => {
                    if let EventFlow::Complete(message) = self.on_event_frame(frame)? {
                        return Ok(self.summary(message));
                    }
                }

                frame = upload_rx.next(), if self.upload_open => {
                    on_upload_frame(frame)?;
                }

                () = &mut throttle, if sending => {
                    self.send_next_chunk().await?;
                    if self.session.has_pending_chunks() {
                        throttle
                            .as_mut()
                            .reset(Instant::now() + self.ctx.config.chunk_delay);
                    } else {
                        self.close_upload().await;
                        self.emit(SessionEvent::Status(
                            "upload finished, waiting for server".into(),
                        ));
                    }
                }
            }
        }
    }

    async fn send_metadata(&mut self, extension: &str) -> Result<(), UploadError> {
        let meta = serde_json::to_string(&UploadMetadata::new(extension))?;
        self.upload
            .send(Message::text(meta))
            .await
            .map_err(|source| UploadError::Transport {
                channel: Channel::Upload,
                source,
            })?;
        debug!(extension, "metadata frame sent");
        Ok(())
    }

    async fn send_next_chunk(&mut self) -> Result<(), UploadError> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| UploadError::Join("chunk reader unavailable".into()))?;
        let (reader, chunk) = tokio::task::spawn_blocking(move || {
            let mut reader = reader;
            let chunk = reader.next_chunk();
            (reader, chunk)
        })
        .await
        .map_err(|e| UploadError::Join(e.to_string()))?;
        self.reader = Some(reader);

        let Some(chunk) = chunk? else {
            return Err(TransferError::Incomplete {
                received: self.session.uploaded_bytes(),
                expected: self.session.plan().file_size(),
            }
            .into());
        };

        let index = chunk.index;
        let len = chunk.len();
        let payload = match self.ctx.config.framing {
            ChunkFraming::Tagged => encode_tagged(&chunk.header(), &chunk.data)?,
            ChunkFraming::Raw => chunk.data,
        };
        self.upload
            .send(Message::binary(payload))
            .await
            .map_err(|source| UploadError::Transport {
                channel: Channel::Upload,
                source,
            })?;

        let percent = self.session.record_sent(index, len)?;
        self.speed.add_sample(len);
        trace!(index, len, percent, "chunk sent");

        let progress = TransferProgress::from_session(&self.session, &self.speed);
        self.emit(SessionEvent::LocalProgress(progress));
        Ok(())
    }

    fn on_event_frame(
        &mut self,
        frame: Option<Result<Message, tungstenite::Error>>,
    ) -> Result<EventFlow, UploadError> {
        let msg = match frame {
            Some(Ok(msg)) => msg,
            Some(Err(source)) => {
                return Err(UploadError::Transport {
                    channel: Channel::Events,
                    source,
                });
            }
            None => return Err(UploadError::EventChannelEnded),
        };

        match msg {
            Message::Text(text) => self.on_event_text(&text),
            Message::Close(frame) => Err(closed_by_server(Channel::Events, frame)),
            Message::Ping(_) | Message::Pong(_) => {
                trace!("event channel keepalive");
                Ok(EventFlow::Continue)
            }
            Message::Binary(_) | Message::Frame(_) => {
                debug!("ignoring binary frame on event channel");
                Ok(EventFlow::Continue)
            }
        }
    }

    fn on_event_text(&mut self, text: &str) -> Result<EventFlow, UploadError> {
        let event = match ProgressEvent::parse(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "skipping unrecognised event frame");
                return Ok(EventFlow::Continue);
            }
        };
        debug!(kind = event.kind(), message = event.message(), "server event");

        match event {
            ProgressEvent::Progress { .. } => {
                let percent = event.percent();
                let message = event.message().map(str::to_string);
                self.emit(SessionEvent::ServerProgress { percent, message });
                Ok(EventFlow::Continue)
            }
            ProgressEvent::Status { message } => {
                if let Some(message) = message {
                    self.emit(SessionEvent::Status(message));
                }
                Ok(EventFlow::Continue)
            }
            ProgressEvent::Error { message } => Err(UploadError::Server(
                message.unwrap_or_else(|| "processing failed".into()),
            )),
            ProgressEvent::Complete { message } => Ok(EventFlow::Complete(message)),
        }
    }

    async fn close_upload(&mut self) {
        self.upload_open = false;
        if let Err(e) = self.upload.close().await {
            debug!(error = %e, "upload channel close failed");
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.ctx.events_tx.send(event);
    }

    fn summary(&self, message: Option<String>) -> TransferSummary {
        TransferSummary {
            session_id: self.session.id().to_string(),
            project_id: self.session.project_id(),
            bytes_sent: self.session.uploaded_bytes(),
            chunks_sent: self.session.current_chunk_index(),
            total_chunks: self.session.total_chunks(),
            message,
        }
    }
}

/// Handles a frame arriving on the upload channel while chunks are going
/// out. The server sends nothing the client needs, so only errors and
/// closes matter.
fn on_upload_frame(
    frame: Option<Result<Message, tungstenite::Error>>,
) -> Result<(), UploadError> {
    match frame {
        Some(Ok(Message::Close(frame))) => Err(closed_by_server(Channel::Upload, frame)),
        Some(Ok(Message::Text(text))) => {
            debug!(len = text.len(), "ignoring text frame on upload channel");
            Ok(())
        }
        Some(Ok(_)) => Ok(()),
        Some(Err(source)) => Err(UploadError::Transport {
            channel: Channel::Upload,
            source,
        }),
        None => Err(UploadError::ClosedByServer {
            channel: Channel::Upload,
            code: None,
            reason: String::new(),
        }),
    }
}

fn closed_by_server(channel: Channel, frame: Option<CloseFrame>) -> UploadError {
    let (code, reason) = match frame {
        Some(f) => (Some(u16::from(f.code)), f.reason.to_string()),
        None => (None, String::new()),
    };
    UploadError::ClosedByServer {
        channel,
        code,
        reason,
    }
}
