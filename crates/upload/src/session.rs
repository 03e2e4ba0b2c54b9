use std::future::Future;
use std::io::Read;
use std::path::PathBuf;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use dubhub_protocol::StartedTranslation;
use dubhub_transfer::{ChunkReader, UploadSession, file_extension};

use crate::channel::{channel_url, connect};
use crate::driver::{Transfer, TransferContext};
use crate::error::{Channel, UploadError};
use crate::poller::{StatusPoller, StatusSource};
use crate::types::{
    JobOutcome, NavigateTarget, NoticeLevel, SessionConfig, SessionEvent, SessionOutcome,
    TransferSummary,
};

/// One upload of one file for one started translation.
///
/// Events are delivered through the receiver returned by
/// [`take_events`](Self::take_events); the session can be stopped at any
/// point through [`cancel_token`](Self::cancel_token).
pub struct ChunkedUploadSession {
    started: StartedTranslation,
    source: PathBuf,
    config: SessionConfig,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    cancel: CancellationToken,
}

impl ChunkedUploadSession {
    pub fn new(started: StartedTranslation, source: impl Into<PathBuf>, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            started,
            source: source.into(),
            config,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the session event receiver. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events_rx.take()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn project_id(&self) -> u64 {
        self.started.project_id
    }

    /// Opens both channels and uploads the source file.
    pub async fn run(&self) -> Result<TransferSummary, UploadError> {
        let result = self.open_and_transfer().await;
        self.report(&result);
        result
    }

    /// Uploads over caller-supplied channels.
    pub async fn run_over<U, UI, E, R>(
        &self,
        upload: U,
        upload_rx: UI,
        events: E,
        reader: ChunkReader<R>,
    ) -> Result<TransferSummary, UploadError>
    where
        U: Sink<Message, Error = tungstenite::Error> + Unpin,
        UI: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
        E: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
        R: Read + Send + 'static,
    {
        let result = self.transfer(upload, upload_rx, events, reader).await;
        self.report(&result);
        result
    }

    /// Uploads, then follows the job until it finishes.
    pub async fn run_to_completion<S: StatusSource + ?Sized>(
        &self,
        status: &S,
    ) -> Result<SessionOutcome, UploadError> {
        let transfer = self.run().await?;
        let job = self.follow_completion(status, transfer.project_id).await;
        Ok(SessionOutcome { transfer, job })
    }

    /// Polls job status while the dashboard redirect timer runs.
    pub async fn follow_completion<S: StatusSource + ?Sized>(
        &self,
        status: &S,
        project_id: u64,
    ) -> JobOutcome {
        let poller = StatusPoller::new(
            self.config.poll_interval,
            self.events_tx.clone(),
            self.cancel.clone(),
        );
        let redirect = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(self.config.redirect_delay) => {
                    self.emit(SessionEvent::Navigate(NavigateTarget::Dashboard));
                }
            }
        };
        let (job, ()) = tokio::join!(poller.run(status, project_id), redirect);
        job
    }

    async fn open_and_transfer(&self) -> Result<TransferSummary, UploadError> {
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let path = self.source.clone();
        let chunk_size = self.started.chunk_size;
        let reader = tokio::task::spawn_blocking(move || ChunkReader::open(&path, chunk_size))
            .await
            .map_err(|e| UploadError::Join(e.to_string()))??;

        let token = &self.started.upload_token;
        let events_url = channel_url(&self.started.logs_url, token)?;
        let upload_url = channel_url(&self.started.upload_url, token)?;
        let timeout = self.config.connect_timeout;

        let events_ws = self
            .cancellable(connect(&events_url, Channel::Events, timeout))
            .await?;
        let upload_ws = self
            .cancellable(connect(&upload_url, Channel::Upload, timeout))
            .await?;
        self.emit(SessionEvent::Status("uploading".into()));

        let (mut events_sink, mut events_stream) = events_ws.split();
        let (upload_sink, upload_stream) = upload_ws.split();
        let result = self
            .transfer(upload_sink, upload_stream, &mut events_stream, reader)
            .await;

        let _ = events_sink.close().await;
        result
    }

    async fn transfer<U, UI, E, R>(
        &self,
        upload: U,
        upload_rx: UI,
        events: E,
        reader: ChunkReader<R>,
    ) -> Result<TransferSummary, UploadError>
    where
        U: Sink<Message, Error = tungstenite::Error> + Unpin,
        UI: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
        E: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
        R: Read + Send + 'static,
    {
        let session = UploadSession::new(
            self.started.project_id,
            self.started.upload_token.clone(),
            self.started.upload_url.clone(),
            self.started.logs_url.clone(),
            *reader.plan(),
        );
        info!(
            session = session.id(),
            project_id = session.project_id(),
            file_size = session.plan().file_size(),
            chunks = session.total_chunks(),
            "upload started"
        );

        let extension = file_extension(&self.source);
        let ctx = TransferContext {
            config: &self.config,
            events_tx: &self.events_tx,
            cancel: &self.cancel,
        };
        Transfer::new(ctx, session, upload, reader)
            .run(&extension, upload_rx, events)
            .await
    }

    /// Emits the single user-facing outcome of the upload phase.
    fn report(&self, result: &Result<TransferSummary, UploadError>) {
        match result {
            Ok(summary) => {
                info!(
                    project_id = summary.project_id,
                    bytes = summary.bytes_sent,
                    chunks = summary.chunks_sent,
                    "upload complete"
                );
                self.emit(SessionEvent::Completed {
                    message: summary.message.clone(),
                });
                self.emit(SessionEvent::Notice {
                    level: NoticeLevel::Success,
                    message: summary
                        .message
                        .clone()
                        .unwrap_or_else(|| "upload complete, processing started".into()),
                });
            }
            Err(UploadError::Cancelled) => {
                warn!(project_id = self.started.project_id, "upload cancelled");
                self.emit(SessionEvent::Notice {
                    level: NoticeLevel::Warning,
                    message: "upload cancelled".into(),
                });
                self.emit(SessionEvent::Failed {
                    error: UploadError::Cancelled.to_string(),
                });
            }
            Err(e) => {
                error!(project_id = self.started.project_id, error = %e, "upload failed");
                self.emit(SessionEvent::Notice {
                    level: NoticeLevel::Error,
                    message: e.to_string(),
                });
                self.emit(SessionEvent::Failed {
                    error: e.to_string(),
                });
            }
        }
    }

    async fn cancellable<T>(
        &self,
        fut: impl Future<Output = Result<T, UploadError>>,
    ) -> Result<T, UploadError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(UploadError::Cancelled),
            r = fut => r,
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}
