//! Post-completion job status polling.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dubhub_protocol::JobStatus;

use crate::error::UploadError;
use crate::types::{JobOutcome, NavigateTarget, NoticeLevel, SessionEvent};

/// Source of job status for a project.
///
/// The upload crate has no HTTP client of its own. The application hands in
/// an adapter over whatever client it uses.
pub trait StatusSource: Send + Sync {
    fn job_status(
        &self,
        project_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus, UploadError>> + Send + '_>>;
}

/// Polls a [`StatusSource`] until the job reaches a terminal state.
pub struct StatusPoller {
    interval: Duration,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
}

impl StatusPoller {
    pub fn new(
        interval: Duration,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            interval,
            events_tx,
            cancel,
        }
    }

    /// Queries immediately, then once per interval. Failed queries are
    /// logged and retried on the next tick.
    pub async fn run<S: StatusSource + ?Sized>(&self, source: &S, project_id: u64) -> JobOutcome {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return JobOutcome::Cancelled,
                r = source.job_status(project_id) => r,
            };

            match result {
                Ok(status) => {
                    self.emit(SessionEvent::JobStatus(status));
                    match status {
                        JobStatus::Completed => {
                            info!(project_id, attempt, "translation completed");
                            self.emit(SessionEvent::Notice {
                                level: NoticeLevel::Success,
                                message: "translation completed".into(),
                            });
                            self.emit(SessionEvent::Navigate(NavigateTarget::Reload));
                            return JobOutcome::Completed;
                        }
                        JobStatus::Failed => {
                            warn!(project_id, attempt, "translation failed");
                            self.emit(SessionEvent::Notice {
                                level: NoticeLevel::Error,
                                message: "translation failed".into(),
                            });
                            return JobOutcome::Failed;
                        }
                        JobStatus::Processing => debug!(project_id, attempt, "still processing"),
                    }
                }
                Err(e) => warn!(project_id, attempt, error = %e, "status poll failed, retrying"),
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return JobOutcome::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}
