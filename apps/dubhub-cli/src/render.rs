//! Terminal rendering of session events.

use tokio::sync::mpsc;

use dubhub_pricing::{format_duration, format_file_size};
use dubhub_protocol::JobStatus;
use dubhub_upload::{NavigateTarget, NoticeLevel, SessionEvent};

/// Formats one event as a terminal line. Returns `None` for events with
/// no terminal counterpart.
pub fn render(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::LocalProgress(p) => {
            let mut line = format!(
                "upload {:>3}%  {} / {}  chunk {}/{}",
                p.percent,
                format_file_size(p.uploaded_bytes),
                format_file_size(p.total_bytes),
                p.chunks_sent,
                p.total_chunks,
            );
            if p.bytes_per_second > 0.0 {
                line.push_str(&format!(
                    "  {}/s",
                    format_file_size(p.bytes_per_second as u64)
                ));
            }
            if let Some(eta) = p.eta {
                line.push_str(&format!("  eta {}", format_duration(eta.as_secs_f64())));
            }
            Some(line)
        }
        SessionEvent::ServerProgress { percent, message } => match (percent, message) {
            (Some(p), Some(m)) => Some(format!("server {p:>3}%  {m}")),
            (Some(p), None) => Some(format!("server {p:>3}%")),
            (None, Some(m)) => Some(format!("server  {m}")),
            (None, None) => None,
        },
        SessionEvent::Status(text) => Some(format!("status: {text}")),
        SessionEvent::Notice { level, message } => {
            let tag = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            Some(format!("[{tag}] {message}"))
        }
        SessionEvent::JobStatus(status) => Some(format!("job: {}", job_label(*status))),
        SessionEvent::Navigate(NavigateTarget::Dashboard) => {
            Some("upload done; the project is listed on your dashboard".into())
        }
        // Completed/Failed are echoed through the matching notice.
        SessionEvent::Navigate(NavigateTarget::Reload)
        | SessionEvent::Completed { .. }
        | SessionEvent::Failed { .. } => None,
    }
}

fn job_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Processing => "processing",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

/// Prints events until every sender is gone.
pub async fn pump(mut rx: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = rx.recv().await {
        tracing::debug!(?event, "session event");
        if let Some(line) = render(&event) {
            match event {
                SessionEvent::Notice {
                    level: NoticeLevel::Error,
                    ..
                } => eprintln!("{line}"),
                _ => println!("{line}"),
            }
        }
    }
}
