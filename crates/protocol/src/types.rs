use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Translation product selected for a project.
///
/// The wire identifier (`as_str`) is what the backend expects in
/// `projectType`; the per-minute cost is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    EnglishSubtitle,
    PersianSubtitle,
    PersianDubbing,
    PersianDubbingEnglishSubtitle,
    PersianDubbingPersianSubtitle,
}

impl OperationType {
    /// Every operation, in the order the dashboard lists them.
    pub const ALL: [OperationType; 5] = [
        OperationType::EnglishSubtitle,
        OperationType::PersianSubtitle,
        OperationType::PersianDubbing,
        OperationType::PersianDubbingEnglishSubtitle,
        OperationType::PersianDubbingPersianSubtitle,
    ];

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnglishSubtitle => "english_subtitle",
            Self::PersianSubtitle => "persian_subtitle",
            Self::PersianDubbing => "persian_dubbing",
            Self::PersianDubbingEnglishSubtitle => "persian_dubbing_english_subtitle",
            Self::PersianDubbingPersianSubtitle => "persian_dubbing_persian_subtitle",
        }
    }

    /// Human-readable product name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::EnglishSubtitle => "English Subtitle",
            Self::PersianSubtitle => "Persian Subtitle",
            Self::PersianDubbing => "Persian Dubbing",
            Self::PersianDubbingEnglishSubtitle => "Persian Dubbing with English Subtitle",
            Self::PersianDubbingPersianSubtitle => "Persian Dubbing with Persian Subtitle",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an operation identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation type: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for OperationType {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Job state as seen by the status poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Maps a backend status string onto the three client states.
    ///
    /// Anything that is neither `completed` nor `failed` (`awaiting upload`,
    /// `awaiting queue`, `processing`, ...) is still in flight.
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Processing,
        }
    }

    /// Returns true once no further polling is needed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing => f.write_str("processing"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// First frame on the upload channel, sent before any binary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Lowercased extension including the leading dot, or empty.
    pub file_extension: String,
}

impl UploadMetadata {
    pub fn new(file_extension: impl Into<String>) -> Self {
        Self {
            file_extension: file_extension.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_round_trips_through_str() {
        for op in OperationType::ALL {
            assert_eq!(op.as_str().parse::<OperationType>().unwrap(), op);
        }
    }

    #[test]
    fn operation_serializes_as_snake_case() {
        let json = serde_json::to_string(&OperationType::PersianDubbingEnglishSubtitle).unwrap();
        assert_eq!(json, "\"persian_dubbing_english_subtitle\"");
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = "klingon_dubbing".parse::<OperationType>().unwrap_err();
        assert_eq!(err.0, "klingon_dubbing");
    }

    #[test]
    fn job_status_from_wire() {
        assert_eq!(JobStatus::from_wire("completed"), JobStatus::Completed);
        assert_eq!(JobStatus::from_wire("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from_wire("processing"), JobStatus::Processing);
        assert_eq!(JobStatus::from_wire("awaiting queue"), JobStatus::Processing);
        assert_eq!(JobStatus::from_wire("awaiting upload"), JobStatus::Processing);
        assert_eq!(JobStatus::from_wire(" Completed "), JobStatus::Completed);
    }

    #[test]
    fn job_status_terminality() {
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn metadata_frame_shape() {
        let json = serde_json::to_string(&UploadMetadata::new(".mp4")).unwrap();
        assert_eq!(json, r#"{"file_extension":".mp4"}"#);
    }
}
