//! Resource status taxonomy.
//!
//! The backend reports progress as a free-form string. Every screen and the
//! CLI read it through [`ResourceStatus`] and [`classify`], so there is one
//! place deciding what counts as "still processing".

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const STATUS_PENDING: &str = "pending";
const STATUS_QUEUED: &str = "queued";
const STATUS_UPLOADING: &str = "uploading";
const STATUS_PROCESSING: &str = "processing";
const STATUS_REVIEWING: &str = "reviewing";
const STATUS_COMPLETED: &str = "completed";
const STATUS_SUCCESS: &str = "success";
const STATUS_SUCCESS_WITH_ANOMALIES: &str = "success_with_anomalies";
const STATUS_FAILED: &str = "failed";

/// Server-reported status of an upload, page, marking job or result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ResourceStatus {
    /// Accepted but not started.
    Pending,
    /// Waiting for a worker.
    Queued,
    /// File transfer to storage still running.
    Uploading,
    /// OCR or marking in progress.
    Processing,
    /// Waiting on a human reviewer.
    Reviewing,
    /// Finished.
    Completed,
    /// Finished (older endpoints report this instead of `completed`).
    Success,
    /// Finished, with items flagged for attention.
    SuccessWithAnomalies,
    /// Finished with an error.
    Failed,
    /// Missing or unrecognized.
    #[default]
    Unknown,
}

impl ResourceStatus {
    /// Parses a raw server string. Matching ignores case and surrounding
    /// whitespace; anything unrecognized becomes [`ResourceStatus::Unknown`].
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unknown;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            STATUS_PENDING => Self::Pending,
            STATUS_QUEUED => Self::Queued,
            STATUS_UPLOADING => Self::Uploading,
            STATUS_PROCESSING => Self::Processing,
            STATUS_REVIEWING => Self::Reviewing,
            STATUS_COMPLETED => Self::Completed,
            STATUS_SUCCESS => Self::Success,
            STATUS_SUCCESS_WITH_ANOMALIES => Self::SuccessWithAnomalies,
            STATUS_FAILED => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Canonical wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Queued => STATUS_QUEUED,
            Self::Uploading => STATUS_UPLOADING,
            Self::Processing => STATUS_PROCESSING,
            Self::Reviewing => STATUS_REVIEWING,
            Self::Completed => STATUS_COMPLETED,
            Self::Success => STATUS_SUCCESS,
            Self::SuccessWithAnomalies => STATUS_SUCCESS_WITH_ANOMALIES,
            Self::Failed => STATUS_FAILED,
            Self::Unknown => "unknown",
        }
    }

    /// True while the backend is still working on the resource.
    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Pending | Self::Queued | Self::Uploading | Self::Processing)
    }

    /// True once the backend will not change the status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Success | Self::SuccessWithAnomalies | Self::Failed
        )
    }

    /// True only for [`ResourceStatus::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Human readable badge label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Queued => "Queued",
            Self::Uploading => "Uploading",
            Self::Processing => "Processing",
            Self::Reviewing => "Reviewing",
            Self::Completed => "Completed",
            Self::Success => "Success",
            Self::SuccessWithAnomalies => "Completed with anomalies",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }

    /// Colour family used by status badges.
    pub fn tone(&self) -> StatusTone {
        match self {
            Self::Pending | Self::Queued => StatusTone::Neutral,
            Self::Uploading | Self::Processing | Self::Reviewing => StatusTone::Progress,
            Self::Completed | Self::Success => StatusTone::Success,
            Self::SuccessWithAnomalies => StatusTone::Warning,
            Self::Failed => StatusTone::Danger,
            Self::Unknown => StatusTone::Neutral,
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResourceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::parse(raw.as_deref()))
    }
}

/// Badge colour family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    /// Grey.
    Neutral,
    /// Blue, animated.
    Progress,
    /// Green.
    Success,
    /// Amber.
    Warning,
    /// Red.
    Danger,
}

/// Flags derived from a raw status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusClass {
    /// Polling should keep going while any item has this set.
    pub is_processing: bool,
    /// The backend is done with the item.
    pub is_terminal: bool,
    /// The item ended in an error.
    pub is_failure: bool,
    /// Badge label.
    pub display_label: &'static str,
}

/// Classifies a raw status string. Never fails: absent and unrecognized
/// values land in the "unknown" bucket.
pub fn classify(raw: Option<&str>) -> StatusClass {
    ResourceStatus::parse(raw).class()
}

impl ResourceStatus {
    /// Flags for an already parsed status.
    pub fn class(&self) -> StatusClass {
        StatusClass {
            is_processing: self.is_processing(),
            is_terminal: self.is_terminal(),
            is_failure: self.is_failure(),
            display_label: self.label(),
        }
    }
}

/// Anything whose progress the backend reports.
pub trait HasStatus {
    /// Current status as last fetched.
    fn status(&self) -> &ResourceStatus;
}

/// True when at least one item is still being processed.
pub fn any_processing<'a, T, I>(items: I) -> bool
where
    T: HasStatus + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().any(|item| item.status().is_processing())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_set_is_case_insensitive() {
        for raw in ["pending", "QUEUED", "Uploading", " processing "] {
            let class = classify(Some(raw));
            assert!(class.is_processing, "{raw} should be processing");
            assert!(!class.is_terminal);
            assert!(!class.is_failure);
        }
    }

    #[test]
    fn terminal_statuses_are_not_processing() {
        for raw in ["completed", "Success", "SUCCESS_WITH_ANOMALIES", "failed"] {
            let class = classify(Some(raw));
            assert!(class.is_terminal, "{raw} should be terminal");
            assert!(!class.is_processing);
        }
    }

    #[test]
    fn only_failed_is_failure() {
        assert!(classify(Some("Failed")).is_failure);
        assert!(!classify(Some("success_with_anomalies")).is_failure);
        assert!(!classify(Some("completed")).is_failure);
    }

    #[test]
    fn reviewing_is_neither_processing_nor_terminal() {
        let class = classify(Some("reviewing"));
        assert!(!class.is_processing);
        assert!(!class.is_terminal);
        assert_eq!(class.display_label, "Reviewing");
    }

    #[test]
    fn unknown_and_missing_fall_back_quietly() {
        for raw in [None, Some(""), Some("exploded"), Some("complete d")] {
            let class = classify(raw);
            assert!(!class.is_processing);
            assert!(!class.is_terminal);
            assert!(!class.is_failure);
            assert_eq!(class.display_label, "Unknown");
        }
    }

    #[test]
    fn deserializes_null_and_odd_case() {
        let parsed: Vec<ResourceStatus> =
            serde_json::from_str(r#"["Processing", null, "weird", "FAILED"]"#)
                .expect("parse statuses");
        assert_eq!(
            parsed,
            vec![
                ResourceStatus::Processing,
                ResourceStatus::Unknown,
                ResourceStatus::Unknown,
                ResourceStatus::Failed,
            ]
        );
    }

    #[test]
    fn anomalies_get_warning_tone() {
        assert_eq!(ResourceStatus::SuccessWithAnomalies.tone(), StatusTone::Warning);
        assert_eq!(ResourceStatus::Failed.tone(), StatusTone::Danger);
    }
}
