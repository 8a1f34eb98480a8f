//! Resources exchanged with the marking API.

use serde::{Deserialize, Serialize};

use crate::status::{HasStatus, ResourceStatus};

/// Signed-in account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Account id.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    /// Name if set, email otherwise.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Bearer token and its refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub token: String,
    /// Token used to mint a new bearer token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `data` of the login, register and refresh responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    /// New bearer token.
    pub token: String,
    /// New refresh token, when rotated.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Account, when the endpoint includes it.
    #[serde(default)]
    pub user: Option<User>,
}

impl AuthPayload {
    /// The token half of the payload.
    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    /// Stored refresh token.
    pub refresh_token: String,
}

/// How a group organizes its uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Flat list of uploads.
    #[default]
    Standard,
    /// Uploads are filed under named batches.
    Batch,
}

impl GroupKind {
    /// Wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Batch => "batch",
        }
    }
}

/// A class, exam sitting or other collection of submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Flat or batched.
    #[serde(default)]
    pub group_type: GroupKind,
    /// Number of uploads, when the list endpoint includes it.
    #[serde(default)]
    pub upload_count: Option<u32>,
    /// Creation timestamp as sent by the server.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /groups`.
#[derive(Debug, Clone, Serialize)]
pub struct NewGroup {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Flat or batched.
    pub group_type: GroupKind,
}

/// One submitted file (or set of page images).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    /// Upload id.
    pub id: String,
    /// Owning group.
    pub group_id: String,
    /// Original file name.
    pub filename: String,
    /// OCR / processing status.
    #[serde(default)]
    pub status: ResourceStatus,
    /// Batch the upload was filed under, for batch groups.
    #[serde(default)]
    pub batch_name: Option<String>,
    /// Number of pages extracted so far.
    #[serde(default)]
    pub page_count: Option<u32>,
    /// Failure reason reported by the backend.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HasStatus for Upload {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

/// Per-batch roll-up of a batch group's uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Batch name.
    pub name: String,
    /// Uploads in the batch.
    pub uploads: usize,
    /// Uploads still being processed.
    pub processing: usize,
    /// Uploads that failed.
    pub failed: usize,
}

/// Group uploads by batch name, in first-seen order. Uploads without a batch
/// are skipped.
pub fn summarize_batches(uploads: &[Upload]) -> Vec<BatchSummary> {
    let mut batches: Vec<BatchSummary> = Vec::new();
    for upload in uploads {
        let Some(name) = upload.batch_name.as_deref() else {
            continue;
        };
        let index = match batches.iter().position(|batch| batch.name == name) {
            Some(index) => index,
            None => {
                batches.push(BatchSummary {
                    name: name.to_string(),
                    uploads: 0,
                    processing: 0,
                    failed: 0,
                });
                batches.len() - 1
            },
        };
        let batch = &mut batches[index];
        batch.uploads += 1;
        if upload.status.is_processing() {
            batch.processing += 1;
        }
        if upload.status.is_failure() {
            batch.failed += 1;
        }
    }
    batches
}

/// One page of an upload with its OCR text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPage {
    /// Page id.
    pub id: String,
    /// Owning upload.
    pub upload_id: String,
    /// 1-based page number.
    pub page_number: u32,
    /// Recognized text.
    #[serde(default)]
    pub ocr_text: Option<String>,
    /// OCR status.
    #[serde(default)]
    pub status: ResourceStatus,
}

impl HasStatus for UploadPage {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

/// Body of the page text update.
#[derive(Debug, Clone, Serialize)]
pub struct PageTextUpdate {
    /// Corrected text.
    pub ocr_text: String,
}

/// One line of a rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion title.
    pub name: String,
    /// Guidance for the marker.
    #[serde(default)]
    pub description: Option<String>,
    /// Marks available.
    pub max_marks: f64,
}

/// Rubric used to mark a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingScheme {
    /// Scheme id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Marks available overall.
    #[serde(default)]
    pub total_marks: Option<f64>,
    /// Rubric lines.
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of scheme create and update.
#[derive(Debug, Clone, Serialize)]
pub struct SchemeInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rubric lines.
    pub criteria: Vec<Criterion>,
}

impl SchemeInput {
    /// Sum of the criteria's marks.
    pub fn total_marks(&self) -> f64 {
        self.criteria.iter().map(|criterion| criterion.max_marks).sum()
    }
}

/// A request to mark every upload of a group against a scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingJob {
    /// Job id.
    pub id: String,
    /// Group being marked.
    pub group_id: String,
    /// Scheme used.
    pub scheme_id: String,
    /// Job status.
    #[serde(default)]
    pub status: ResourceStatus,
    /// Fraction done in `[0, 1]`, when reported.
    #[serde(default)]
    pub progress: Option<f64>,
    /// AI model identifier the job runs with.
    #[serde(default)]
    pub model: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl MarkingJob {
    /// Progress as a whole percentage, clamped to `0..=100`.
    pub fn percent(&self) -> Option<u8> {
        self.progress
            .map(|fraction| (fraction.clamp(0.0, 1.0) * 100.0).round() as u8)
    }
}

impl HasStatus for MarkingJob {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

/// Body of `POST /groups/{id}/marking-jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMarkingJob {
    /// Scheme to mark against.
    pub scheme_id: String,
    /// Preferred AI model, when the user picked one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Marks awarded to one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkResult {
    /// Result id.
    pub id: String,
    /// Marked upload.
    pub upload_id: String,
    /// Candidate name read from the script.
    #[serde(default)]
    pub student_name: Option<String>,
    /// Marks awarded.
    #[serde(default)]
    pub score: Option<f64>,
    /// Marks available.
    #[serde(default)]
    pub max_score: Option<f64>,
    /// Result status.
    #[serde(default)]
    pub status: ResourceStatus,
    /// Marker feedback.
    #[serde(default)]
    pub feedback: Option<String>,
}

impl HasStatus for MarkResult {
    fn status(&self) -> &ResourceStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(id: &str, batch: Option<&str>, status: &str) -> Upload {
        Upload {
            id: id.to_string(),
            group_id: "g1".to_string(),
            filename: format!("{id}.jpg"),
            status: ResourceStatus::parse(Some(status)),
            batch_name: batch.map(str::to_string),
            page_count: None,
            error_message: None,
            created_at: None,
        }
    }

    #[test]
    fn batches_roll_up_in_first_seen_order() {
        let uploads = vec![
            upload("a", Some("Term2"), "completed"),
            upload("b", Some("Term1"), "processing"),
            upload("c", None, "processing"),
            upload("d", Some("Term2"), "failed"),
        ];
        let batches = summarize_batches(&uploads);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].name, "Term2");
        assert_eq!(batches[0].uploads, 2);
        assert_eq!(batches[0].failed, 1);
        assert_eq!(batches[1].processing, 1);
    }

    #[test]
    fn upload_without_status_is_unknown() {
        let parsed: Upload =
            serde_json::from_str(r#"{"id":"u1","group_id":"g1","filename":"scan.pdf"}"#)
                .expect("parse upload");
        assert_eq!(parsed.status, ResourceStatus::Unknown);
        assert_eq!(parsed.batch_name, None);
    }

    #[test]
    fn job_percent_is_clamped() {
        let mut job: MarkingJob = serde_json::from_str(
            r#"{"id":"j","group_id":"g","scheme_id":"s","status":"processing","progress":0.456}"#,
        )
        .expect("parse job");
        assert_eq!(job.percent(), Some(46));
        job.progress = Some(1.7);
        assert_eq!(job.percent(), Some(100));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = User {
            id: "1".to_string(),
            email: "t@example.com".to_string(),
            name: Some("  ".to_string()),
        };
        assert_eq!(user.display_name(), "t@example.com");
    }
}
