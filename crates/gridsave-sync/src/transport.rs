//! The boundary between the save machinery and the persistence service.
//!
//! The service speaks a loosely-typed shape (`{"status": "DONE", "id": ..}`);
//! it is parsed into [`StatusResponse`] and validated into the tagged
//! [`SubmissionStatus`] before anything else sees it.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

const STATUS_DONE: &str = "DONE";
const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";

/// Identifier the service assigns to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubmissionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Validated state of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Persisted. The service may omit the id when it answers synchronously.
    Done {
        id: Option<SubmissionId>,
        completed_at: Option<String>,
    },
    /// Accepted but not yet persisted; poll `id` until it is done.
    InProgress { id: SubmissionId },
}

impl SubmissionStatus {
    pub fn done(id: impl Into<SubmissionId>) -> Self {
        SubmissionStatus::Done {
            id: Some(id.into()),
            completed_at: None,
        }
    }

    pub fn in_progress(id: impl Into<SubmissionId>) -> Self {
        SubmissionStatus::InProgress { id: id.into() }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, SubmissionStatus::Done { .. })
    }

    pub fn id(&self) -> Option<&SubmissionId> {
        match self {
            SubmissionStatus::Done { id, .. } => id.as_ref(),
            SubmissionStatus::InProgress { id } => Some(id),
        }
    }

    /// Parse and validate a JSON status body.
    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        serde_json::from_str::<StatusResponse>(body)?.validate()
    }
}

/// Status body as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<String>,
}

impl StatusResponse {
    /// Convert into a [`SubmissionStatus`], rejecting shapes the save
    /// machinery cannot act on.
    pub fn validate(self) -> Result<SubmissionStatus, TransportError> {
        match self.status.as_str() {
            STATUS_DONE => Ok(SubmissionStatus::Done {
                id: self.id.map(SubmissionId::from),
                completed_at: self.done_at,
            }),
            STATUS_IN_PROGRESS => match self.id {
                Some(id) => Ok(SubmissionStatus::InProgress { id: id.into() }),
                None => Err(TransportError::InvalidResponse(
                    "IN_PROGRESS status without an id".into(),
                )),
            },
            other => Err(TransportError::InvalidResponse(format!(
                "unknown status '{other}'"
            ))),
        }
    }
}

impl From<SubmissionStatus> for StatusResponse {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Done { id, completed_at } => StatusResponse {
                status: STATUS_DONE.to_string(),
                id: id.map(|id| id.0),
                done_at: completed_at,
            },
            SubmissionStatus::InProgress { id } => StatusResponse {
                status: STATUS_IN_PROGRESS.to_string(),
                id: Some(id.0),
                done_at: None,
            },
        }
    }
}

/// One document upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub document: String,
    pub filename: String,
    pub content_type: String,
}

/// Client side of the persistence service.
///
/// Implementations own the wire details (HTTP, multipart, auth). Both calls
/// must resolve: an unreachable service is reported as
/// [`TransportError::Unavailable`], not by hanging forever.
pub trait Transport: Send + Sync + 'static {
    /// Upload a document.
    fn submit(
        &self,
        upload: Upload,
    ) -> impl Future<Output = Result<SubmissionStatus, TransportError>> + Send;

    /// Ask for the current status of an earlier submission.
    fn query_status(
        &self,
        id: &SubmissionId,
    ) -> impl Future<Output = Result<SubmissionStatus, TransportError>> + Send;
}
