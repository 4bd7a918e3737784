use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{Role, User};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Printing,
    Ready,
    Completed,
}

impl JobStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "printing" => Some(Self::Printing),
            "ready" => Some(Self::Ready),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Printing => "printing",
            Self::Ready => "ready",
            Self::Completed => "completed",
        }
    }

    /// Triage order for the staff queue view: jobs currently on the printer
    /// first, then the backlog, then the pickup shelf, then history.
    pub fn triage_rank(&self) -> u8 {
        match self {
            Self::Printing => 0,
            Self::Pending => 1,
            Self::Ready => 2,
            Self::Completed => 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrintType {
    Bw,
    Color,
}

impl PrintType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bw" => Some(Self::Bw),
            "color" => Some(Self::Color),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub id: String,
    pub owner_id: String,
    pub file_name: String,
    /// Opaque name of the stored blob under the upload directory.
    pub file_handle: String,
    pub copies: u32,
    pub print_type: PrintType,
    pub status: JobStatus,
    pub queue_number: u32,
    pub estimated_minutes: u32,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted by the store when creating a job. Queue number, estimate,
/// status, and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPrintJob {
    pub owner_id: String,
    pub file_name: String,
    pub file_handle: String,
    pub copies: u32,
    pub print_type: PrintType,
}

/// Owner display info attached to jobs in list responses.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OwnerSummary {
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl OwnerSummary {
    /// Placeholder used when the owning user record cannot be resolved.
    pub fn unknown() -> Self {
        Self {
            username: "unknown".into(),
            name: "Unknown".into(),
            role: Role::Student,
        }
    }
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// A job annotated with its owner, as returned by the listing operations.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobRecord {
    #[serde(flatten)]
    pub job: PrintJob,
    pub user: OwnerSummary,
}

/// Fixed linear-capacity model: one minute of base overhead plus one minute
/// per started batch of five copies.
pub fn estimate_minutes(copies: u32) -> u32 {
    copies.div_ceil(5) + 1
}
