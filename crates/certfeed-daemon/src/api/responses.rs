use certfeed_types::{CertificateRoot, ContentId, CourseId, ProofMode};
use serde::{Deserialize, Serialize};

use crate::registry::{AdmissionStatsSnapshot, RootRecord};
use crate::storage::StorageMetricsSnapshot;

pub const DEFAULT_PAGE_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub offset: u64,
    pub limit: u64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub course: CourseId,
    pub index: u64,
    pub mode: ProofMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseFeedbacksResponse {
    pub course: CourseId,
    pub total: u64,
    pub offset: u64,
    pub feedbacks: Vec<ContentId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoursesResponse {
    pub total: u64,
    pub offset: u64,
    pub courses: Vec<CourseId>,
}

/// `feedbacks[i]` belongs to `courses[i]`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AllFeedbacksResponse {
    pub courses: Vec<CourseId>,
    pub feedbacks: Vec<Vec<ContentId>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub course: CourseId,
    pub root: CertificateRoot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<i64>,
}

impl RootResponse {
    pub fn from_record(course: CourseId, record: Option<RootRecord>) -> Self {
        match record {
            Some(r) => Self {
                course,
                root: r.root,
                index: Some(r.index),
                published_at: Some(r.published_at),
            },
            None => Self {
                course,
                root: CertificateRoot::zero(),
                index: None,
                published_at: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootHistoryResponse {
    pub course: CourseId,
    pub total: u64,
    pub roots: Vec<RootRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishRootRequest {
    pub course: CourseId,
    pub root: CertificateRoot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub uptime_secs: u64,
    pub courses: u64,
    pub zk_enabled: bool,
    pub admission: AdmissionStatsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageMetricsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_bytes: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
