//! Certificate roots: the read side the admission path consumes and the
//! append-only publication side operators use.

use std::collections::HashMap;

use certfeed_crypto::fr_from_word;
use certfeed_types::{CertfeedError, CertfeedResult, CertificateRoot, CourseId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ledger::page_bounds;

pub trait RootOracle: Send + Sync {
    /// Latest published root, or the zero root for an unknown course.
    fn root(&self, course: &CourseId) -> CertfeedResult<CertificateRoot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    pub course: CourseId,
    pub root: CertificateRoot,
    /// Position in the course's root history.
    pub index: u64,
    pub published_at: i64,
}

pub trait RootRegistry: RootOracle {
    fn publish(&self, course: &CourseId, root: CertificateRoot) -> CertfeedResult<RootRecord>;

    fn latest(&self, course: &CourseId) -> CertfeedResult<Option<RootRecord>>;

    fn history(&self, course: &CourseId, offset: u64, limit: u64) -> CertfeedResult<Vec<RootRecord>>;

    fn history_len(&self, course: &CourseId) -> CertfeedResult<u64>;
}

/// Published roots must be canonical scalars and may not be zero, which is
/// reserved for "no root".
pub fn check_publishable(root: &CertificateRoot) -> CertfeedResult<()> {
    if root.is_zero() {
        return Err(CertfeedError::InvalidInput("root cannot be zero".into()));
    }
    fr_from_word(&(*root).into()).map_err(|_| {
        CertfeedError::InvalidInput("root is not a canonical BN254 scalar".into())
    })?;
    Ok(())
}

#[derive(Default)]
pub struct MemoryRootRegistry {
    roots: RwLock<HashMap<CourseId, Vec<RootRecord>>>,
}

impl MemoryRootRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RootOracle for MemoryRootRegistry {
    fn root(&self, course: &CourseId) -> CertfeedResult<CertificateRoot> {
        Ok(self
            .latest(course)?
            .map(|r| r.root)
            .unwrap_or_else(CertificateRoot::zero))
    }
}

impl RootRegistry for MemoryRootRegistry {
    fn publish(&self, course: &CourseId, root: CertificateRoot) -> CertfeedResult<RootRecord> {
        check_publishable(&root)?;
        let mut roots = self.roots.write();
        let history = roots.entry(*course).or_default();
        let record = RootRecord {
            course: *course,
            root,
            index: history.len() as u64,
            published_at: chrono::Utc::now().timestamp(),
        };
        history.push(record);
        info!(course = %course, index = record.index, "Published certificate root");
        Ok(record)
    }

    fn latest(&self, course: &CourseId) -> CertfeedResult<Option<RootRecord>> {
        Ok(self.roots.read().get(course).and_then(|h| h.last().copied()))
    }

    fn history(&self, course: &CourseId, offset: u64, limit: u64) -> CertfeedResult<Vec<RootRecord>> {
        let roots = self.roots.read();
        let Some(history) = roots.get(course) else {
            return Ok(Vec::new());
        };
        let (start, end) = page_bounds(history.len() as u64, offset, limit);
        Ok(history[start as usize..end as usize].to_vec())
    }

    fn history_len(&self, course: &CourseId) -> CertfeedResult<u64> {
        Ok(self.roots.read().get(course).map(|h| h.len() as u64).unwrap_or(0))
    }
}
