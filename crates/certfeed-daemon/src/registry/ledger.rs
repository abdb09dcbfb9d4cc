//! Nullifier and feedback ledgers behind one store interface.

use std::collections::{HashMap, HashSet};

use certfeed_types::{CertfeedError, CertfeedResult, ContentId, CourseId, Nullifier, RejectReason};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Result of a successful admission write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub course: CourseId,
    /// Position of the new entry in the course's feedback sequence.
    pub index: u64,
    /// Whether this entry registered the course.
    pub first_for_course: bool,
}

/// Courses of one page together with each course's full feedback list.
pub type CourseFeedbacks = (Vec<CourseId>, Vec<Vec<ContentId>>);

/// Persisted admission state: per-course nullifier sets, per-course
/// append-only feedback logs and the ordered course registry.
///
/// Every method is atomic on its own. `admit` is the only write the
/// admission path uses; it reserves the nullifier and appends the
/// feedback as one unit, or does nothing.
pub trait LedgerStore: Send + Sync {
    /// Inserts `nullifier` if absent. Returns whether it was newly consumed.
    fn try_consume(&self, course: &CourseId, nullifier: &Nullifier) -> CertfeedResult<bool>;

    fn contains_nullifier(&self, course: &CourseId, nullifier: &Nullifier) -> CertfeedResult<bool>;

    /// Appends without touching nullifiers, registering the course on its
    /// first entry.
    fn append_feedback(&self, course: &CourseId, content: &ContentId) -> CertfeedResult<Admission>;

    /// Reserves `nullifier` and appends `content`. A consumed nullifier
    /// fails with `DuplicateNullifier` and leaves every ledger untouched.
    fn admit(
        &self,
        course: &CourseId,
        nullifier: &Nullifier,
        content: &ContentId,
    ) -> CertfeedResult<Admission>;

    fn feedbacks(&self, course: &CourseId, offset: u64, limit: u64) -> CertfeedResult<Vec<ContentId>>;

    fn feedback_count(&self, course: &CourseId) -> CertfeedResult<u64>;

    fn courses(&self, offset: u64, limit: u64) -> CertfeedResult<Vec<CourseId>>;

    fn course_count(&self) -> CertfeedResult<u64>;

    /// Pages over courses and returns every feedback of each. Cost grows
    /// with the total feedback of the page, not with `limit`.
    fn all_feedbacks(&self, offset: u64, limit: u64) -> CertfeedResult<CourseFeedbacks> {
        let courses = self.courses(offset, limit)?;
        let mut feedbacks = Vec::with_capacity(courses.len());
        for course in &courses {
            feedbacks.push(self.feedbacks(course, 0, u64::MAX)?);
        }
        Ok((courses, feedbacks))
    }
}

/// `[offset, offset + limit)` clipped to `len`.
pub fn page_bounds(len: u64, offset: u64, limit: u64) -> (u64, u64) {
    let start = offset.min(len);
    let end = start.saturating_add(limit).min(len);
    (start, end)
}

#[derive(Default)]
struct LedgerState {
    nullifiers: HashMap<CourseId, HashSet<Nullifier>>,
    feedbacks: HashMap<CourseId, Vec<ContentId>>,
    courses: Vec<CourseId>,
}

impl LedgerState {
    fn append(&mut self, course: &CourseId, content: &ContentId) -> Admission {
        let entries = self.feedbacks.entry(*course).or_default();
        let first_for_course = entries.is_empty();
        entries.push(content.clone());
        let index = (entries.len() - 1) as u64;
        if first_for_course {
            self.courses.push(*course);
        }
        Admission {
            course: *course,
            index,
            first_for_course,
        }
    }
}

/// Ledger kept in process memory under a single lock.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slice_page<T: Clone>(items: &[T], offset: u64, limit: u64) -> Vec<T> {
    let (start, end) = page_bounds(items.len() as u64, offset, limit);
    items[start as usize..end as usize].to_vec()
}

impl LedgerStore for MemoryLedger {
    fn try_consume(&self, course: &CourseId, nullifier: &Nullifier) -> CertfeedResult<bool> {
        let mut state = self.state.write();
        Ok(state.nullifiers.entry(*course).or_default().insert(*nullifier))
    }

    fn contains_nullifier(&self, course: &CourseId, nullifier: &Nullifier) -> CertfeedResult<bool> {
        let state = self.state.read();
        Ok(state
            .nullifiers
            .get(course)
            .map(|set| set.contains(nullifier))
            .unwrap_or(false))
    }

    fn append_feedback(&self, course: &CourseId, content: &ContentId) -> CertfeedResult<Admission> {
        Ok(self.state.write().append(course, content))
    }

    fn admit(
        &self,
        course: &CourseId,
        nullifier: &Nullifier,
        content: &ContentId,
    ) -> CertfeedResult<Admission> {
        let mut state = self.state.write();
        if !state.nullifiers.entry(*course).or_default().insert(*nullifier) {
            return Err(CertfeedError::Rejected(RejectReason::DuplicateNullifier));
        }
        Ok(state.append(course, content))
    }

    fn feedbacks(&self, course: &CourseId, offset: u64, limit: u64) -> CertfeedResult<Vec<ContentId>> {
        let state = self.state.read();
        Ok(state
            .feedbacks
            .get(course)
            .map(|entries| slice_page(entries, offset, limit))
            .unwrap_or_default())
    }

    fn feedback_count(&self, course: &CourseId) -> CertfeedResult<u64> {
        let state = self.state.read();
        Ok(state.feedbacks.get(course).map(|e| e.len() as u64).unwrap_or(0))
    }

    fn courses(&self, offset: u64, limit: u64) -> CertfeedResult<Vec<CourseId>> {
        Ok(slice_page(&self.state.read().courses, offset, limit))
    }

    fn course_count(&self) -> CertfeedResult<u64> {
        Ok(self.state.read().courses.len() as u64)
    }

    fn all_feedbacks(&self, offset: u64, limit: u64) -> CertfeedResult<CourseFeedbacks> {
        let state = self.state.read();
        let courses = slice_page(&state.courses, offset, limit);
        let feedbacks = courses
            .iter()
            .map(|c| state.feedbacks.get(c).cloned().unwrap_or_default())
            .collect();
        Ok((courses, feedbacks))
    }
}
