//! Feedback admission: one submission at a time per course, from root
//! lookup to ledger append.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use certfeed_crypto::PairingVerifier;
use certfeed_types::{
    CertfeedError, CertfeedResult, ContentId, CourseId, FeedbackSubmission, Nullifier, ProofMode,
    RejectReason,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ledger::{CourseFeedbacks, LedgerStore};
use super::oracle::RootOracle;
use super::proof::{eligibility_proof, EligibilityProof, ValidationContext};
use crate::config::AdmissionConfig;

/// One mutex per course in use. An entry lives only while some submission
/// for its course holds or waits on it.
#[derive(Default)]
pub struct CourseLocks {
    locks: Mutex<HashMap<CourseId, Arc<Mutex<()>>>>,
}

impl CourseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding `course`'s lock.
    pub fn with_lock<T>(&self, course: &CourseId, f: impl FnOnce() -> T) -> T {
        let handle = self.locks.lock().entry(*course).or_default().clone();
        let result = {
            let _guard = handle.lock();
            f()
        };

        // Clones are only handed out under the table lock, so a count of two
        // (table + ours) means nobody else is waiting.
        let mut locks = self.locks.lock();
        let idle = locks
            .get(course)
            .is_some_and(|current| Arc::ptr_eq(current, &handle) && Arc::strong_count(&handle) == 2);
        if idle {
            locks.remove(course);
        }
        result
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct AdmissionStats {
    received: AtomicU64,
    admitted: AtomicU64,
    rejected: AtomicU64,
    ring_admitted: AtomicU64,
    zk_admitted: AtomicU64,
    by_reason: [AtomicU64; RejectReason::ALL.len()],
}

impl AdmissionStats {
    pub fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            ring_admitted: AtomicU64::new(0),
            zk_admitted: AtomicU64::new(0),
            by_reason: Default::default(),
        }
    }

    fn record_rejection(&self, reason: RejectReason) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        self.by_reason[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn record_admission(&self, mode: ProofMode) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
        match mode {
            ProofMode::Ring => self.ring_admitted.fetch_add(1, Ordering::Relaxed),
            ProofMode::Zk => self.zk_admitted.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn snapshot(&self) -> AdmissionStatsSnapshot {
        AdmissionStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            ring_admitted: self.ring_admitted.load(Ordering::Relaxed),
            zk_admitted: self.zk_admitted.load(Ordering::Relaxed),
            rejections: RejectReason::ALL
                .iter()
                .map(|r| (r.kind().to_string(), self.by_reason[r.index()].load(Ordering::Relaxed)))
                .filter(|(_, count)| *count > 0)
                .collect(),
        }
    }
}

impl Default for AdmissionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionStatsSnapshot {
    pub received: u64,
    pub admitted: u64,
    pub rejected: u64,
    pub ring_admitted: u64,
    pub zk_admitted: u64,
    pub rejections: BTreeMap<String, u64>,
}

/// An admitted feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admitted {
    pub course: CourseId,
    pub index: u64,
    pub nullifier: Nullifier,
    pub mode: ProofMode,
}

pub struct AdmissionController {
    ledger: Arc<dyn LedgerStore>,
    oracle: Arc<dyn RootOracle>,
    verifier: Arc<dyn PairingVerifier>,
    limits: AdmissionConfig,
    locks: CourseLocks,
    stats: AdmissionStats,
}

impl AdmissionController {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        oracle: Arc<dyn RootOracle>,
        verifier: Arc<dyn PairingVerifier>,
        limits: AdmissionConfig,
    ) -> Self {
        Self {
            ledger,
            oracle,
            verifier,
            limits,
            locks: CourseLocks::new(),
            stats: AdmissionStats::new(),
        }
    }

    pub fn submit(&self, submission: FeedbackSubmission) -> CertfeedResult<Admitted> {
        let FeedbackSubmission {
            course,
            content_id,
            proof,
        } = submission;
        let proof = eligibility_proof(proof, self.verifier.clone());
        self.submit_proof(&course, &content_id, proof.as_ref())
    }

    /// Runs one submission to completion. Nothing is written unless the
    /// proof validates and the nullifier is fresh for `course`.
    pub fn submit_proof(
        &self,
        course: &CourseId,
        content_id: &str,
        proof: &dyn EligibilityProof,
    ) -> CertfeedResult<Admitted> {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        let mode = proof.mode();
        debug!(course = %course, ?mode, "Feedback received");

        let content_id = match self.check_content_id(content_id) {
            Ok(c) => c,
            Err(reason) => return Err(self.reject(course, mode, reason)),
        };

        // Roots are append-only and never zero once published, so an
        // unpublished course can be turned away before it gets a lock.
        if self.oracle.root(course)?.is_zero() {
            return Err(self.reject(course, mode, RejectReason::ProofMismatch));
        }

        self.locks
            .with_lock(course, || self.admit_locked(course, &content_id, proof, mode))
    }

    fn admit_locked(
        &self,
        course: &CourseId,
        content_id: &ContentId,
        proof: &dyn EligibilityProof,
        mode: ProofMode,
    ) -> CertfeedResult<Admitted> {
        let root = self.oracle.root(course)?;

        let ctx = ValidationContext {
            course,
            content_id,
            root,
            max_ring_size: self.limits.max_ring_size,
        };
        let nullifier = match proof.validate(&ctx) {
            Ok(n) => n,
            Err(reason) => return Err(self.reject(course, mode, reason)),
        };

        let admission = match self.ledger.admit(course, &nullifier, content_id) {
            Ok(a) => a,
            Err(CertfeedError::Rejected(reason)) => return Err(self.reject(course, mode, reason)),
            Err(e) => return Err(e),
        };

        self.stats.record_admission(mode);
        info!(
            course = %course,
            index = admission.index,
            ?mode,
            nullifier = %nullifier.short_hex(),
            "Feedback admitted"
        );
        if admission.first_for_course {
            info!(course = %course, "Course registered");
        }

        Ok(Admitted {
            course: *course,
            index: admission.index,
            nullifier,
            mode,
        })
    }

    /// Counts a submission whose body did not decode into a
    /// `FeedbackSubmission` at all.
    pub fn reject_undecodable(&self, detail: &str) -> CertfeedError {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        self.stats.record_rejection(RejectReason::MalformedInput);
        warn!(reason = RejectReason::MalformedInput.kind(), detail, "Feedback rejected");
        CertfeedError::Rejected(RejectReason::MalformedInput)
    }

    pub fn active_course_locks(&self) -> usize {
        self.locks.len()
    }

    fn check_content_id(&self, content_id: &str) -> Result<ContentId, RejectReason> {
        if content_id.len() > self.limits.max_content_id_len {
            return Err(RejectReason::MalformedInput);
        }
        ContentId::new(content_id).map_err(|_| RejectReason::MalformedInput)
    }

    fn reject(&self, course: &CourseId, mode: ProofMode, reason: RejectReason) -> CertfeedError {
        self.stats.record_rejection(reason);
        warn!(course = %course, ?mode, reason = reason.kind(), "Feedback rejected");
        CertfeedError::Rejected(reason)
    }

    fn clamp(&self, limit: u64) -> u64 {
        limit.min(self.limits.max_page_size)
    }

    pub fn feedbacks(&self, course: &CourseId, offset: u64, limit: u64) -> CertfeedResult<Vec<ContentId>> {
        self.ledger.feedbacks(course, offset, self.clamp(limit))
    }

    pub fn feedback_count(&self, course: &CourseId) -> CertfeedResult<u64> {
        self.ledger.feedback_count(course)
    }

    pub fn courses(&self, offset: u64, limit: u64) -> CertfeedResult<Vec<CourseId>> {
        self.ledger.courses(offset, self.clamp(limit))
    }

    pub fn course_count(&self) -> CertfeedResult<u64> {
        self.ledger.course_count()
    }

    pub fn all_feedbacks(&self, offset: u64, limit: u64) -> CertfeedResult<CourseFeedbacks> {
        self.ledger.all_feedbacks(offset, self.clamp(limit))
    }

    pub fn has_consumed(&self, course: &CourseId, nullifier: &Nullifier) -> CertfeedResult<bool> {
        self.ledger.contains_nullifier(course, nullifier)
    }

    pub fn stats(&self) -> AdmissionStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn limits(&self) -> &AdmissionConfig {
        &self.limits
    }
}
