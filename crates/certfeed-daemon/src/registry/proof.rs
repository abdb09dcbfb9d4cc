//! Eligibility proofs: the two submission modes behind one validation
//! contract. Validation is pure; it reads no ledger state and writes none.

use std::sync::Arc;

use certfeed_crypto::{
    content_binding, course_to_fr, credential_leaf_key, decode_g1_strict, feedback_message,
    fr_from_word, fr_from_words, fr_to_word, verify_membership, verify_ring, Fr, PairingVerifier,
    ProofPoints, RingSignature, FeedbackStatement,
};
use certfeed_types::{
    CertificateRoot, ContentId, CourseId, CredentialStatus, Nullifier, ProofMode, RejectReason,
    RingSubmission, SubmissionProof, ZkSubmission,
};
use tracing::{debug, warn};

/// Statement every eligibility proof is checked against.
pub struct ValidationContext<'a> {
    pub course: &'a CourseId,
    pub content_id: &'a ContentId,
    pub root: CertificateRoot,
    pub max_ring_size: usize,
}

impl ValidationContext<'_> {
    fn root_scalar(&self) -> Result<Fr, RejectReason> {
        fr_from_word(&self.root.into()).map_err(|_| RejectReason::ProofMismatch)
    }
}

pub trait EligibilityProof: Send + Sync {
    fn mode(&self) -> ProofMode;

    /// Checks the proof against `ctx` and yields the nullifier it commits to.
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<Nullifier, RejectReason>;
}

pub fn eligibility_proof(
    proof: SubmissionProof,
    verifier: Arc<dyn PairingVerifier>,
) -> Box<dyn EligibilityProof> {
    match proof {
        SubmissionProof::Ring(ring) => Box::new(RingEligibility::new(ring)),
        SubmissionProof::Zk(zk) => Box::new(ZkEligibility::new(zk, verifier)),
    }
}

/// Ring signature over certificate keys plus one SMT path per member.
pub struct RingEligibility {
    submission: RingSubmission,
}

impl RingEligibility {
    pub fn new(submission: RingSubmission) -> Self {
        Self { submission }
    }

    fn check_shape(&self, max_ring_size: usize) -> Result<usize, RejectReason> {
        let s = &self.submission;
        let n = s.public_keys_x.len();
        if n == 0 || s.challenges.is_empty() || s.responses.is_empty() || s.smt_proofs.is_empty() {
            return Err(RejectReason::EmptyProof);
        }
        let lengths = [
            s.public_keys_y.len(),
            s.challenges.len(),
            s.responses.len(),
            s.smt_proofs.len(),
            s.leaf_keys.len(),
            s.leaf_values.len(),
        ];
        if lengths.iter().any(|len| *len != n) {
            debug!(ring = n, ?lengths, "Ring arrays disagree in length");
            return Err(RejectReason::MalformedInput);
        }
        if n > max_ring_size {
            debug!(ring = n, max = max_ring_size, "Ring too large");
            return Err(RejectReason::MalformedInput);
        }
        Ok(n)
    }
}

impl EligibilityProof for RingEligibility {
    fn mode(&self) -> ProofMode {
        ProofMode::Ring
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<Nullifier, RejectReason> {
        let n = self.check_shape(ctx.max_ring_size)?;
        let s = &self.submission;

        let ring = s
            .public_keys_x
            .iter()
            .zip(&s.public_keys_y)
            .map(|(x, y)| decode_g1_strict(x, y))
            .collect::<Result<Vec<_>, _>>()?;
        let key_image = decode_g1_strict(&s.key_image[0], &s.key_image[1])?;
        let challenges = fr_from_words(&s.challenges)?;
        let responses = fr_from_words(&s.responses)?;
        let leaf_keys = fr_from_words(&s.leaf_keys)?;
        let leaf_values = fr_from_words(&s.leaf_values)?;
        let paths = s
            .smt_proofs
            .iter()
            .map(|path| fr_from_words(path))
            .collect::<Result<Vec<_>, _>>()?;

        let root = ctx.root_scalar()?;
        for i in 0..n {
            if credential_leaf_key(&ring[i]) != leaf_keys[i] {
                debug!(member = i, "Leaf key does not belong to ring key");
                return Err(RejectReason::ProofMismatch);
            }
            verify_membership(root, leaf_keys[i], leaf_values[i], &paths[i])?;
            if !CredentialStatus::from_word(&s.leaf_values[i]).is_active() {
                return Err(RejectReason::InactiveCredential);
            }
        }

        let message = feedback_message(ctx.course, ctx.content_id.as_bytes());
        let signature = RingSignature {
            key_image,
            challenges,
            responses,
        };
        let nullifier = verify_ring(ctx.course.as_bytes(), &message, &ring, &signature)?;
        Ok(Nullifier::from(fr_to_word(&nullifier)))
    }
}

/// Groth16 proof of the same statement.
pub struct ZkEligibility {
    submission: ZkSubmission,
    verifier: Arc<dyn PairingVerifier>,
}

impl ZkEligibility {
    pub fn new(submission: ZkSubmission, verifier: Arc<dyn PairingVerifier>) -> Self {
        Self {
            submission,
            verifier,
        }
    }
}

impl EligibilityProof for ZkEligibility {
    fn mode(&self) -> ProofMode {
        ProofMode::Zk
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<Nullifier, RejectReason> {
        let s = &self.submission;
        let inputs = fr_from_words(&s.public_inputs)?;
        let statement =
            FeedbackStatement::from_public_inputs(&inputs).ok_or(RejectReason::MalformedInput)?;

        if statement.course != course_to_fr(ctx.course) {
            debug!("Public inputs bound to a different course");
            return Err(RejectReason::MalformedInput);
        }
        if statement.content_binding != content_binding(ctx.content_id.as_bytes()) {
            debug!("Public inputs bound to different content");
            return Err(RejectReason::MalformedInput);
        }
        if statement.root != ctx.root_scalar()? {
            return Err(RejectReason::ProofMismatch);
        }

        let points = ProofPoints::from_words(&s.a, &s.b, &s.c)?;
        let expected = statement.public_inputs();
        match self.verifier.verify_pairing_proof(&points, &expected) {
            Ok(true) => Ok(Nullifier::from(fr_to_word(&statement.nullifier))),
            Ok(false) => Err(RejectReason::InvalidProof),
            Err(e) => {
                warn!(error = %e, "failed to call verifyProof");
                Err(RejectReason::VerifierUnavailable)
            }
        }
    }
}
