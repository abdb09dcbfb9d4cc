//! Admission engine: root registry, eligibility proofs, ledgers and the
//! controller tying them together.

mod controller;
mod ledger;
mod oracle;
mod proof;

pub use controller::{AdmissionController, AdmissionStatsSnapshot, Admitted, CourseLocks};
pub use ledger::{page_bounds, Admission, CourseFeedbacks, LedgerStore, MemoryLedger};
pub use oracle::{check_publishable, MemoryRootRegistry, RootOracle, RootRecord, RootRegistry};
pub use proof::{eligibility_proof, EligibilityProof, RingEligibility, ValidationContext, ZkEligibility};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ark_ff::Field;
    use certfeed_crypto::{course_to_fr, key_image_nullifier, DisabledVerifier, Fr};
    use certfeed_types::{
        CertfeedError, ContentId, CourseId, CredentialStatus, ProofMode, RejectReason, Word,
    };

    use crate::testing::*;

    fn rejection<T: std::fmt::Debug>(result: Result<T, CertfeedError>) -> RejectReason {
        result.unwrap_err().rejection().expect("expected a rejection")
    }

    fn ring_setup(n: usize, seed: u64) -> (MemoryHarness, CertificateSet) {
        let mut rng = rng(seed);
        let set = CertificateSet::active(n, &mut rng);
        let harness = memory_harness(Arc::new(DisabledVerifier));
        harness.publish(&course(), set.root());
        (harness, set)
    }

    #[test]
    fn test_ring_of_one_then_duplicate() {
        let (harness, set) = ring_setup(1, 1);
        let mut rng = rng(2);
        let submission = set.ring_submission(&course(), IPFS, 0, &[0], &mut rng);

        let admitted = harness.controller.submit(submission).unwrap();
        assert_eq!(admitted.index, 0);
        assert_eq!(admitted.mode, ProofMode::Ring);
        assert_eq!(
            harness.controller.feedbacks(&course(), 0, 3).unwrap(),
            vec![ContentId::new(IPFS).unwrap()]
        );

        // Fresh signature, same key image.
        let again = set.ring_submission(&course(), IPFS, 0, &[0], &mut rng);
        assert_eq!(
            rejection(harness.controller.submit(again)),
            RejectReason::DuplicateNullifier
        );
        assert_eq!(harness.controller.feedback_count(&course()).unwrap(), 1);
    }

    #[test]
    fn test_ring_nullifier_survives_reordering_and_decoys() {
        let (harness, set) = ring_setup(4, 3);
        let mut rng = rng(4);

        let first = set.ring_submission(&course(), "first", 2, &[0, 1, 2], &mut rng);
        harness.controller.submit(first).unwrap();

        let reordered = set.ring_submission(&course(), "second", 2, &[3, 2, 0], &mut rng);
        assert_eq!(
            rejection(harness.controller.submit(reordered)),
            RejectReason::DuplicateNullifier
        );

        let other_signer = set.ring_submission(&course(), "third", 1, &[2, 1, 0], &mut rng);
        assert_eq!(harness.controller.submit(other_signer).unwrap().index, 1);
    }

    #[test]
    fn test_ring_nullifier_is_scoped_to_course() {
        let mut rng = rng(5);
        let set = CertificateSet::active(2, &mut rng);
        let harness = memory_harness(Arc::new(DisabledVerifier));
        harness.publish(&course(), set.root());
        harness.publish(&other_course(), set.root());

        let a = harness
            .controller
            .submit(set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng))
            .unwrap();
        let b = harness
            .controller
            .submit(set.ring_submission(&other_course(), IPFS, 0, &[0, 1], &mut rng))
            .unwrap();
        assert_ne!(a.nullifier, b.nullifier);
        assert_eq!(harness.controller.course_count().unwrap(), 2);
        assert_eq!(
            harness.controller.courses(0, 10).unwrap(),
            vec![course(), other_course()]
        );
    }

    #[test]
    fn test_ring_rejections_leave_no_trace() {
        let (harness, set) = ring_setup(2, 6);
        let mut rng = rng(7);

        let mut empty_path = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        ring_parts(&mut empty_path).smt_proofs[1].clear();
        assert_eq!(
            rejection(harness.controller.submit(empty_path)),
            RejectReason::EmptyProof
        );

        let mut bad_path = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        let sibling = ring_parts(&mut bad_path).smt_proofs[0][3];
        ring_parts(&mut bad_path).smt_proofs[0][3] = bump(&sibling);
        assert_eq!(
            rejection(harness.controller.submit(bad_path)),
            RejectReason::ProofMismatch
        );

        let mut bad_response = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        let response = ring_parts(&mut bad_response).responses[0];
        ring_parts(&mut bad_response).responses[0] = bump(&response);
        assert_eq!(
            rejection(harness.controller.submit(bad_response)),
            RejectReason::WrongSignature
        );

        let signed_elsewhere = set.ring_submission(&course(), "something else", 0, &[0, 1], &mut rng);
        let mut swapped = signed_elsewhere;
        swapped.content_id = IPFS.to_string();
        assert_eq!(
            rejection(harness.controller.submit(swapped)),
            RejectReason::WrongSignature
        );

        assert_eq!(harness.controller.feedback_count(&course()).unwrap(), 0);
        assert_eq!(harness.controller.course_count().unwrap(), 0);

        // The signer can still submit once everything else failed.
        let good = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        harness.controller.submit(good).unwrap();

        let stats = harness.controller.stats();
        assert_eq!(stats.received, 5);
        assert_eq!(stats.rejected, 4);
        assert_eq!(stats.ring_admitted, 1);
        assert_eq!(stats.rejections.get("WrongSignature"), Some(&2));
    }

    #[test]
    fn test_ring_shape_errors() {
        let (harness, set) = ring_setup(2, 8);
        let mut rng = rng(9);

        let mut empty = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        let parts = ring_parts(&mut empty);
        parts.public_keys_x.clear();
        parts.public_keys_y.clear();
        assert_eq!(rejection(harness.controller.submit(empty)), RejectReason::EmptyProof);

        let mut short = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        ring_parts(&mut short).leaf_keys.pop();
        assert_eq!(rejection(harness.controller.submit(short)), RejectReason::MalformedInput);

        let mut off_curve = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        let y = ring_parts(&mut off_curve).public_keys_y[1];
        ring_parts(&mut off_curve).public_keys_y[1] = bump(&y);
        assert_eq!(
            rejection(harness.controller.submit(off_curve)),
            RejectReason::MalformedInput
        );
    }

    #[test]
    fn test_ring_leaf_key_must_match_member() {
        let (harness, set) = ring_setup(2, 10);
        let mut rng = rng(11);
        let mut submission = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        let parts = ring_parts(&mut submission);
        parts.leaf_keys.swap(0, 1);
        parts.smt_proofs.swap(0, 1);
        assert_eq!(
            rejection(harness.controller.submit(submission)),
            RejectReason::ProofMismatch
        );
    }

    #[test]
    fn test_ring_rejects_revoked_member() {
        let mut rng = rng(12);
        let set = CertificateSet::new(&[CredentialStatus::Active, CredentialStatus::Revoked], &mut rng);
        let harness = memory_harness(Arc::new(DisabledVerifier));
        harness.publish(&course(), set.root());

        // A revoked decoy taints the whole ring.
        let submission = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        assert_eq!(
            rejection(harness.controller.submit(submission)),
            RejectReason::InactiveCredential
        );

        let alone = set.ring_submission(&course(), IPFS, 0, &[0], &mut rng);
        harness.controller.submit(alone).unwrap();
    }

    #[test]
    fn test_ring_against_stale_root() {
        let (harness, set) = ring_setup(1, 13);
        let mut rng = rng(14);
        let submission = set.ring_submission(&course(), IPFS, 0, &[0], &mut rng);
        harness.publish(&course(), Word::from_u64(99).into());
        assert_eq!(
            rejection(harness.controller.submit(submission)),
            RejectReason::ProofMismatch
        );
    }

    #[test]
    fn test_unpublished_course_is_mismatch() {
        let mut rng = rng(15);
        let set = CertificateSet::active(1, &mut rng);
        let harness = memory_harness(Arc::new(DisabledVerifier));
        let submission = set.ring_submission(&course(), IPFS, 0, &[0], &mut rng);
        assert_eq!(
            rejection(harness.controller.submit(submission)),
            RejectReason::ProofMismatch
        );
    }

    #[test]
    fn test_unpublished_courses_take_no_lock() {
        let mut rng = rng(22);
        let set = CertificateSet::active(1, &mut rng);
        let harness = memory_harness(Arc::new(DisabledVerifier));
        for i in 0..200u32 {
            let mut bytes = [0u8; 20];
            bytes[..4].copy_from_slice(&i.to_be_bytes());
            let unknown = CourseId::from_bytes(bytes);
            let submission = set.ring_submission(&unknown, IPFS, 0, &[0], &mut rng);
            assert_eq!(
                rejection(harness.controller.submit(submission)),
                RejectReason::ProofMismatch
            );
        }
        assert_eq!(harness.controller.active_course_locks(), 0);
        assert_eq!(harness.controller.stats().rejected, 200);
    }

    #[test]
    fn test_course_lock_released_after_admission() {
        let (harness, set) = ring_setup(2, 23);
        let mut rng = rng(24);
        let ok = set.ring_submission(&course(), IPFS, 0, &[0, 1], &mut rng);
        harness.controller.submit(ok).unwrap();
        let mut bad = set.ring_submission(&course(), "other", 1, &[0, 1], &mut rng);
        let response = ring_parts(&mut bad).responses[0];
        ring_parts(&mut bad).responses[0] = bump(&response);
        assert!(harness.controller.submit(bad).is_err());
        assert_eq!(harness.controller.active_course_locks(), 0);
    }

    #[test]
    fn test_content_id_limits() {
        let (harness, set) = ring_setup(1, 16);
        let mut rng = rng(17);

        let empty = set.ring_submission(&course(), "", 0, &[0], &mut rng);
        assert_eq!(rejection(harness.controller.submit(empty)), RejectReason::MalformedInput);

        let long = "x".repeat(harness.controller.limits().max_content_id_len + 1);
        let too_long = set.ring_submission(&course(), &long, 0, &[0], &mut rng);
        assert_eq!(rejection(harness.controller.submit(too_long)), RejectReason::MalformedInput);
    }

    #[test]
    fn test_zk_admission_and_tampering() {
        let harness = memory_harness(groth16_verifier());
        let root: certfeed_types::CertificateRoot = Word::from_u64(1234).into();
        harness.publish(&course(), root);

        let mut tampered = zk_submission(&course(), IPFS, &root, 5);
        let a0 = zk_parts(&mut tampered).a[0];
        zk_parts(&mut tampered).a[0] = bump(&a0);
        assert_eq!(
            rejection(harness.controller.submit(tampered)),
            RejectReason::InvalidProof
        );

        let admitted = harness
            .controller
            .submit(zk_submission(&course(), IPFS, &root, 5))
            .unwrap();
        assert_eq!(admitted.mode, ProofMode::Zk);
        assert_eq!(
            rejection(harness.controller.submit(zk_submission(&course(), "again", &root, 5))),
            RejectReason::DuplicateNullifier
        );
        assert_eq!(harness.controller.feedback_count(&course()).unwrap(), 1);
    }

    #[test]
    fn test_zk_statement_must_match_submission() {
        let harness = memory_harness(groth16_verifier());
        let root: certfeed_types::CertificateRoot = Word::from_u64(77).into();
        harness.publish(&course(), root);

        let wrong_content = zk_submission(&course(), "other content", &root, 3);
        let mut relabeled = wrong_content;
        relabeled.content_id = IPFS.to_string();
        assert_eq!(
            rejection(harness.controller.submit(relabeled)),
            RejectReason::MalformedInput
        );

        let wrong_root = zk_submission(&course(), IPFS, &Word::from_u64(78).into(), 3);
        assert_eq!(
            rejection(harness.controller.submit(wrong_root)),
            RejectReason::ProofMismatch
        );

        let mut short = zk_submission(&course(), IPFS, &root, 3);
        zk_parts(&mut short).public_inputs.pop();
        assert_eq!(rejection(harness.controller.submit(short)), RejectReason::MalformedInput);

        let mut reserved = zk_submission(&course(), IPFS, &root, 3);
        zk_parts(&mut reserved).public_inputs[5] = Word::from_u64(1);
        assert_eq!(
            rejection(harness.controller.submit(reserved)),
            RejectReason::MalformedInput
        );
    }

    #[test]
    fn test_zk_without_verifier_is_unavailable() {
        let harness = memory_harness(Arc::new(DisabledVerifier));
        let root: certfeed_types::CertificateRoot = Word::from_u64(5).into();
        harness.publish(&course(), root);
        assert_eq!(
            rejection(harness.controller.submit(zk_submission(&course(), IPFS, &root, 9))),
            RejectReason::VerifierUnavailable
        );
        assert_eq!(harness.controller.feedback_count(&course()).unwrap(), 0);
    }

    /// Picks a credential whose ring nullifier is also reachable by the
    /// reference circuit, returning its index and the matching zk secret.
    fn cross_mode_signer(set: &CertificateSet) -> (usize, Fr) {
        let course_fr = course_to_fr(&course());
        set.credentials
            .iter()
            .enumerate()
            .find_map(|(i, credential)| {
                let image = credential.secret.key_image(course().as_bytes())?;
                (key_image_nullifier(&image) - course_fr).sqrt().map(|s| (i, s))
            })
            .expect("no credential with a square nullifier offset")
    }

    #[test]
    fn test_nullifier_shared_across_modes() {
        let mut rng = rng(18);
        let set = CertificateSet::active(16, &mut rng);
        let (signer, secret) = cross_mode_signer(&set);
        let root = set.root();

        let zk_for = |content: &str| {
            let statement = zk_statement(&course(), content, &root, secret);
            zk_submission_for(&course(), content, &statement, secret)
        };

        // Ring first, then zk.
        let harness = memory_harness(groth16_verifier());
        harness.publish(&course(), root);
        let ring = harness
            .controller
            .submit(set.ring_submission(&course(), IPFS, signer, &[signer], &mut rng))
            .unwrap();
        assert_eq!(
            rejection(harness.controller.submit(zk_for("zk"))),
            RejectReason::DuplicateNullifier
        );

        // Zk first, then ring.
        let harness = memory_harness(groth16_verifier());
        harness.publish(&course(), root);
        let zk = harness.controller.submit(zk_for("zk")).unwrap();
        assert_eq!(zk.nullifier, ring.nullifier);
        assert_eq!(
            rejection(
                harness
                    .controller
                    .submit(set.ring_submission(&course(), IPFS, signer, &[signer], &mut rng))
            ),
            RejectReason::DuplicateNullifier
        );
        assert!(harness.controller.has_consumed(&course(), &zk.nullifier).unwrap());
    }

    #[test]
    fn test_concurrent_submissions_same_course() {
        let (harness, set) = ring_setup(8, 19);
        let set = Arc::new(set);
        let mut handles = Vec::new();
        for signer in 0..8usize {
            let controller = harness.controller.clone();
            let set = set.clone();
            handles.push(std::thread::spawn(move || {
                let mut rng = rng(100 + signer as u64);
                let members: Vec<usize> = (0..8).collect();
                let first = set.ring_submission(&course(), &format!("fb-{signer}"), signer, &members, &mut rng);
                let replay = set.ring_submission(&course(), &format!("replay-{signer}"), signer, &members, &mut rng);
                let a = controller.submit(first).is_ok();
                let b = controller.submit(replay).is_ok();
                (a, b)
            }));
        }
        for handle in handles {
            assert_eq!(handle.join().unwrap(), (true, false));
        }
        assert_eq!(harness.controller.active_course_locks(), 0);

        let mut indices: Vec<String> = harness
            .controller
            .feedbacks(&course(), 0, 100)
            .unwrap()
            .into_iter()
            .map(|c| c.as_str().to_string())
            .collect();
        assert_eq!(indices.len(), 8);
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), 8);
    }

    #[test]
    fn test_queries_clamp_limit() {
        let (harness, set) = ring_setup(3, 20);
        let mut rng = rng(21);
        for signer in 0..3 {
            let s = set.ring_submission(&course(), &format!("c{signer}"), signer, &[0, 1, 2], &mut rng);
            harness.controller.submit(s).unwrap();
        }
        assert_eq!(harness.controller.feedbacks(&course(), 1, 1).unwrap().len(), 1);
        assert_eq!(harness.controller.feedbacks(&course(), 5, 10).unwrap().len(), 0);
        let (courses, feedbacks) = harness.controller.all_feedbacks(0, 10).unwrap();
        assert_eq!(courses, vec![course()]);
        assert_eq!(feedbacks[0].len(), 3);
    }
}
