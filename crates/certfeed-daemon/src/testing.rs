//! Fixtures shared by the daemon's unit and API tests.

use std::sync::{Arc, OnceLock};

use ark_bn254::Bn254;
use ark_groth16::{ProvingKey, VerifyingKey};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use certfeed_crypto::{
    content_binding, course_to_fr, credential_leaf_key, feedback_message, feedback_nullifier,
    fr_to_word, g1_to_words, proof_to_words, prove_feedback, setup_feedback_circuit, sign_ring,
    FeedbackStatement, Fr, G1Affine, Groth16Verifier, PairingVerifier, RingSecretKey,
    SparseMerkleTree,
};
use certfeed_types::{
    CertificateRoot, CourseId, CredentialStatus, FeedbackSubmission, RingSubmission,
    SubmissionProof, Word, ZkSubmission,
};

use crate::config::AdmissionConfig;
use crate::registry::{AdmissionController, MemoryLedger, MemoryRootRegistry, RootRegistry};

pub const IPFS: &str = "QmcafQDfq4LGzQ6CimzLVBt7rqEAFSwE4ya8uZt9zUSZJr";

pub fn course() -> CourseId {
    CourseId::from_hex("0x63223538169D7228b37C9182eD6d2b9B2CfD8F26").unwrap()
}

pub fn other_course() -> CourseId {
    CourseId::from_bytes([0x42; 20])
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub struct Credential {
    pub secret: RingSecretKey,
    pub public_key: G1Affine,
    pub leaf_key: Fr,
    pub status: CredentialStatus,
}

/// A course's certificate tree and the credentials in it.
pub struct CertificateSet {
    tree: SparseMerkleTree,
    pub credentials: Vec<Credential>,
}

impl CertificateSet {
    pub fn new(statuses: &[CredentialStatus], rng: &mut StdRng) -> Self {
        let mut tree = SparseMerkleTree::new(32);
        let mut credentials = Vec::new();
        for status in statuses {
            let secret = RingSecretKey::random(rng);
            let public_key = secret.public_key();
            let leaf_key = credential_leaf_key(&public_key);
            let value = Fr::from(status.code());
            assert!(tree.insert(leaf_key, value));
            credentials.push(Credential {
                secret,
                public_key,
                leaf_key,
                status: *status,
            });
        }
        Self { tree, credentials }
    }

    pub fn active(n: usize, rng: &mut StdRng) -> Self {
        Self::new(&vec![CredentialStatus::Active; n], rng)
    }

    pub fn root(&self) -> CertificateRoot {
        fr_to_word(&self.tree.root()).into()
    }

    /// Ring submission signed by `signer` over the credentials in `members`.
    pub fn ring_submission(
        &self,
        course: &CourseId,
        content_id: &str,
        signer: usize,
        members: &[usize],
        rng: &mut StdRng,
    ) -> FeedbackSubmission {
        let ring: Vec<G1Affine> = members.iter().map(|&i| self.credentials[i].public_key).collect();
        let position = members.iter().position(|&i| i == signer).unwrap();
        let message = feedback_message(course, content_id.as_bytes());
        let signature = sign_ring(
            course.as_bytes(),
            &message,
            &ring,
            position,
            &self.credentials[signer].secret,
            rng,
        )
        .unwrap();

        let ring_submission = RingSubmission {
            key_image: g1_to_words(&signature.key_image),
            challenges: signature.challenges.iter().map(fr_to_word).collect(),
            responses: signature.responses.iter().map(fr_to_word).collect(),
            public_keys_x: ring.iter().map(|p| g1_to_words(p)[0]).collect(),
            public_keys_y: ring.iter().map(|p| g1_to_words(p)[1]).collect(),
            smt_proofs: members
                .iter()
                .map(|&i| {
                    let path = self.tree.proof(&self.credentials[i].leaf_key).unwrap();
                    path.iter().map(fr_to_word).collect()
                })
                .collect(),
            leaf_keys: members
                .iter()
                .map(|&i| fr_to_word(&self.credentials[i].leaf_key))
                .collect(),
            leaf_values: members
                .iter()
                .map(|&i| self.credentials[i].status.to_word())
                .collect(),
        };

        FeedbackSubmission {
            course: *course,
            content_id: content_id.to_string(),
            proof: SubmissionProof::Ring(ring_submission),
        }
    }
}

pub fn ring_parts(submission: &mut FeedbackSubmission) -> &mut RingSubmission {
    match &mut submission.proof {
        SubmissionProof::Ring(ring) => ring,
        SubmissionProof::Zk(_) => panic!("expected a ring submission"),
    }
}

pub fn zk_parts(submission: &mut FeedbackSubmission) -> &mut ZkSubmission {
    match &mut submission.proof {
        SubmissionProof::Zk(zk) => zk,
        SubmissionProof::Ring(_) => panic!("expected a zk submission"),
    }
}

static ZK_KEYS: OnceLock<(ProvingKey<Bn254>, VerifyingKey<Bn254>)> = OnceLock::new();

pub fn zk_keys() -> &'static (ProvingKey<Bn254>, VerifyingKey<Bn254>) {
    ZK_KEYS.get_or_init(|| setup_feedback_circuit(&mut rng(0xfeed)).unwrap())
}

pub fn groth16_verifier() -> Arc<dyn PairingVerifier> {
    Arc::new(Groth16Verifier::new(&zk_keys().1).unwrap())
}

pub fn zk_statement(course: &CourseId, content_id: &str, root: &CertificateRoot, secret: Fr) -> FeedbackStatement {
    let course_fr = course_to_fr(course);
    FeedbackStatement {
        course: course_fr,
        nullifier: feedback_nullifier(secret, course_fr),
        root: certfeed_crypto::fr_from_word(&(*root).into()).unwrap(),
        content_binding: content_binding(content_id.as_bytes()),
        payload: Fr::from(42u64),
    }
}

/// zk submission proving `statement` with the shared test keys.
pub fn zk_submission_for(
    course: &CourseId,
    content_id: &str,
    statement: &FeedbackStatement,
    secret: Fr,
) -> FeedbackSubmission {
    let proof = prove_feedback(&zk_keys().0, secret, statement, &mut rng(7)).unwrap();
    let (a, b, c) = proof_to_words(&proof);
    FeedbackSubmission {
        course: *course,
        content_id: content_id.to_string(),
        proof: SubmissionProof::Zk(ZkSubmission {
            a,
            b,
            c,
            public_inputs: statement.public_inputs().iter().map(fr_to_word).collect(),
        }),
    }
}

pub fn zk_submission(course: &CourseId, content_id: &str, root: &CertificateRoot, secret: u64) -> FeedbackSubmission {
    let secret = Fr::from(secret);
    let statement = zk_statement(course, content_id, root, secret);
    zk_submission_for(course, content_id, &statement, secret)
}

pub struct MemoryHarness {
    pub controller: Arc<AdmissionController>,
    pub roots: Arc<MemoryRootRegistry>,
    pub ledger: Arc<MemoryLedger>,
}

pub fn memory_harness(verifier: Arc<dyn PairingVerifier>) -> MemoryHarness {
    let ledger = Arc::new(MemoryLedger::new());
    let roots = Arc::new(MemoryRootRegistry::new());
    let controller = Arc::new(AdmissionController::new(
        ledger.clone(),
        roots.clone(),
        verifier,
        AdmissionConfig::default(),
    ));
    MemoryHarness {
        controller,
        roots,
        ledger,
    }
}

impl MemoryHarness {
    pub fn publish(&self, course: &CourseId, root: CertificateRoot) {
        self.roots.publish(course, root).unwrap();
    }
}

pub fn bump(word: &Word) -> Word {
    let mut bytes = *word.as_bytes();
    bytes[31] ^= 1;
    Word::from_bytes(bytes)
}
