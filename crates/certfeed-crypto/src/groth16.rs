//! Groth16 over BN254 behind a narrow pairing-verifier seam.
//!
//! `Ok(false)` means the primitive evaluated the proof and rejected it
//! (including proof points that are not on the curve). `Err` means the
//! primitive could not evaluate at all.

use std::path::Path;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use certfeed_types::{RejectReason, Word};
use thiserror::Error;
use tracing::{debug, info};

use crate::curve::{g1_to_words, g2_to_words, RawG1, RawG2};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("no verifying key configured")]
    NotConfigured,

    #[error("malformed verifying key: {0}")]
    MalformedVerifyingKey(String),

    #[error("verifying key expects {expected} public inputs, got {got}")]
    InputCount { expected: usize, got: usize },

    #[error("pairing evaluation failed: {0}")]
    Evaluation(String),
}

/// Proof points as submitted, before any curve validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofPoints {
    pub a: RawG1,
    pub b: RawG2,
    pub c: RawG1,
}

impl ProofPoints {
    /// Decodes EIP-197 calldata words. Non-canonical coordinates are
    /// malformed input; off-curve points are left for the verifier.
    pub fn from_words(
        a: &[Word; 2],
        b: &[[Word; 2]; 2],
        c: &[Word; 2],
    ) -> Result<Self, RejectReason> {
        Ok(Self {
            a: RawG1::from_words(a)?,
            b: RawG2::from_words(b)?,
            c: RawG1::from_words(c)?,
        })
    }

    pub fn from_proof(proof: &Proof<Bn254>) -> Self {
        Self {
            a: RawG1 { x: proof.a.x, y: proof.a.y },
            b: RawG2 { x: proof.b.x, y: proof.b.y },
            c: RawG1 { x: proof.c.x, y: proof.c.y },
        }
    }

    fn to_proof(self) -> Option<Proof<Bn254>> {
        Some(Proof {
            a: self.a.to_affine()?,
            b: self.b.to_affine()?,
            c: self.c.to_affine()?,
        })
    }
}

/// Calldata words `(a, b, c)` for a proof.
pub fn proof_to_words(proof: &Proof<Bn254>) -> ([Word; 2], [[Word; 2]; 2], [Word; 2]) {
    (g1_to_words(&proof.a), g2_to_words(&proof.b), g1_to_words(&proof.c))
}

pub trait PairingVerifier: Send + Sync {
    fn verify_pairing_proof(
        &self,
        proof: &ProofPoints,
        public_inputs: &[Fr],
    ) -> Result<bool, PrimitiveError>;
}

pub struct Groth16Verifier {
    pvk: PreparedVerifyingKey<Bn254>,
}

impl Groth16Verifier {
    pub fn new(vk: &VerifyingKey<Bn254>) -> Result<Self, PrimitiveError> {
        let pvk = Groth16::<Bn254>::process_vk(vk)
            .map_err(|e| PrimitiveError::MalformedVerifyingKey(e.to_string()))?;
        Ok(Self { pvk })
    }

    /// Arkworks compressed encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitiveError> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|e| PrimitiveError::MalformedVerifyingKey(e.to_string()))?;
        Self::new(&vk)
    }

    pub fn from_base64(s: &str) -> Result<Self, PrimitiveError> {
        let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, s.trim())
            .map_err(|e| PrimitiveError::MalformedVerifyingKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Loads a key file holding either raw compressed bytes or their base64.
    pub fn from_file(path: &Path) -> Result<Self, PrimitiveError> {
        let bytes = std::fs::read(path).map_err(|e| {
            PrimitiveError::MalformedVerifyingKey(format!("{}: {}", path.display(), e))
        })?;
        let verifier = match Self::from_bytes(&bytes) {
            Ok(v) => v,
            Err(raw_err) => match std::str::from_utf8(&bytes) {
                Ok(text) => Self::from_base64(text)?,
                Err(_) => return Err(raw_err),
            },
        };
        info!(
            path = %path.display(),
            inputs = verifier.num_public_inputs(),
            "Loaded Groth16 verifying key"
        );
        Ok(verifier)
    }

    pub fn num_public_inputs(&self) -> usize {
        self.pvk.vk.gamma_abc_g1.len().saturating_sub(1)
    }
}

pub fn verifying_key_to_bytes(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, PrimitiveError> {
    let mut bytes = Vec::new();
    vk.serialize_compressed(&mut bytes)
        .map_err(|e| PrimitiveError::MalformedVerifyingKey(e.to_string()))?;
    Ok(bytes)
}

impl PairingVerifier for Groth16Verifier {
    fn verify_pairing_proof(
        &self,
        proof: &ProofPoints,
        public_inputs: &[Fr],
    ) -> Result<bool, PrimitiveError> {
        let expected = self.num_public_inputs();
        if public_inputs.len() != expected {
            return Err(PrimitiveError::InputCount {
                expected,
                got: public_inputs.len(),
            });
        }

        let Some(proof) = proof.to_proof() else {
            debug!("Proof point not on curve");
            return Ok(false);
        };

        Groth16::<Bn254>::verify_with_processed_vk(&self.pvk, public_inputs, &proof)
            .map_err(|e| PrimitiveError::Evaluation(e.to_string()))
    }
}

/// Stand-in used when no verifying key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledVerifier;

impl PairingVerifier for DisabledVerifier {
    fn verify_pairing_proof(&self, _: &ProofPoints, _: &[Fr]) -> Result<bool, PrimitiveError> {
        Err(PrimitiveError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{feedback_nullifier, prove_feedback, setup_feedback_circuit};
    use crate::statement::FeedbackStatement;
    use ark_groth16::ProvingKey;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use std::sync::OnceLock;

    static KEYS: OnceLock<(ProvingKey<Bn254>, VerifyingKey<Bn254>)> = OnceLock::new();

    fn keys() -> &'static (ProvingKey<Bn254>, VerifyingKey<Bn254>) {
        KEYS.get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(11);
            setup_feedback_circuit(&mut rng).unwrap()
        })
    }

    fn fixture() -> (Groth16Verifier, Proof<Bn254>, Vec<Fr>) {
        let (pk, vk) = keys();
        let mut rng = StdRng::seed_from_u64(12);
        let secret = Fr::from(99u64);
        let course = Fr::from(5u64);
        let statement = FeedbackStatement {
            course,
            nullifier: feedback_nullifier(secret, course),
            root: Fr::from(1234u64),
            content_binding: Fr::from(77u64),
            payload: Fr::from(42u64),
        };
        let proof = prove_feedback(pk, secret, &statement, &mut rng).unwrap();
        (
            Groth16Verifier::new(vk).unwrap(),
            proof,
            statement.public_inputs().to_vec(),
        )
    }

    #[test]
    fn test_valid_and_wrong_inputs() {
        let (verifier, proof, mut inputs) = fixture();
        let points = ProofPoints::from_proof(&proof);
        assert_eq!(verifier.num_public_inputs(), 11);
        assert_eq!(verifier.verify_pairing_proof(&points, &inputs), Ok(true));

        inputs[10] = Fr::from(43u64);
        assert_eq!(verifier.verify_pairing_proof(&points, &inputs), Ok(false));
    }

    #[test]
    fn test_off_curve_point_is_invalid_not_error() {
        let (verifier, proof, inputs) = fixture();
        let mut points = ProofPoints::from_proof(&proof);
        points.a.x += ark_bn254::Fq::from(1u64);
        assert_eq!(verifier.verify_pairing_proof(&points, &inputs), Ok(false));
    }

    #[test]
    fn test_input_count_is_error() {
        let (verifier, proof, inputs) = fixture();
        let points = ProofPoints::from_proof(&proof);
        assert!(matches!(
            verifier.verify_pairing_proof(&points, &inputs[..10]),
            Err(PrimitiveError::InputCount { expected: 11, got: 10 })
        ));
    }

    #[test]
    fn test_key_bytes_roundtrip() {
        let (_, proof, inputs) = fixture();
        let bytes = verifying_key_to_bytes(&keys().1).unwrap();
        let loaded = Groth16Verifier::from_bytes(&bytes).unwrap();
        let points = ProofPoints::from_proof(&proof);
        assert_eq!(loaded.verify_pairing_proof(&points, &inputs), Ok(true));

        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &bytes);
        assert!(Groth16Verifier::from_base64(&encoded).is_ok());
        assert!(Groth16Verifier::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn test_disabled_verifier_errors() {
        let (_, proof, inputs) = fixture();
        assert_eq!(
            DisabledVerifier.verify_pairing_proof(&ProofPoints::from_proof(&proof), &inputs),
            Err(PrimitiveError::NotConfigured)
        );
    }

    #[test]
    fn test_calldata_words_roundtrip() {
        let (verifier, proof, inputs) = fixture();
        let (a, b, c) = proof_to_words(&proof);
        let points = ProofPoints::from_words(&a, &b, &c).unwrap();
        assert_eq!(points, ProofPoints::from_proof(&proof));
        assert_eq!(verifier.verify_pairing_proof(&points, &inputs), Ok(true));
    }
}
