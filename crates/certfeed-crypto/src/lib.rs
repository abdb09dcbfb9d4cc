#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod curve;
pub mod field;
pub mod groth16;
pub mod poseidon;
pub mod ring;
pub mod smt;
pub mod statement;

#[cfg(any(test, feature = "prover"))]
pub mod circuit;

pub use ark_bn254::{Fq, Fr, G1Affine};
pub use curve::{decode_g1_strict, g1_to_words, g2_to_words, hash_to_g1, RawG1, RawG2};
pub use field::{
    content_binding, course_to_fr, fq_from_word, fr_from_word, fr_from_words, fr_to_word,
    keccak256,
};
pub use groth16::{
    proof_to_words, verifying_key_to_bytes, DisabledVerifier, Groth16Verifier, PairingVerifier,
    PrimitiveError, ProofPoints,
};
pub use poseidon::{poseidon_hash, poseidon_hash2, poseidon_hash3};
pub use ring::{feedback_message, key_image_nullifier, ring_digest, verify_ring, RingSignature};
pub use smt::{compute_root, credential_leaf_key, leaf_hash, verify_membership, MAX_SMT_DEPTH};
pub use statement::FeedbackStatement;

#[cfg(any(test, feature = "prover"))]
pub use circuit::{feedback_nullifier, prove_feedback, setup_feedback_circuit, FeedbackCircuit};
#[cfg(any(test, feature = "prover"))]
pub use ring::{sign_ring, RingSecretKey};
#[cfg(any(test, feature = "prover"))]
pub use smt::SparseMerkleTree;

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
