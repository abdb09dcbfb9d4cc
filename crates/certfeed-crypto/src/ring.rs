//! Linkable ring signatures (AOS/LSAG) over BN254 G1.
//!
//! For every member `i` the verifier recomputes
//! `L_i = r_i*G + c_i*P_i` and `R_i = r_i*H_p(ctx, P_i) + c_i*I` and requires
//! `c_{i+1 mod n} = Keccak(domain || message || ring_digest || L_i || R_i) mod r`.
//! The key image `I = x*H_p(ctx, P)` depends only on the signer's key and the
//! context, so one key signs at most one linkable tag per context no matter
//! which ring it hides in.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup};
use certfeed_types::{CourseId, RejectReason};
use tracing::trace;

use crate::curve::{g1_transcript_bytes, hash_to_g1};
use crate::field::{keccak256, keccak_to_fr};

const CHALLENGE_DOMAIN: &[u8] = b"certfeed.ring.challenge.v1";
const MESSAGE_DOMAIN: &[u8] = b"certfeed.feedback.v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSignature {
    pub key_image: G1Affine,
    pub challenges: Vec<Fr>,
    pub responses: Vec<Fr>,
}

/// Message signed for a feedback submission.
pub fn feedback_message(course: &CourseId, content_id: &[u8]) -> [u8; 32] {
    keccak256(&[MESSAGE_DOMAIN, course.as_bytes(), content_id])
}

/// Linking tag of a key image: `Keccak(I.x || I.y) mod r`.
pub fn key_image_nullifier(key_image: &G1Affine) -> Fr {
    keccak_to_fr(&[&g1_transcript_bytes(key_image)])
}

/// Digest of the ring as a set: keys are hashed in sorted order.
pub fn ring_digest(ring: &[G1Affine]) -> [u8; 32] {
    let mut encoded: Vec<[u8; 64]> = ring.iter().map(g1_transcript_bytes).collect();
    encoded.sort_unstable();
    let parts: Vec<&[u8]> = encoded.iter().map(|e| e.as_slice()).collect();
    keccak256(&parts)
}

fn challenge(message: &[u8; 32], digest: &[u8; 32], l: &G1Projective, r: &G1Projective) -> Fr {
    let l = g1_transcript_bytes(&l.into_affine());
    let r = g1_transcript_bytes(&r.into_affine());
    keccak_to_fr(&[CHALLENGE_DOMAIN, message, digest, &l, &r])
}

fn has_duplicates(ring: &[G1Affine]) -> bool {
    let mut encoded: Vec<[u8; 64]> = ring.iter().map(g1_transcript_bytes).collect();
    encoded.sort_unstable();
    encoded.windows(2).any(|w| w[0] == w[1])
}

/// Verifies `signature` over `message` by one of `ring`, returning the
/// signer's nullifier.
pub fn verify_ring(
    context: &[u8],
    message: &[u8; 32],
    ring: &[G1Affine],
    signature: &RingSignature,
) -> Result<Fr, RejectReason> {
    let n = ring.len();
    if n == 0 || signature.challenges.is_empty() || signature.responses.is_empty() {
        return Err(RejectReason::EmptyProof);
    }
    if signature.challenges.len() != n || signature.responses.len() != n {
        return Err(RejectReason::MalformedInput);
    }
    if signature.key_image.is_zero() || ring.iter().any(|p| p.is_zero()) || has_duplicates(ring) {
        return Err(RejectReason::MalformedInput);
    }

    let digest = ring_digest(ring);
    let generator = G1Affine::generator();
    let image = signature.key_image;

    for (i, member) in ring.iter().enumerate() {
        let hp = hash_to_g1(context, member).ok_or(RejectReason::MalformedInput)?;
        let c = signature.challenges[i];
        let r = signature.responses[i];

        let l = generator * r + *member * c;
        let rr = hp * r + image * c;
        if challenge(message, &digest, &l, &rr) != signature.challenges[(i + 1) % n] {
            trace!(member = i, "ring chain broken");
            return Err(RejectReason::WrongSignature);
        }
    }

    Ok(key_image_nullifier(&image))
}

#[cfg(any(test, feature = "prover"))]
pub use signing::*;

#[cfg(any(test, feature = "prover"))]
mod signing {
    use super::*;
    use ark_std::{rand::Rng, UniformRand};
    use zeroize::{Zeroize, ZeroizeOnDrop};

    /// Credential secret scalar.
    #[derive(Clone, Zeroize, ZeroizeOnDrop)]
    pub struct RingSecretKey {
        scalar: Fr,
    }

    impl RingSecretKey {
        pub fn new(scalar: Fr) -> Self {
            Self { scalar }
        }

        pub fn random<R: Rng>(rng: &mut R) -> Self {
            Self::new(Fr::rand(rng))
        }

        pub fn public_key(&self) -> G1Affine {
            (G1Affine::generator() * self.scalar).into_affine()
        }

        pub fn key_image(&self, context: &[u8]) -> Option<G1Affine> {
            let hp = hash_to_g1(context, &self.public_key())?;
            Some((hp * self.scalar).into_affine())
        }
    }

    pub fn sign_ring<R: Rng>(
        context: &[u8],
        message: &[u8; 32],
        ring: &[G1Affine],
        signer: usize,
        secret: &RingSecretKey,
        rng: &mut R,
    ) -> Result<RingSignature, RejectReason> {
        let n = ring.len();
        if signer >= n || ring[signer] != secret.public_key() {
            return Err(RejectReason::MalformedInput);
        }

        let digest = ring_digest(ring);
        let generator = G1Affine::generator();
        let hs = hash_to_g1(context, &ring[signer]).ok_or(RejectReason::MalformedInput)?;
        let image = (hs * secret.scalar).into_affine();

        let mut challenges = vec![Fr::from(0u64); n];
        let mut responses = vec![Fr::from(0u64); n];

        let mut alpha = Fr::rand(rng);
        challenges[(signer + 1) % n] = challenge(message, &digest, &(generator * alpha), &(hs * alpha));

        let mut i = (signer + 1) % n;
        while i != signer {
            let hp = hash_to_g1(context, &ring[i]).ok_or(RejectReason::MalformedInput)?;
            let r = Fr::rand(rng);
            responses[i] = r;
            let l = generator * r + ring[i] * challenges[i];
            let rr = hp * r + image * challenges[i];
            challenges[(i + 1) % n] = challenge(message, &digest, &l, &rr);
            i = (i + 1) % n;
        }

        responses[signer] = alpha - challenges[signer] * secret.scalar;
        alpha.zeroize();

        Ok(RingSignature {
            key_image: image,
            challenges,
            responses,
        })
    }
}
