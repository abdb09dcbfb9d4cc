//! BN254 point codecs and hash-to-curve.
//!
//! G1 points travel as `[x, y]` words; the identity is `[0, 0]` as in the
//! EVM precompiles. G2 points use the EIP-197 coordinate order
//! `[[x.c1, x.c0], [y.c1, y.c0]]`.

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{PrimeField, Zero};
use certfeed_types::{RejectReason, Word};

use crate::field::{field_to_be_bytes, fq_from_word, fq_to_word, keccak256};

const HASH_TO_CURVE_DOMAIN: &[u8] = b"certfeed.ring.h2c.v1";
const HASH_TO_CURVE_ATTEMPTS: u32 = 256;

/// G1 point with unvalidated coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawG1 {
    pub x: Fq,
    pub y: Fq,
}

/// G2 point with unvalidated coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawG2 {
    pub x: Fq2,
    pub y: Fq2,
}

impl RawG1 {
    pub fn from_words(words: &[Word; 2]) -> Result<Self, RejectReason> {
        Ok(Self {
            x: fq_from_word(&words[0])?,
            y: fq_from_word(&words[1])?,
        })
    }

    /// Lifts onto the curve, `None` if the coordinates are not a G1 point.
    pub fn to_affine(&self) -> Option<G1Affine> {
        if self.x.is_zero() && self.y.is_zero() {
            return Some(G1Affine::identity());
        }
        let point = G1Affine::new_unchecked(self.x, self.y);
        (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
    }
}

impl RawG2 {
    pub fn from_words(words: &[[Word; 2]; 2]) -> Result<Self, RejectReason> {
        let x = Fq2::new(fq_from_word(&words[0][1])?, fq_from_word(&words[0][0])?);
        let y = Fq2::new(fq_from_word(&words[1][1])?, fq_from_word(&words[1][0])?);
        Ok(Self { x, y })
    }

    pub fn to_affine(&self) -> Option<G2Affine> {
        if self.x.is_zero() && self.y.is_zero() {
            return Some(G2Affine::identity());
        }
        let point = G2Affine::new_unchecked(self.x, self.y);
        (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
    }
}

/// Decodes a ring key or key image. Off-curve points and the identity are
/// malformed.
pub fn decode_g1_strict(x: &Word, y: &Word) -> Result<G1Affine, RejectReason> {
    let raw = RawG1 {
        x: fq_from_word(x)?,
        y: fq_from_word(y)?,
    };
    match raw.to_affine() {
        Some(point) if !point.is_zero() => Ok(point),
        _ => Err(RejectReason::MalformedInput),
    }
}

pub fn g1_to_words(point: &G1Affine) -> [Word; 2] {
    if point.is_zero() {
        return [Word::zero(), Word::zero()];
    }
    [fq_to_word(&point.x), fq_to_word(&point.y)]
}

pub fn g2_to_words(point: &G2Affine) -> [[Word; 2]; 2] {
    if point.is_zero() {
        return [[Word::zero(); 2]; 2];
    }
    [
        [fq_to_word(&point.x.c1), fq_to_word(&point.x.c0)],
        [fq_to_word(&point.y.c1), fq_to_word(&point.y.c0)],
    ]
}

/// 64-byte `x || y` encoding used inside transcript hashes.
pub fn g1_transcript_bytes(point: &G1Affine) -> [u8; 64] {
    let mut out = [0u8; 64];
    if !point.is_zero() {
        out[..32].copy_from_slice(&field_to_be_bytes(&point.x));
        out[32..].copy_from_slice(&field_to_be_bytes(&point.y));
    }
    out
}

/// Try-and-increment hash of a public key into G1, scoped by `context`.
///
/// BN254 G1 has cofactor 1, so any point found on the curve is in the
/// prime-order group.
pub fn hash_to_g1(context: &[u8], point: &G1Affine) -> Option<G1Affine> {
    let encoded = g1_transcript_bytes(point);
    for counter in 0..HASH_TO_CURVE_ATTEMPTS {
        let digest = keccak256(&[
            HASH_TO_CURVE_DOMAIN,
            context,
            &encoded,
            &counter.to_be_bytes(),
        ]);
        let x = Fq::from_be_bytes_mod_order(&digest);
        if let Some(candidate) = G1Affine::get_point_from_x_unchecked(x, false) {
            if !candidate.is_zero() {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fr, G1Projective};
    use ark_ec::CurveGroup;

    fn point(k: u64) -> G1Affine {
        (G1Projective::from(G1Affine::generator()) * Fr::from(k)).into_affine()
    }

    #[test]
    fn test_g1_words_roundtrip() {
        let p = point(42);
        let words = g1_to_words(&p);
        assert_eq!(decode_g1_strict(&words[0], &words[1]).unwrap(), p);
    }

    #[test]
    fn test_identity_rejected_for_ring_keys() {
        let words = g1_to_words(&G1Affine::identity());
        assert_eq!(
            decode_g1_strict(&words[0], &words[1]),
            Err(RejectReason::MalformedInput)
        );
    }

    #[test]
    fn test_off_curve_rejected() {
        let p = point(3);
        let mut words = g1_to_words(&p);
        words[1] = Word::from_u64(5);
        assert!(decode_g1_strict(&words[0], &words[1]).is_err());
        assert!(RawG1::from_words(&words).unwrap().to_affine().is_none());
    }

    #[test]
    fn test_g2_eip197_order() {
        let g2 = G2Affine::generator();
        let words = g2_to_words(&g2);
        assert_eq!(words[0][1], fq_to_word(&g2.x.c0));
        let raw = RawG2::from_words(&words).unwrap();
        assert_eq!(raw.to_affine().unwrap(), g2);
    }

    #[test]
    fn test_hash_to_g1_is_scoped() {
        let p = point(7);
        let a = hash_to_g1(b"course-a", &p).unwrap();
        let b = hash_to_g1(b"course-b", &p).unwrap();
        assert!(a.is_on_curve());
        assert_ne!(a, b);
        assert_eq!(a, hash_to_g1(b"course-a", &p).unwrap());
    }
}
