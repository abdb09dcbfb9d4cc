//! Conversions between 32-byte big-endian wire words and BN254 field
//! elements.

use ark_bn254::{Fq, Fr};
use ark_ff::{BigInteger, PrimeField};
use certfeed_types::{CourseId, RejectReason, Word, WORD_SIZE};
use sha3::{Digest, Keccak256};

pub fn field_to_be_bytes<F: PrimeField>(f: &F) -> [u8; WORD_SIZE] {
    let bytes = f.into_bigint().to_bytes_be();
    let mut out = [0u8; WORD_SIZE];
    let start = WORD_SIZE.saturating_sub(bytes.len());
    let skip = bytes.len().saturating_sub(WORD_SIZE);
    out[start..].copy_from_slice(&bytes[skip..]);
    out
}

/// Decodes a word that must already be reduced modulo the field order.
pub fn canonical_field<F: PrimeField>(bytes: &[u8; WORD_SIZE]) -> Option<F> {
    let f = F::from_be_bytes_mod_order(bytes);
    (field_to_be_bytes(&f) == *bytes).then_some(f)
}

pub fn fr_from_word(word: &Word) -> Result<Fr, RejectReason> {
    canonical_field(word.as_bytes()).ok_or(RejectReason::MalformedInput)
}

pub fn fq_from_word(word: &Word) -> Result<Fq, RejectReason> {
    canonical_field(word.as_bytes()).ok_or(RejectReason::MalformedInput)
}

pub fn fr_from_words(words: &[Word]) -> Result<Vec<Fr>, RejectReason> {
    words.iter().map(fr_from_word).collect()
}

pub fn fr_to_word(f: &Fr) -> Word {
    Word::from_bytes(field_to_be_bytes(f))
}

pub fn fq_to_word(f: &Fq) -> Word {
    Word::from_bytes(field_to_be_bytes(f))
}

/// Reduces arbitrary bytes (big-endian) into the scalar field.
pub fn fr_from_be_bytes(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Base-field coordinate reduced into the scalar field (`X mod r`).
pub fn fq_to_fr(f: &Fq) -> Fr {
    Fr::from_be_bytes_mod_order(&field_to_be_bytes(f))
}

pub fn course_to_fr(course: &CourseId) -> Fr {
    Fr::from_be_bytes_mod_order(course.as_bytes())
}

pub fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub fn keccak_to_fr(parts: &[&[u8]]) -> Fr {
    fr_from_be_bytes(&keccak256(parts))
}

/// Binds a content identifier to a scalar: `Keccak256(content) mod r`.
pub fn content_binding(content: &[u8]) -> Fr {
    keccak_to_fr(&[content])
}
