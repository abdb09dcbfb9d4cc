//! Poseidon hash over the BN254 scalar field.
//!
//! Every SMT leaf, SMT node and credential leaf key goes through this module
//! so that all callers agree on one parameter set:
//! - Width 3 (rate 2, capacity 1)
//! - 8 full rounds, 57 partial rounds
//! - S-box x^5
//! - Grain LFSR round constants (arkworks `find_poseidon_ark_and_mds`)
//!
//! Output is the first element squeezed from the sponge.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use std::sync::OnceLock;

static POSEIDON_CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    POSEIDON_CONFIG.get_or_init(|| {
        let rate = 2;
        let alpha = 5u64;
        let full_rounds = 8;
        let partial_rounds = 57;
        let field_bits = 254;

        let (ark, mds) =
            find_poseidon_ark_and_mds::<Fr>(field_bits, rate, full_rounds, partial_rounds, 0);

        PoseidonConfig {
            full_rounds: full_rounds as usize,
            partial_rounds: partial_rounds as usize,
            alpha,
            ark,
            mds,
            rate,
            capacity: 1,
        }
    })
}

pub fn poseidon_hash(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    for input in inputs {
        sponge.absorb(input);
    }
    let output: Vec<Fr> = sponge.squeeze_field_elements(1);
    output[0]
}

/// Internal SMT node.
pub fn poseidon_hash2(left: Fr, right: Fr) -> Fr {
    poseidon_hash(&[left, right])
}

/// SMT leaf: `H(key, value, 1)`.
pub fn poseidon_hash3(a: Fr, b: Fr, c: Fr) -> Fr {
    poseidon_hash(&[a, b, c])
}
