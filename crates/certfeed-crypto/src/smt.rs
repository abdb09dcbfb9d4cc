//! Sparse Merkle tree membership over Poseidon.
//!
//! Leaves hash as `H(key, value, 1)` and internal nodes as `H(left, right)`.
//! `siblings[0]` is the sibling nearest the root. The path through level
//! `i` follows bit `i` of the key, least significant bit first, with a set
//! bit placing the current node on the right.

use ark_bn254::{Fr, G1Affine};
use ark_ff::{BigInteger, One, PrimeField};
use certfeed_types::RejectReason;

use crate::field::fq_to_fr;
use crate::poseidon::{poseidon_hash2, poseidon_hash3};

/// Deepest path a 254-bit key can address.
pub const MAX_SMT_DEPTH: usize = 254;

pub fn leaf_hash(key: Fr, value: Fr) -> Fr {
    poseidon_hash3(key, value, Fr::one())
}

/// Leaf key of a credential public key: `H(X mod r, Y mod r)`.
pub fn credential_leaf_key(public_key: &G1Affine) -> Fr {
    poseidon_hash2(fq_to_fr(&public_key.x), fq_to_fr(&public_key.y))
}

fn key_bit(key: &Fr, level: usize) -> bool {
    key.into_bigint().get_bit(level)
}

pub fn compute_root(key: Fr, value: Fr, siblings: &[Fr]) -> Fr {
    let mut current = leaf_hash(key, value);
    for level in (0..siblings.len()).rev() {
        let sibling = siblings[level];
        current = if key_bit(&key, level) {
            poseidon_hash2(sibling, current)
        } else {
            poseidon_hash2(current, sibling)
        };
    }
    current
}

/// Checks that `(key, value)` is a leaf of the tree committed to by `root`.
pub fn verify_membership(root: Fr, key: Fr, value: Fr, siblings: &[Fr]) -> Result<(), RejectReason> {
    if siblings.is_empty() {
        return Err(RejectReason::EmptyProof);
    }
    if siblings.len() > MAX_SMT_DEPTH {
        return Err(RejectReason::MalformedInput);
    }
    if compute_root(key, value, siblings) != root {
        return Err(RejectReason::ProofMismatch);
    }
    Ok(())
}

/// Fixed-depth sparse Merkle tree for building certificate sets and
/// membership paths. Empty subtrees hash to zero.
#[cfg(any(test, feature = "prover"))]
#[derive(Debug, Clone)]
pub struct SparseMerkleTree {
    depth: usize,
    leaves: std::collections::BTreeMap<Vec<u8>, (Fr, Fr)>,
}

#[cfg(any(test, feature = "prover"))]
impl SparseMerkleTree {
    pub fn new(depth: usize) -> Self {
        assert!(depth > 0 && depth <= MAX_SMT_DEPTH, "depth out of range");
        Self {
            depth,
            leaves: std::collections::BTreeMap::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    fn path_of(&self, key: &Fr) -> Vec<u8> {
        (0..self.depth).map(|level| key_bit(key, level) as u8).collect()
    }

    /// Inserts or overwrites a leaf. Returns `false` if another key already
    /// occupies the same path at this depth.
    pub fn insert(&mut self, key: Fr, value: Fr) -> bool {
        let path = self.path_of(&key);
        match self.leaves.get(&path) {
            Some((existing, _)) if *existing != key => false,
            _ => {
                self.leaves.insert(path, (key, value));
                true
            }
        }
    }

    pub fn root(&self) -> Fr {
        let all: Vec<(&Vec<u8>, &(Fr, Fr))> = self.leaves.iter().collect();
        self.subtree_hash(&all, 0)
    }

    fn subtree_hash(&self, leaves: &[(&Vec<u8>, &(Fr, Fr))], level: usize) -> Fr {
        if leaves.is_empty() {
            return Fr::from(0u64);
        }
        if level == self.depth {
            let (key, value) = leaves[0].1;
            return leaf_hash(*key, *value);
        }
        let (right, left): (Vec<_>, Vec<_>) = leaves
            .iter()
            .copied()
            .partition(|(path, _)| path[level] == 1);
        poseidon_hash2(
            self.subtree_hash(&left, level + 1),
            self.subtree_hash(&right, level + 1),
        )
    }

    /// Sibling path for `key`, nearest-to-root first.
    pub fn proof(&self, key: &Fr) -> Option<Vec<Fr>> {
        let path = self.path_of(key);
        match self.leaves.get(&path) {
            Some((existing, _)) if existing == key => {}
            _ => return None,
        }

        let mut current: Vec<(&Vec<u8>, &(Fr, Fr))> = self.leaves.iter().collect();
        let mut siblings = Vec::with_capacity(self.depth);
        for level in 0..self.depth {
            let (same, other): (Vec<_>, Vec<_>) =
                current.into_iter().partition(|(p, _)| p[level] == path[level]);
            siblings.push(self.subtree_hash(&other, level + 1));
            current = same;
        }
        Some(siblings)
    }
}
