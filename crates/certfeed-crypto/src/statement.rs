//! Public statement of the feedback circuit.

use ark_bn254::Fr;
use ark_ff::Zero;
use certfeed_types::FEEDBACK_PUBLIC_INPUTS;

pub const SLOT_COURSE: usize = 0;
pub const SLOT_NULLIFIER: usize = 1;
pub const SLOT_ROOT: usize = 2;
pub const SLOT_CONTENT: usize = 3;
pub const RESERVED_SLOTS: std::ops::Range<usize> = 4..10;
pub const SLOT_PAYLOAD: usize = 10;

/// What a zk submission claims: a credential under `root` produced
/// `nullifier` for `course` and is posting the content bound by
/// `content_binding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackStatement {
    pub course: Fr,
    pub nullifier: Fr,
    pub root: Fr,
    pub content_binding: Fr,
    pub payload: Fr,
}

impl FeedbackStatement {
    pub fn public_inputs(&self) -> [Fr; FEEDBACK_PUBLIC_INPUTS] {
        let mut inputs = [Fr::zero(); FEEDBACK_PUBLIC_INPUTS];
        inputs[SLOT_COURSE] = self.course;
        inputs[SLOT_NULLIFIER] = self.nullifier;
        inputs[SLOT_ROOT] = self.root;
        inputs[SLOT_CONTENT] = self.content_binding;
        inputs[SLOT_PAYLOAD] = self.payload;
        inputs
    }

    /// Reads a statement back out of a public-input vector, `None` if the
    /// length is wrong or a reserved slot is set.
    pub fn from_public_inputs(inputs: &[Fr]) -> Option<Self> {
        if inputs.len() != FEEDBACK_PUBLIC_INPUTS {
            return None;
        }
        if inputs[RESERVED_SLOTS].iter().any(|f| !f.is_zero()) {
            return None;
        }
        Some(Self {
            course: inputs[SLOT_COURSE],
            nullifier: inputs[SLOT_NULLIFIER],
            root: inputs[SLOT_ROOT],
            content_binding: inputs[SLOT_CONTENT],
            payload: inputs[SLOT_PAYLOAD],
        })
    }
}
