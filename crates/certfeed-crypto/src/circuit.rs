//! Reference feedback circuit for building zk fixtures.
//!
//! Constraints: `secret * secret = nullifier - course`, and every other
//! public input `x_j` is tied to the witness through `x_j * secret = aux_j`.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_relations::lc;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use certfeed_types::FEEDBACK_PUBLIC_INPUTS;

use crate::groth16::PrimitiveError;
use crate::statement::{FeedbackStatement, SLOT_COURSE, SLOT_NULLIFIER};

/// Nullifier the reference circuit accepts for `secret` in `course`.
pub fn feedback_nullifier(secret: Fr, course: Fr) -> Fr {
    secret * secret + course
}

#[derive(Clone)]
pub struct FeedbackCircuit {
    pub secret: Fr,
    pub public_inputs: [Fr; FEEDBACK_PUBLIC_INPUTS],
}

impl FeedbackCircuit {
    pub fn blank() -> Self {
        Self {
            secret: Fr::from(0u64),
            public_inputs: [Fr::from(0u64); FEEDBACK_PUBLIC_INPUTS],
        }
    }
}

impl ConstraintSynthesizer<Fr> for FeedbackCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let mut inputs = Vec::with_capacity(FEEDBACK_PUBLIC_INPUTS);
        for value in self.public_inputs {
            inputs.push(cs.new_input_variable(|| Ok(value))?);
        }
        let secret = cs.new_witness_variable(|| Ok(self.secret))?;

        cs.enforce_constraint(
            lc!() + secret,
            lc!() + secret,
            lc!() + inputs[SLOT_NULLIFIER] - inputs[SLOT_COURSE],
        )?;

        for (j, input) in inputs.iter().enumerate() {
            if j == SLOT_NULLIFIER {
                continue;
            }
            let product = self.public_inputs[j] * self.secret;
            let aux = cs.new_witness_variable(|| Ok(product))?;
            cs.enforce_constraint(lc!() + *input, lc!() + secret, lc!() + aux)?;
        }

        Ok(())
    }
}

pub fn setup_feedback_circuit<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), PrimitiveError> {
    Groth16::<Bn254>::circuit_specific_setup(FeedbackCircuit::blank(), rng)
        .map_err(|e| PrimitiveError::Evaluation(e.to_string()))
}

pub fn prove_feedback<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bn254>,
    secret: Fr,
    statement: &FeedbackStatement,
    rng: &mut R,
) -> Result<Proof<Bn254>, PrimitiveError> {
    let circuit = FeedbackCircuit {
        secret,
        public_inputs: statement.public_inputs(),
    };
    Groth16::<Bn254>::prove(pk, circuit, rng).map_err(|e| PrimitiveError::Evaluation(e.to_string()))
}
