#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod constants;
mod content;
mod course;
mod credential;
mod error;
mod submission;
mod word;

pub use constants::*;
pub use content::ContentId;
pub use course::CourseId;
pub use credential::CredentialStatus;
pub use error::{CertfeedError, CertfeedResult, RejectReason};
pub use submission::{FeedbackSubmission, ProofMode, RingSubmission, SubmissionProof, ZkSubmission};
pub use word::{CertificateRoot, Nullifier, Word};
