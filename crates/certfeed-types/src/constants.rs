pub const COURSE_ID_SIZE: usize = 20;

pub const WORD_SIZE: usize = 32;

/// Public inputs expected by the feedback circuit.
pub const FEEDBACK_PUBLIC_INPUTS: usize = 11;

pub const DEFAULT_MAX_CONTENT_ID_LEN: usize = 512;

pub const DEFAULT_MAX_RING_SIZE: usize = 64;

pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;
