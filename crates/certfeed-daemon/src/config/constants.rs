pub use certfeed_types::{
    DEFAULT_MAX_CONTENT_ID_LEN, DEFAULT_MAX_PAGE_SIZE, DEFAULT_MAX_RING_SIZE,
    FEEDBACK_PUBLIC_INPUTS,
};

pub const DEFAULT_API_PORT: u16 = 8645;

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DATABASE_DIR_NAME: &str = "ledger";
