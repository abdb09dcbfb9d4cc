mod commands;
mod config_cmd;
mod init;
mod query;
mod roots;
mod run;
mod submit;
mod utils;

pub use commands::{Cli, Commands};
pub use config_cmd::handle_config_command;
pub use init::init_config;
pub use query::{list_all_feedbacks, list_courses, list_feedbacks};
pub use roots::handle_roots_command;
pub use run::run_daemon;
pub use submit::submit_file;
pub use utils::{init_logging, load_config};
