use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "certfeed")]
#[command(version = BUILD_VERSION)]
#[command(about = "Certfeed - anonymous course feedback admission daemon")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'd', long, global = true, value_name = "DIR", env = "CERTFEED_DATA_DIR", help = "Data directory path")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text", help = "Output format")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the daemon")]
    #[command(long_about = "Open the ledger, load the verifying key and serve the HTTP API until interrupted.")]
    Run {
        #[arg(long, value_name = "FILE", help = "Write PID to file")]
        pid_file: Option<PathBuf>,
    },

    #[command(about = "Write a default configuration")]
    Init {
        #[arg(short, long, help = "Overwrite existing configuration")]
        force: bool,
    },

    #[command(about = "Admit a feedback submission from a JSON file")]
    #[command(long_about = "Run a FeedbackSubmission through the admission controller against the local ledger.\n\nThe daemon must not be running on the same data directory.")]
    Submit {
        #[arg(value_name = "FILE", help = "Submission JSON (`-` for stdin)")]
        file: PathBuf,
    },

    #[command(about = "List feedback for a course")]
    Feedbacks {
        #[arg(help = "Course id (0x-prefixed hex)")]
        course: String,
        #[command(flatten)]
        page: PageArgs,
    },

    #[command(about = "List registered courses")]
    Courses {
        #[command(flatten)]
        page: PageArgs,
    },

    #[command(about = "List every feedback, grouped by course")]
    AllFeedbacks {
        #[command(flatten)]
        page: PageArgs,
    },

    #[command(about = "Manage certificate roots")]
    Roots {
        #[command(subcommand)]
        action: RootsAction,
    },

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(clap::Args, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0, help = "Entries to skip")]
    pub offset: u64,
    #[arg(long, default_value_t = 100, help = "Maximum entries to return")]
    pub limit: u64,
}

#[derive(Subcommand)]
pub enum RootsAction {
    #[command(about = "Publish a new certificate root for a course")]
    Publish {
        course: String,
        #[arg(help = "Root as 0x-prefixed hex")]
        root: String,
    },
    #[command(about = "Show the latest root of a course")]
    Show { course: String },
    #[command(about = "Show a course's root history")]
    History {
        course: String,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Validate configuration")]
    Validate,
}
