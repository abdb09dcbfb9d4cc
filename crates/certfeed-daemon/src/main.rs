mod cli;

use certfeed_daemon::config::{default_data_dir, LoggingConfig, CONFIG_FILE_NAME};
use certfeed_daemon::Daemon;
use certfeed_types::CertfeedResult;
use clap::Parser;
use cli::{
    handle_config_command, handle_roots_command, init_config, init_logging, list_all_feedbacks,
    list_courses, list_feedbacks, load_config, run_daemon, submit_file, Cli, Commands,
};

#[tokio::main]
async fn main() -> CertfeedResult<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));

    match &cli.command {
        Commands::Init { force } => {
            init_logging(&cli, &LoggingConfig::default())?;
            return init_config(&config_path, &data_dir, *force);
        }
        Commands::Config { action } => {
            init_logging(&cli, &LoggingConfig::default())?;
            return handle_config_command(action.as_ref(), &config_path, cli.format);
        }
        _ => {}
    }

    let config = load_config(&config_path, cli.data_dir.as_ref())?;
    init_logging(&cli, &config.logging)?;

    if let Commands::Run { pid_file } = &cli.command {
        return run_daemon(config, pid_file.clone()).await;
    }

    let daemon = Daemon::open(config)?;
    match &cli.command {
        Commands::Submit { file } => submit_file(&daemon, file, cli.format)?,
        Commands::Feedbacks { course, page } => list_feedbacks(&daemon, course, *page, cli.format)?,
        Commands::Courses { page } => list_courses(&daemon, *page, cli.format)?,
        Commands::AllFeedbacks { page } => list_all_feedbacks(&daemon, *page, cli.format)?,
        Commands::Roots { action } => handle_roots_command(&daemon, action, cli.format)?,
        Commands::Run { .. } | Commands::Init { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}
