use super::commands::{ConfigAction, OutputFormat};
use super::utils::print_json;
use certfeed_daemon::DaemonConfig;
use certfeed_types::CertfeedResult;
use std::path::Path;

pub fn handle_config_command(
    action: Option<&ConfigAction>,
    config_path: &Path,
    format: OutputFormat,
) -> CertfeedResult<()> {
    match action {
        None | Some(ConfigAction::Show) => {
            let config = DaemonConfig::load(config_path)?;
            match format {
                OutputFormat::Json => {
                    // the admin token is skipped on serialization
                    print_json(&config)?;
                }
                OutputFormat::Text => {
                    println!("Configuration file: {:?}", config_path);
                    println!("{}", config.redacted());
                }
            }
        }
        Some(ConfigAction::Validate) => {
            DaemonConfig::load(config_path)?;
            println!("Configuration at {:?} is valid", config_path);
        }
    }
    Ok(())
}
