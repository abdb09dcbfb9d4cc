use certfeed_daemon::DaemonConfig;
use certfeed_types::{CertfeedError, CertfeedResult};
use std::path::Path;

pub fn init_config(config_path: &Path, data_dir: &Path, force: bool) -> CertfeedResult<()> {
    if config_path.exists() && !force {
        return Err(CertfeedError::Config(format!(
            "Configuration already exists at {:?}. Use --force to overwrite.",
            config_path
        )));
    }

    std::fs::create_dir_all(data_dir)
        .map_err(|e| CertfeedError::Config(format!("Failed to create data directory: {}", e)))?;

    let config = DaemonConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    config.save(config_path)?;

    println!();
    println!("Configuration written to {:?}", config_path);
    println!("Data directory:          {:?}", data_dir);
    println!();
    println!("Next steps:");
    println!("  1. Set security.admin_token to enable root publication");
    println!("  2. Set verifier.verifying_key to accept zk proofs");
    println!("  3. Start the daemon with 'certfeed run'");
    println!();

    Ok(())
}
