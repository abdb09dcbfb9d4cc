use super::commands::OutputFormat;
use super::utils::print_json;
use certfeed_daemon::api::SubmitResponse;
use certfeed_daemon::Daemon;
use certfeed_types::{CertfeedError, CertfeedResult, FeedbackSubmission};
use serde_json::error::Category;
use std::io::Read;
use std::path::Path;

fn read_submission(daemon: &Daemon, file: &Path) -> CertfeedResult<FeedbackSubmission> {
    let mut raw = String::new();
    if file.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| CertfeedError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
    } else {
        raw = std::fs::read_to_string(file)
            .map_err(|e| CertfeedError::InvalidInput(format!("Failed to read {:?}: {}", file, e)))?;
    }
    serde_json::from_str(&raw).map_err(|e| match e.classify() {
        Category::Data => daemon.controller().reject_undecodable(&e.to_string()),
        _ => CertfeedError::InvalidInput(format!("Malformed submission: {}", e)),
    })
}

pub fn submit_file(daemon: &Daemon, file: &Path, format: OutputFormat) -> CertfeedResult<()> {
    let submission = read_submission(daemon, file)?;
    let admitted = daemon.controller().submit(submission)?;
    daemon.flush()?;

    match format {
        OutputFormat::Json => print_json(&SubmitResponse {
            course: admitted.course,
            index: admitted.index,
            mode: admitted.mode,
        }),
        OutputFormat::Text => {
            println!(
                "Admitted {:?} feedback #{} for course {}",
                admitted.mode, admitted.index, admitted.course
            );
            Ok(())
        }
    }
}
