use super::commands::{OutputFormat, RootsAction};
use super::utils::{parse_course, print_json};
use certfeed_daemon::api::{RootHistoryResponse, RootResponse};
use certfeed_daemon::Daemon;
use certfeed_types::{CertificateRoot, CertfeedError, CertfeedResult};
use std::str::FromStr;

pub fn handle_roots_command(daemon: &Daemon, action: &RootsAction, format: OutputFormat) -> CertfeedResult<()> {
    let roots = daemon.roots();

    match action {
        RootsAction::Publish { course, root } => {
            let course = parse_course(course)?;
            let root = CertificateRoot::from_str(root)
                .map_err(|e| CertfeedError::InvalidInput(format!("invalid root: {}", e)))?;
            let record = roots.publish(&course, root)?;
            daemon.flush()?;
            match format {
                OutputFormat::Json => print_json(&RootResponse::from_record(course, Some(record)))?,
                OutputFormat::Text => println!(
                    "Published root #{} for course {}: {}",
                    record.index, course, record.root
                ),
            }
        }
        RootsAction::Show { course } => {
            let course = parse_course(course)?;
            let response = RootResponse::from_record(course, roots.latest(&course)?);
            match format {
                OutputFormat::Json => print_json(&response)?,
                OutputFormat::Text => match response.index {
                    Some(index) => println!("{} (#{})", response.root, index),
                    None => println!("{} (no root published)", response.root),
                },
            }
        }
        RootsAction::History { course, page } => {
            let course = parse_course(course)?;
            let limit = page.limit.min(daemon.config().admission.max_page_size);
            let history = roots.history(&course, page.offset, limit)?;
            let total = roots.history_len(&course)?;
            match format {
                OutputFormat::Json => print_json(&RootHistoryResponse {
                    course,
                    total,
                    roots: history,
                })?,
                OutputFormat::Text => {
                    println!("Course {} ({} root(s))", course, total);
                    for record in &history {
                        let at = chrono::DateTime::from_timestamp(record.published_at, 0)
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| record.published_at.to_string());
                        println!("  #{:<4} {}  {}", record.index, record.root, at);
                    }
                }
            }
        }
    }
    Ok(())
}
