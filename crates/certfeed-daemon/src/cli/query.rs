use super::commands::{OutputFormat, PageArgs};
use super::utils::{parse_course, print_json};
use certfeed_daemon::api::{AllFeedbacksResponse, CourseFeedbacksResponse, CoursesResponse};
use certfeed_daemon::Daemon;
use certfeed_types::CertfeedResult;

pub fn list_feedbacks(daemon: &Daemon, course: &str, page: PageArgs, format: OutputFormat) -> CertfeedResult<()> {
    let course = parse_course(course)?;
    let controller = daemon.controller();
    let feedbacks = controller.feedbacks(&course, page.offset, page.limit)?;
    let total = controller.feedback_count(&course)?;

    match format {
        OutputFormat::Json => print_json(&CourseFeedbacksResponse {
            course,
            total,
            offset: page.offset,
            feedbacks,
        }),
        OutputFormat::Text => {
            println!("Course {} ({} feedback)", course, total);
            for (i, content) in feedbacks.iter().enumerate() {
                println!("  {:>6}  {}", page.offset + i as u64, content);
            }
            Ok(())
        }
    }
}

pub fn list_courses(daemon: &Daemon, page: PageArgs, format: OutputFormat) -> CertfeedResult<()> {
    let controller = daemon.controller();
    let courses = controller.courses(page.offset, page.limit)?;
    let total = controller.course_count()?;

    match format {
        OutputFormat::Json => print_json(&CoursesResponse {
            total,
            offset: page.offset,
            courses,
        }),
        OutputFormat::Text => {
            println!("{} registered course(s)", total);
            for course in &courses {
                println!("  {}", course);
            }
            Ok(())
        }
    }
}

pub fn list_all_feedbacks(daemon: &Daemon, page: PageArgs, format: OutputFormat) -> CertfeedResult<()> {
    let (courses, feedbacks) = daemon.controller().all_feedbacks(page.offset, page.limit)?;

    match format {
        OutputFormat::Json => print_json(&AllFeedbacksResponse { courses, feedbacks }),
        OutputFormat::Text => {
            for (course, entries) in courses.iter().zip(&feedbacks) {
                println!("{}", course);
                for content in entries {
                    println!("  {}", content);
                }
            }
            Ok(())
        }
    }
}
