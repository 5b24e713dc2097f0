use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::entities::{EmailStatus, Target};
use crate::pipeline::EmailPipeline;

/// Process one target end to end: gate it on its website, run the pipeline
/// and make sure a status is always recorded.
#[instrument(skip_all, fields(website = %target.website))]
pub async fn process_target(
    pipeline: &EmailPipeline,
    target: &mut Target,
    cancel: CancellationToken,
) {
    if target.website.trim().is_empty() {
        target.mark(EmailStatus::NoWebsite);
        info!("no website, skipping email lookup");
        return;
    }

    if !target.is_website_valid_for_email() {
        target.mark(EmailStatus::BlockedDomain);
        info!("website is not a business site, skipping email lookup");
        return;
    }

    info!("processing email pipeline");
    if let Err(error) = pipeline.run_with_cancel(target, cancel).await {
        warn!(error = %error, "email pipeline failed");
        target.mark(EmailStatus::WebsiteError);
    }

    info!(
        emails_found = target.emails.len(),
        status = %target.email_status,
        source = target.email_source.map(|s| s.as_str()).unwrap_or_default(),
        "email lookup completed"
    );
}
