//! Cascading email lookup for a single website.
//!
//! A run walks three levels, stopping at the first that finds an address:
//!
//! 1. the homepage over plain HTTP,
//! 2. the ranked contact/about pages linked from it, over plain HTTP,
//! 3. the homepage and the best contact pages rendered by a browser engine,
//!    when a [`RenderFetcher`] was supplied.
//!
//! Everything happens sequentially under one deadline. Transport failures
//! never escape: they become `website_error` (homepage unreachable) or just
//! skip the page at hand.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::PipelineConfig;
use crate::deadline::{Deadline, Expired};
use crate::entities::{EmailSource, Outcome, Target};
use crate::extractor::{PageScan, scan_page};
use crate::fetcher::{
    FetchError, HttpFetcher, RemoteRenderer, RenderFetcher, RetrySchedule, fetch_with_retry,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline cancelled before it started")]
    Cancelled,

    #[error("pipeline setup failed: {0}")]
    Setup(String),
}

/// Pipeline levels, entered in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Homepage,
    ContactPages,
    Browser,
}

enum Step {
    Next(Level),
    Done(Outcome),
}

/// State owned by one run and dropped when it ends.
struct RunState {
    homepage: Url,
    /// Base for resolving homepage links; the post-redirect homepage URL once
    /// the homepage has been fetched.
    base_url: Url,
    contact_pages: Vec<Url>,
    deadline: Deadline,
}

/// Reusable, read-only pipeline setup. Runs share nothing mutable, so one
/// instance can serve many concurrent runs.
pub struct EmailPipeline {
    config: PipelineConfig,
    fetcher: HttpFetcher,
    schedule: RetrySchedule,
    renderer: Option<Arc<dyn RenderFetcher>>,
}

impl EmailPipeline {
    /// Build a pipeline; without a renderer the browser level is skipped.
    pub fn new(
        config: PipelineConfig,
        renderer: Option<Arc<dyn RenderFetcher>>,
    ) -> Result<Self, PipelineError> {
        let fetcher = HttpFetcher::new(&config).map_err(|e| PipelineError::Setup(e.to_string()))?;
        let schedule = RetrySchedule::from_config(&config);

        Ok(Self {
            config,
            fetcher,
            schedule,
            renderer,
        })
    }

    /// Build a pipeline whose browser level, if any, goes through the
    /// rendering service named by `config.render_endpoint`.
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let renderer = match config.render_endpoint.as_deref() {
            Some(endpoint) => {
                let client = reqwest::Client::builder()
                    .timeout(config.global_timeout)
                    .build()
                    .map_err(|e| PipelineError::Setup(e.to_string()))?;
                let renderer: Arc<dyn RenderFetcher> =
                    Arc::new(RemoteRenderer::new(client, endpoint));
                Some(renderer)
            }
            None => None,
        };

        Self::new(config, renderer)
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Look up `target`'s email and write the result into it.
    pub async fn run(&self, target: &mut Target) -> Result<(), PipelineError> {
        self.run_with_cancel(target, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but `cancel` ends the run early. A token that
    /// is already cancelled is an error and leaves `target` untouched; a
    /// cancellation mid-run is treated like the deadline passing.
    #[instrument(skip_all, fields(website = %target.website))]
    pub async fn run_with_cancel(
        &self,
        target: &mut Target,
        cancel: CancellationToken,
    ) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let outcome = match Url::parse(target.website.trim()) {
            Ok(homepage) => {
                let mut state = RunState {
                    base_url: homepage.clone(),
                    homepage,
                    contact_pages: Vec::new(),
                    deadline: Deadline::after(self.config.global_timeout, cancel),
                };
                self.cascade(&mut state).await
            }
            Err(error) => {
                warn!(error = %error, "website is not a valid URL");
                Outcome::WebsiteError
            }
        };

        target.apply(outcome);
        info!(
            emails_found = target.emails.len(),
            status = %target.email_status,
            source = target.email_source.map(|s| s.as_str()).unwrap_or_default(),
            "email pipeline finished"
        );
        Ok(())
    }

    async fn cascade(&self, state: &mut RunState) -> Outcome {
        let mut level = Level::Homepage;
        loop {
            debug!(?level, "entering level");
            let step = match level {
                Level::Homepage => self.homepage_level(state).await,
                Level::ContactPages => self.contact_pages_level(state).await,
                Level::Browser => self.browser_level(state).await,
            };
            match step {
                Step::Next(next) => level = next,
                Step::Done(outcome) => return outcome,
            }
        }
    }

    async fn homepage_level(&self, state: &mut RunState) -> Step {
        let response = match fetch_with_retry(
            &self.fetcher,
            state.homepage.as_str(),
            self.config.homepage_retries,
            self.schedule,
            &state.deadline,
        )
        .await
        {
            Ok(response) => response,
            Err(error) => {
                // An unreachable homepage almost always means an unreachable host.
                warn!(error = %error, "homepage fetch failed");
                return Step::Done(Outcome::WebsiteError);
            }
        };

        state.base_url = response.url_final.clone();
        let scan = scan_page(
            response.body_utf8.as_deref(),
            &response.body_raw,
            &state.base_url,
            true,
        );
        if let Some(outcome) = found(&scan, EmailSource::Homepage) {
            return Step::Done(outcome);
        }

        if let Some(pages) = scan.contact_pages {
            debug!(count = pages.len(), "discovered contact pages");
            state.contact_pages = pages;
        }
        Step::Next(Level::ContactPages)
    }

    async fn contact_pages_level(&self, state: &mut RunState) -> Step {
        for page in &state.contact_pages {
            if state.deadline.is_expired() {
                return Step::Done(Outcome::NotFound);
            }

            let response = match fetch_with_retry(
                &self.fetcher,
                page.as_str(),
                self.config.contact_page_retries,
                self.schedule,
                &state.deadline,
            )
            .await
            {
                Ok(response) => response,
                Err(FetchError::DeadlineExceeded) => return Step::Done(Outcome::NotFound),
                Err(error) => {
                    warn!(page = %page, error = %error, "contact page fetch failed, skipping");
                    continue;
                }
            };

            let scan = scan_page(
                response.body_utf8.as_deref(),
                &response.body_raw,
                &response.url_final,
                false,
            );
            if let Some(outcome) = found(&scan, EmailSource::ContactPage) {
                return Step::Done(outcome);
            }
        }

        Step::Next(Level::Browser)
    }

    async fn browser_level(&self, state: &mut RunState) -> Step {
        let Some(renderer) = self.renderer.as_deref() else {
            return Step::Done(Outcome::NotFound);
        };
        if state.deadline.is_expired() {
            return Step::Done(Outcome::NotFound);
        }

        let Ok(rendered) = render_page(renderer, &state.homepage, &state.deadline).await else {
            return Step::Done(Outcome::NotFound);
        };
        if let Some(html) = rendered {
            let rediscover = state.contact_pages.is_empty();
            let scan = scan_page(Some(&html), html.as_bytes(), &state.base_url, rediscover);
            if let Some(outcome) = found(&scan, EmailSource::BrowserHomepage) {
                return Step::Done(outcome);
            }
            if let Some(pages) = scan.contact_pages {
                debug!(count = pages.len(), "discovered contact pages on rendered homepage");
                state.contact_pages = pages;
            }
        }

        for page in state
            .contact_pages
            .iter()
            .take(self.config.max_rendered_contact_pages)
        {
            if state.deadline.is_expired() {
                return Step::Done(Outcome::NotFound);
            }

            let Ok(rendered) = render_page(renderer, page, &state.deadline).await else {
                return Step::Done(Outcome::NotFound);
            };
            let Some(html) = rendered else {
                continue;
            };

            let scan = scan_page(Some(&html), html.as_bytes(), page, false);
            if let Some(outcome) = found(&scan, EmailSource::BrowserContactPage) {
                return Step::Done(outcome);
            }
        }

        Step::Done(Outcome::NotFound)
    }
}

/// Render `url`, turning render failures and empty documents into `None`.
/// Only the deadline is an error.
async fn render_page(
    renderer: &dyn RenderFetcher,
    url: &Url,
    deadline: &Deadline,
) -> Result<Option<String>, Expired> {
    match deadline.guard(renderer.render(url.as_str())).await? {
        Ok(html) if !html.trim().is_empty() => Ok(Some(html)),
        Ok(_) => {
            warn!(url = %url, "renderer returned an empty document");
            Ok(None)
        }
        Err(error) => {
            warn!(url = %url, error = %error, "render failed, skipping");
            Ok(None)
        }
    }
}

fn found(scan: &PageScan, source: EmailSource) -> Option<Outcome> {
    if scan.emails().is_empty() {
        return None;
    }
    debug!(
        source = source.as_str(),
        strategy = ?scan.extraction.strategy,
        count = scan.emails().len(),
        "emails found"
    );
    Some(Outcome::Found {
        emails: scan.emails().to_vec(),
        source,
    })
}

#[cfg(test)]
mod tests;
