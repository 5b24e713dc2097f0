use serde::{Deserialize, Serialize};
use std::fmt;

/// Substrings that mark a website URL as a social or review profile rather
/// than the business's own site.
const BLOCKED_WEBSITE_SUBSTRINGS: &[&str] = &[
    "facebook",
    "instagram",
    "twitter",
    "linkedin",
    "youtube",
    "tiktok",
    "pinterest",
    "yelp",
    "tripadvisor",
];

/// Outcome of an email lookup.
///
/// `Found`, `NotFound` and `WebsiteError` are written by the pipeline. The
/// remaining variants are assigned before a pipeline is ever constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[default]
    Pending,
    Found,
    NotFound,
    WebsiteError,
    NoWebsite,
    BlockedDomain,
    Skipped,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::WebsiteError => "website_error",
            Self::NoWebsite => "no_website",
            Self::BlockedDomain => "blocked_domain",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pipeline level produced the emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    Homepage,
    ContactPage,
    BrowserHomepage,
    BrowserContactPage,
}

impl EmailSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::ContactPage => "contact_page",
            Self::BrowserHomepage => "browser_homepage",
            Self::BrowserContactPage => "browser_contact_page",
        }
    }
}

impl fmt::Display for EmailSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one pipeline run, applied to a [`Target`] in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Non-empty, validated, deduplicated emails.
    Found {
        emails: Vec<String>,
        source: EmailSource,
    },
    NotFound,
    WebsiteError,
}

/// A business website whose contact email is being looked up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    pub website: String,
    pub emails: Vec<String>,
    pub email_status: EmailStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_source: Option<EmailSource>,
}

impl Target {
    pub fn new(website: impl Into<String>) -> Self {
        Self {
            website: website.into(),
            ..Self::default()
        }
    }

    /// Cheap gate checked before a pipeline is built for this target: the
    /// URL must be http(s) and must not point at a social or review platform.
    pub fn is_website_valid_for_email(&self) -> bool {
        let website = self.website.trim();
        if website.is_empty() {
            return false;
        }

        let lower = website.to_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            return false;
        }

        !BLOCKED_WEBSITE_SUBSTRINGS
            .iter()
            .any(|blocked| lower.contains(blocked))
    }

    /// Write the three lookup fields together so that `emails` is non-empty
    /// and `email_source` is set exactly when the status is `Found`.
    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Found { emails, source } if !emails.is_empty() => {
                self.emails = emails;
                self.email_status = EmailStatus::Found;
                self.email_source = Some(source);
            }
            Outcome::Found { .. } | Outcome::NotFound => {
                self.mark(EmailStatus::NotFound);
            }
            Outcome::WebsiteError => {
                self.mark(EmailStatus::WebsiteError);
            }
        }
    }

    /// Record a status that carries no emails.
    pub fn mark(&mut self, status: EmailStatus) {
        self.emails = Vec::new();
        self.email_status = status;
        self.email_source = None;
    }
}
