pub mod candidates;
pub mod contact;
pub mod dedup;
pub mod validate;

#[cfg(test)]
mod tests;

pub use candidates::{Extraction, Strategy, extract_emails};
pub use contact::{MAX_CONTACT_PAGES, discover_contact_pages};
pub use dedup::{dedupe_emails, filter_valid};
pub use validate::is_valid_email;

use scraper::Html;
use url::Url;

/// What one page yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScan {
    pub extraction: Extraction,
    /// Ranked contact pages, present only when discovery was requested, the
    /// page produced no email and a document could be parsed.
    pub contact_pages: Option<Vec<Url>>,
}

impl PageScan {
    pub fn emails(&self) -> &[String] {
        &self.extraction.emails
    }
}

/// Parse a page once, extract emails and, if asked and nothing was found,
/// rank its contact-page links.
///
/// `text` is the decoded body, `None` when the bytes could not be decoded; in
/// that case only the raw bytes are scanned. The parsed document never leaves
/// this function.
pub fn scan_page(text: Option<&str>, raw: &[u8], base_url: &Url, discover: bool) -> PageScan {
    let document = text.map(Html::parse_document);
    let extraction = extract_emails(document.as_ref(), raw);

    let contact_pages = match &document {
        Some(document) if discover && extraction.emails.is_empty() => {
            Some(discover_contact_pages(document, base_url))
        }
        _ => None,
    };

    PageScan {
        extraction,
        contact_pages,
    }
}
