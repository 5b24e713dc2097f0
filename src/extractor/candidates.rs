use crate::extractor::dedup::filter_valid;
use linkify::{LinkFinder, LinkKind};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static HIDDEN_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script, style, noscript").unwrap());

const MAILTO_SCHEME: &str = "mailto:";

/// Elements whose boundaries separate words in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td",
    "th", "title", "tr", "ul",
];

/// Which of the three strategies produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Mailto,
    VisibleText,
    RawBytes,
}

/// Validated, deduplicated emails plus the strategy that found them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub emails: Vec<String>,
    pub strategy: Option<Strategy>,
}

/// Run the strategies in order and stop at the first that yields a valid
/// address: `mailto:` links, then visible text, then the raw bytes. With no
/// document only the raw bytes are scanned.
pub fn extract_emails(document: Option<&Html>, raw: &[u8]) -> Extraction {
    if let Some(document) = document {
        let emails = filter_valid(mailto_candidates(document));
        if !emails.is_empty() {
            return Extraction {
                emails,
                strategy: Some(Strategy::Mailto),
            };
        }

        let emails = filter_valid(find_emails(&visible_text(document)));
        if !emails.is_empty() {
            return Extraction {
                emails,
                strategy: Some(Strategy::VisibleText),
            };
        }
    }

    let emails = filter_valid(find_emails(&String::from_utf8_lossy(raw)));
    let strategy = (!emails.is_empty()).then_some(Strategy::RawBytes);
    Extraction { emails, strategy }
}

/// Addresses named by `mailto:` links, without the scheme or query string.
fn mailto_candidates(document: &Html) -> Vec<String> {
    let mut candidates = Vec::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let Some(scheme) = href.get(..MAILTO_SCHEME.len()) else {
            continue;
        };
        if !scheme.eq_ignore_ascii_case(MAILTO_SCHEME) {
            continue;
        }

        let target = &href[MAILTO_SCHEME.len()..];
        let addresses = target.split('?').next().unwrap_or_default();
        candidates.extend(
            addresses
                .split(',')
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string),
        );
    }

    candidates
}

/// Text of the document with script, style and noscript content removed.
/// Inline text runs are joined as-is so an address split across inline tags
/// stays whole; block elements are separated by a space.
fn visible_text(document: &Html) -> String {
    let mut working = document.clone();
    let hidden: Vec<_> = working
        .select(&HIDDEN_SELECTOR)
        .map(|element| element.id())
        .collect();
    for id in hidden {
        if let Some(mut node) = working.tree.get_mut(id) {
            node.detach();
        }
    }

    let mut text = String::new();
    push_text(working.root_element(), &mut text);
    text
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    let block = BLOCK_ELEMENTS.contains(&element.value().name());
    if block {
        out.push(' ');
    }
    for child in element.children() {
        match child.value() {
            Node::Text(fragment) => out.push_str(fragment),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_text(child, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push(' ');
    }
}

/// Email-shaped substrings of `text`; the domain must contain a dot.
pub fn find_emails(text: &str) -> Vec<String> {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Email]);

    finder
        .links(text)
        .map(|link| {
            let found = link.as_str();
            match found.get(..MAILTO_SCHEME.len()) {
                Some(scheme) if scheme.eq_ignore_ascii_case(MAILTO_SCHEME) => {
                    found[MAILTO_SCHEME.len()..].to_string()
                }
                _ => found.to_string(),
            }
        })
        .collect()
}
