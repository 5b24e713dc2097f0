use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

pub const MAX_CONTACT_PAGES: usize = 5;

/// URL path fragments, most contact-like first. The index of the first match
/// is the link's rank.
const CONTACT_PATH_PATTERNS: &[&str] = &[
    "/contact",
    "/contacts",
    "/contatti",
    "/kontakt",
    "/contacto",
    "/get-in-touch",
    "/reach-us",
    "/about",
    "/about-us",
    "/chi-siamo",
    "/impressum",
    "/who-we-are",
];

/// Anchor text phrases tried when the path says nothing.
const CONTACT_TEXT_PATTERNS: &[&str] = &[
    "contact",
    "contatti",
    "kontakt",
    "contacto",
    "chi siamo",
    "about us",
    "get in touch",
    "reach us",
    "impressum",
    "who we are",
];

/// Extensions of documents, images, archives and media that are never pages.
const SKIP_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "svg", "webp", "zip", "tar", "gz", "doc", "docx", "xls",
    "xlsx", "mp3", "mp4", "avi", "mov",
];

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Rank of a candidate page. Every path match sorts before every text match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Index into the path pattern list.
    Path(usize),
    /// Discovery order among all candidates.
    Text(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPageCandidate {
    pub url: Url,
    pub priority: Priority,
}

/// Same-site links on `document` that probably lead to a contact or about
/// page, best first, at most [`MAX_CONTACT_PAGES`].
pub fn discover_contact_pages(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut candidates: Vec<ContactPageCandidate> = Vec::new();
    let mut seen = HashSet::new();

    for anchor in document.select(&LINK_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(resolved) = resolve_link(href, base_url) else {
            continue;
        };
        if seen.contains(resolved.as_str()) {
            continue;
        }

        let path = resolved.path().to_lowercase();
        let priority = match CONTACT_PATH_PATTERNS
            .iter()
            .position(|pattern| path.contains(pattern))
        {
            Some(index) => Priority::Path(index),
            None => {
                let text = anchor.text().collect::<String>().trim().to_lowercase();
                if !CONTACT_TEXT_PATTERNS
                    .iter()
                    .any(|pattern| text.contains(pattern))
                {
                    continue;
                }
                Priority::Text(candidates.len())
            }
        };

        seen.insert(resolved.as_str().to_string());
        candidates.push(ContactPageCandidate {
            url: resolved,
            priority,
        });
    }

    // Stable, so equal ranks keep document order.
    candidates.sort_by_key(|candidate| candidate.priority);
    candidates
        .into_iter()
        .take(MAX_CONTACT_PAGES)
        .map(|candidate| candidate.url)
        .collect()
}

/// Resolve `href` against `base_url`, or `None` if the link cannot be a
/// same-site HTML page.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if href
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
    {
        return None;
    }

    let mut resolved = base_url.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    if resolved.host_str() != base_url.host_str()
        || resolved.port_or_known_default() != base_url.port_or_known_default()
    {
        return None;
    }

    let extension = resolved
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase());
    if extension.is_some_and(|ext| SKIP_EXTENSIONS.contains(&ext.as_str())) {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}
