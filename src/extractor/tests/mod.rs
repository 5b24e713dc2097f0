use url::Url;

use crate::extractor::{Strategy, scan_page};

fn base() -> Url {
    Url::parse("https://www.trattoria-roma.it/").unwrap()
}

const HOMEPAGE_WITHOUT_EMAIL: &str = r#"<!DOCTYPE html>
<html lang="it">
<head>
  <title>Trattoria Roma</title>
  <script src="/js/analytics.js"></script>
  <script>window.__SENTRY__ = { dsn: "https://abc123@sentry.io/42" };</script>
</head>
<body>
  <nav>
    <a href="/">Home</a>
    <a href="/menu">Menu</a>
    <a href="/chi-siamo">Chi siamo</a>
    <a href="/contatti">Contatti</a>
    <a href="https://www.facebook.com/trattoriaroma">Facebook</a>
    <a href="/menu.pdf">Scarica il menu</a>
  </nav>
  <main><h1>Benvenuti</h1><p>Cucina romana dal 1962.</p></main>
</body>
</html>"#;

#[test]
fn test_homepage_without_email_yields_contact_pages() {
    let scan = scan_page(
        Some(HOMEPAGE_WITHOUT_EMAIL),
        HOMEPAGE_WITHOUT_EMAIL.as_bytes(),
        &base(),
        true,
    );

    assert!(scan.emails().is_empty());
    let pages: Vec<String> = scan
        .contact_pages
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(
        pages,
        vec![
            "https://www.trattoria-roma.it/contatti",
            "https://www.trattoria-roma.it/chi-siamo",
        ]
    );
}

#[test]
fn test_found_email_skips_discovery() {
    let html = r#"<html><body>
        <a href="/contatti">Contatti</a>
        <footer>Prenotazioni: prenota@trattoria-roma.it</footer>
    </body></html>"#;

    let scan = scan_page(Some(html), html.as_bytes(), &base(), true);
    assert_eq!(scan.emails(), ["prenota@trattoria-roma.it"]);
    assert_eq!(scan.extraction.strategy, Some(Strategy::VisibleText));
    assert!(scan.contact_pages.is_none());
}

#[test]
fn test_discovery_not_requested() {
    let scan = scan_page(
        Some(HOMEPAGE_WITHOUT_EMAIL),
        HOMEPAGE_WITHOUT_EMAIL.as_bytes(),
        &base(),
        false,
    );
    assert!(scan.contact_pages.is_none());
}

#[test]
fn test_undecodable_body_uses_raw_bytes_only() {
    let raw = b"<html><body>\xff\xfe<a href=\"/contact\">x</a> info@trattoria-roma.it</body></html>";

    let scan = scan_page(None, raw, &base(), true);
    assert_eq!(scan.emails(), ["info@trattoria-roma.it"]);
    assert_eq!(scan.extraction.strategy, Some(Strategy::RawBytes));
    assert!(scan.contact_pages.is_none());
}

#[test]
fn test_malformed_html() {
    let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>Write to staff@broken-site.com";

    let scan = scan_page(Some(html), html.as_bytes(), &base(), true);
    assert_eq!(scan.emails(), ["staff@broken-site.com"]);
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use crate::extractor::{MAX_CONTACT_PAGES, dedupe_emails, discover_contact_pages, is_valid_email};
    use proptest::prelude::*;
    use scraper::Html;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn test_scan_never_panics(html in ".*") {
            let _ = scan_page(Some(&html), html.as_bytes(), &base(), true);
        }

        #[test]
        fn test_dedupe_has_no_case_insensitive_duplicates(
            emails in proptest::collection::vec("[a-zA-Z]{1,4}@[a-zA-Z]{1,4}\\.com", 0..20)
        ) {
            let deduped = dedupe_emails(&emails);
            let unique: HashSet<_> = deduped.iter().collect();
            prop_assert_eq!(unique.len(), deduped.len());
            for email in &deduped {
                prop_assert_eq!(email, &email.to_lowercase());
            }
        }

        #[test]
        fn test_blocked_domains_always_rejected(
            local in "[a-z0-9]{1,10}",
            domain in prop::sample::select(vec!["example.com", "TEST.com", "localhost", "Sentry.IO"])
        ) {
            let email = format!("{local}@{domain}");
            prop_assert!(!is_valid_email(&email));
        }

        #[test]
        fn test_blocked_prefixes_always_rejected(
            prefix in prop::sample::select(vec!["noreply", "No-Reply", "NO_REPLY", "mailer-daemon"]),
            rest in "[a-z0-9]{0,6}",
        ) {
            let email = format!("{prefix}{rest}@shop.org");
            prop_assert!(!is_valid_email(&email));
        }

        #[test]
        fn test_discovery_stays_bounded_and_same_site(
            hrefs in proptest::collection::vec(
                prop::sample::select(vec![
                    "/contact", "/about", "/contact-us", "#top", "javascript:void(0)",
                    "https://other.org/contact", "/brochure.pdf", "/impressum", "/kontakt",
                    "/team", "/reach-us", "/get-in-touch", "/who-we-are", "/about-us",
                ]),
                0..30,
            )
        ) {
            let links: String = hrefs
                .iter()
                .map(|href| format!(r#"<a href="{href}">Contact</a>"#))
                .collect();
            let document = Html::parse_document(&links);
            let pages = discover_contact_pages(&document, &base());

            prop_assert!(pages.len() <= MAX_CONTACT_PAGES);
            for page in &pages {
                prop_assert_eq!(page.host_str(), base().host_str());
                prop_assert!(page.fragment().is_none());
                prop_assert!(!page.path().ends_with(".pdf"));
            }
        }
    }
}
