use regex::Regex;
use std::sync::LazyLock;

/// Local-part prefixes of automated, non-deliverable mailboxes.
const BLOCKED_LOCAL_PREFIXES: &[&str] = &["noreply", "no-reply", "no_reply", "mailer-daemon"];

/// Placeholder, test and tooling domains that never belong to a business.
const BLOCKED_DOMAINS: &[&str] = &["example.com", "test.com", "localhost", "sentry.io"];

const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

static EMAIL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*$",
    )
    .unwrap()
});

/// Whether `candidate` is a well-formed address that is neither an automated
/// mailbox nor on a placeholder domain. Purely syntactic, no DNS.
pub fn is_valid_email(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() || !EMAIL_SYNTAX.is_match(candidate) {
        return false;
    }

    let lower = candidate.to_lowercase();
    let Some((local, domain)) = lower.rsplit_once('@') else {
        return false;
    };

    if local.len() > MAX_LOCAL_LEN
        || domain.len() > MAX_DOMAIN_LEN
        || domain.split('.').any(|label| label.len() > MAX_LABEL_LEN)
    {
        return false;
    }

    if BLOCKED_LOCAL_PREFIXES
        .iter()
        .any(|prefix| local.starts_with(prefix))
    {
        return false;
    }

    !BLOCKED_DOMAINS.contains(&domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_business_addresses() {
        for email in [
            "info@business.com",
            "Sales.Team+web@Shop.co.uk",
            "  hello@mybusiness.com  ",
            "o'brien@pub.ie",
        ] {
            assert!(is_valid_email(email), "{email} should be accepted");
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for email in [
            "",
            "not-an-email",
            "@business.com",
            "info@",
            "info@@business.com",
            "info@-business.com",
            ".info@business.com",
            "in..fo@business.com",
            "info @business.com",
        ] {
            assert!(!is_valid_email(email), "{email:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_automated_prefixes() {
        for email in [
            "noreply@business.com",
            "no-reply@business.com",
            "no_reply@business.com",
            "mailer-daemon@business.com",
            "NoReply@business.com",
            "noreply-alerts@business.com",
        ] {
            assert!(!is_valid_email(email), "{email} should be rejected");
        }
    }

    #[test]
    fn test_rejects_placeholder_domains() {
        for email in [
            "user@example.com",
            "user@test.com",
            "user@localhost",
            "abc123@sentry.io",
            "User@EXAMPLE.COM",
        ] {
            assert!(!is_valid_email(email), "{email} should be rejected");
        }

        // Only exact domain matches are blocked.
        assert!(is_valid_email("owner@myexample.com"));
        assert!(is_valid_email("owner@test.com.au"));
    }

    #[test]
    fn test_rejects_overlong_parts() {
        let local = "a".repeat(65);
        assert!(!is_valid_email(&format!("{local}@business.com")));

        let label = "b".repeat(64);
        assert!(!is_valid_email(&format!("info@{label}.com")));
    }
}
