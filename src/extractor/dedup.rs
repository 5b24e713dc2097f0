use crate::extractor::validate::is_valid_email;
use std::collections::HashSet;

/// Lowercase and trim every address, keeping the first occurrence of each.
pub fn dedupe_emails<I, S>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for email in emails {
        let normalized = email.as_ref().trim().to_lowercase();
        if seen.insert(normalized.clone()) {
            result.push(normalized);
        }
    }

    result
}

/// Deduplicate, then keep only acceptable addresses.
pub fn filter_valid<I, S>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedupe_emails(emails)
        .into_iter()
        .filter(|email| is_valid_email(email))
        .collect()
}
