use crate::fetcher::types::{Charset, PageResponse};
use bytes::Bytes;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

/// Decode a fetched body. `content_type` is the raw Content-Type header, if
/// the response had one.
pub fn process_response(
    url_final: Url,
    status: StatusCode,
    content_type: Option<&str>,
    body_bytes: Bytes,
    truncated: bool,
) -> PageResponse {
    let charset = detect_charset(content_type.unwrap_or("text/html"), &body_bytes);
    // A cut-off body may end mid-character; only the tail is damaged then.
    let body_utf8 = decode_to_utf8(&body_bytes, &charset, truncated);
    if body_utf8.is_none() {
        debug!(url = %url_final, ?charset, "body could not be decoded, falling back to raw bytes");
    }

    PageResponse {
        url_final,
        status,
        body_raw: body_bytes,
        body_utf8,
        truncated,
    }
}

fn label_to_charset(captures: Option<regex::Captures<'_>>) -> Option<Charset> {
    let charset_name = captures?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(charset_name.as_bytes()).map(Charset::from_encoding)
}

pub(crate) fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    // 1. Content-Type header
    if let Some(charset) = label_to_charset(CHARSET_REGEX.captures(content_type)) {
        return charset;
    }

    // 2. <meta charset> or <meta http-equiv> in the first 4KB
    let search_bytes = &body_bytes[..body_bytes.len().min(4096)];
    let search_str = String::from_utf8_lossy(search_bytes);

    if let Some(charset) = label_to_charset(META_CHARSET_REGEX.captures(&search_str)) {
        return charset;
    }
    if let Some(charset) = label_to_charset(META_HTTP_EQUIV_REGEX.captures(&search_str)) {
        return charset;
    }

    // 3. Heuristic detection
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, search_bytes.len() == body_bytes.len());
    Charset::from_encoding(detector.guess(None, true))
}

pub(crate) fn decode_to_utf8(body_bytes: &[u8], charset: &Charset, lossy: bool) -> Option<String> {
    let (decoded, _encoding, had_errors) = charset.encoding().decode(body_bytes);

    if had_errors && !lossy {
        return None;
    }

    Some(decoded.into_owned())
}
