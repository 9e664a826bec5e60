//! `htu` comparison helpers.

use url::Url;

/// Canonical form of an `htu` value, used only for equality checks.
///
/// RFC 9449 §4.3 compares the target URI without query and fragment. Parsing
/// through `url` lowercases scheme and host and drops default ports.
pub fn normalize_htu(htu: &str) -> String {
    match Url::parse(htu) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.into()
        }
        // Not an absolute URL; compare verbatim.
        Err(_) => htu.to_string(),
    }
}

pub fn htu_matches(claimed: &str, actual: &str) -> bool {
    normalize_htu(claimed) == normalize_htu(actual)
}
