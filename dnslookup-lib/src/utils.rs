//! Utility functions for domain handling and WHOIS value normalization.
//!
//! This module contains the small helpers used throughout the library:
//! input normalization, TLD and registrable-domain extraction, and
//! picking a single display string out of a WHOIS field.

use crate::error::LookupError;
use crate::types::{WhoisValue, NOT_FOUND};

/// Normalize a domain for lookups: trim whitespace and lowercase.
///
/// No other syntax validation is performed.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

/// Strip trailing root-label dots from a DNS name or record text.
pub fn strip_root_dot(name: &str) -> &str {
    name.trim_end_matches('.')
}

/// Extract the last label of a domain as its TLD.
///
/// # Arguments
///
/// * `domain` - The domain name to extract the TLD from
///
/// # Returns
///
/// The lowercase TLD, or `LookupError::UnknownTld` when the domain has
/// no dot or an empty last label.
pub fn extract_tld(domain: &str) -> Result<String, LookupError> {
    let trimmed = strip_root_dot(domain.trim());
    match trimmed.rsplit_once('.') {
        Some((rest, tld)) if !rest.is_empty() && !tld.is_empty() => Ok(tld.to_lowercase()),
        _ => Err(LookupError::unknown_tld(domain)),
    }
}

/// Derive the registrable domain (eTLD+1) of a host name.
///
/// Uses the Public Suffix List, private section included, so
/// "ns1.example.co.uk" gives "example.co.uk" rather than "co.uk".
///
/// # Returns
///
/// The registrable domain, or `None` for empty input or when no
/// registrable domain can be determined. The latter case is logged.
pub fn get_registrable_domain(fqdn: &str) -> Option<String> {
    if fqdn.trim().is_empty() {
        return None;
    }

    match registrable_domain(fqdn) {
        Ok(domain) => Some(domain),
        Err(e) => {
            tracing::warn!("Could not extract registrable domain from '{}'", fqdn);
            tracing::debug!("{}", e);
            None
        }
    }
}

/// Fallible form of [`get_registrable_domain`].
pub fn registrable_domain(fqdn: &str) -> Result<String, LookupError> {
    let host = normalize_domain(fqdn);
    let host = strip_root_dot(&host);

    let domain = psl::domain(host.as_bytes())
        .ok_or_else(|| LookupError::extraction(fqdn, "no label below a public suffix"))?;

    // The list falls back to a wildcard rule for unlisted TLDs
    if !domain.suffix().is_known() {
        return Err(LookupError::extraction(
            fqdn,
            "suffix is not on the public suffix list",
        ));
    }

    std::str::from_utf8(domain.as_bytes())
        .map(str::to_string)
        .map_err(|e| LookupError::extraction(fqdn, format!("invalid UTF-8 in domain: {}", e)))
}

/// Pick a single display string from a WHOIS field.
///
/// - absent: "Not Found"
/// - text: trimmed, or "Not Found" when blank
/// - list: first non-blank text entry, trimmed; nested lists are skipped
pub fn get_primary_whois_value(value: Option<&WhoisValue>) -> String {
    primary_text(value).unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Same as [`get_primary_whois_value`], with `None` instead of the sentinel.
pub(crate) fn primary_text(value: Option<&WhoisValue>) -> Option<String> {
    match value? {
        WhoisValue::Text(text) => non_blank(text),
        WhoisValue::List(items) => items.iter().find_map(|item| match item {
            WhoisValue::Text(text) => non_blank(text),
            WhoisValue::List(_) => None,
        }),
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
