//! WHOIS response parsing and classification.
//!
//! WHOIS answers are free-form text whose labels differ between
//! registries. This module maps the common labels onto canonical field
//! names and recognizes the stock "unknown TLD", "rate limited" and
//! "no match" answers.

use crate::error::LookupError;
use crate::types::{WhoisRecord, WhoisValue};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Label patterns, most specific first. Each line feeds at most one field.
    static ref FIELD_PATTERNS: Vec<(&'static str, Regex)> = [
        ("domain_name", r"^(?:Domain Name|domain):\s*(.+)$"),
        ("registrar_url", r"^(?:Registrar URL|Referral URL|registrar-url):\s*(.+)$"),
        ("whois_server", r"^(?:Registrar WHOIS Server|Whois Server):\s*(.+)$"),
        (
            "registrar",
            r"^(?:Registrar|Sponsoring Registrar|Registrar Name|registrar-name):\s*(.+)$",
        ),
        (
            "creation_date",
            r"^(?:Creation Date|Created On|Registered on|Registration Time|created):\s*(.+)$",
        ),
        (
            "updated_date",
            r"^(?:Updated Date|Last Updated On|Last Modified|changed|last-modified):\s*(.+)$",
        ),
        (
            "expiration_date",
            concat!(
                r"^(?:Registry Expiry Date|Registrar Registration Expiration Date",
                r"|Expiration Date|Expiry Date|Expires On|paid-till):\s*(.+)$",
            ),
        ),
        ("name_servers", r"^(?:Name Server|Nameservers?|nserver):\s*(.+)$"),
        ("status", r"^(?:Domain Status|Status):\s*(.+)$"),
        ("dnssec", r"^DNSSEC:\s*(.+)$"),
        ("name", r"^Registrant Name:\s*(.+)$"),
        ("org", r"^(?:Registrant Organi[sz]ation|org):\s*(.+)$"),
        ("registrant_name", r"^(?:Registrant Contact Name|registrant-name|person):\s*(.+)$"),
        (
            "registrant_organization",
            concat!(
                r"^(?:Registrant Contact Organi[sz]ation|registrant-organization",
                r"|org-name|organisation):\s*(.+)$",
            ),
        ),
        ("address", r"^Registrant Street:\s*(.+)$"),
        ("city", r"^Registrant City:\s*(.+)$"),
        ("state", r"^Registrant State/Province:\s*(.+)$"),
        ("registrant_postal_code", r"^Registrant Postal Code:\s*(.+)$"),
        ("country", r"^Registrant Country:\s*(.+)$"),
    ]
    .iter()
    .map(|(key, pattern)| {
        let regex = Regex::new(&format!("(?i){}", pattern)).expect("invalid WHOIS field pattern");
        (*key, regex)
    })
    .collect();

    static ref EMAIL: Regex =
        Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("invalid email pattern");
}

const UNKNOWN_TLD_PATTERNS: &[&str] = &[
    "no whois server is known",
    "no whois server",
    "invalid tld",
    "unknown tld",
    "tld not found",
    "no such tld",
    "bad tld",
    "invalid domain extension",
];

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "quota exceeded",
    "query limit exceeded",
    "rate-limited",
    "try again later",
];

const NOT_FOUND_PATTERNS: &[&str] = &[
    "no match for",
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "status: available",
    "status: free",
    "not registered",
    "no matching record",
    "domain status: no object found",
    "the queried object does not exist",
    "object does not exist",
    "domain name not found",
    "this domain name has not been registered",
];

/// Status values registries use for an unregistered domain.
const AVAILABLE_STATUSES: &[&str] = &[
    "free",
    "available",
    "available for registration",
    "not registered",
    "no object found",
    "unassigned",
];

/// Parse a raw WHOIS response into a record.
///
/// Comment lines (`%`, `#`, `>>>`) are skipped. Blank values are ignored.
pub fn parse_whois_response(text: &str) -> WhoisRecord {
    let mut record = WhoisRecord::with_raw(text);

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('%')
            || line.starts_with('#')
            || line.starts_with(">>>")
        {
            continue;
        }

        if let Some((key, value)) = match_field(line) {
            record.push(key, value);
        }

        for email in EMAIL.find_iter(line) {
            record.push("emails", email.as_str().to_lowercase());
        }
    }

    record
}

fn match_field(line: &str) -> Option<(&'static str, String)> {
    FIELD_PATTERNS.iter().find_map(|(key, regex)| {
        let value = regex.captures(line)?.get(1)?.as_str().trim();
        if value.is_empty() {
            None
        } else {
            Some((*key, value.to_string()))
        }
    })
}

/// Parse and classify a WHOIS response for `domain`.
///
/// A response whose status field marks the domain as unregistered is a
/// no match, even when it echoes the domain name. Any other response that
/// names the domain or its registrar is accepted as is. Otherwise the
/// stock failure answers are recognized, in order: empty response, unknown
/// TLD, rate limiting, no match. A response with no recognizable field at
/// all is a protocol error.
pub fn classify_response(
    domain: &str,
    server: &str,
    text: &str,
) -> Result<WhoisRecord, LookupError> {
    if text.trim().is_empty() {
        return Err(LookupError::protocol(
            domain,
            format!("empty response from {}", server),
        ));
    }

    let record = parse_whois_response(text);
    if has_available_status(&record) {
        return Err(LookupError::domain_not_found(domain));
    }
    if record.get("domain_name").is_some() || record.get("registrar").is_some() {
        return Ok(record);
    }

    let lower = text.to_lowercase();
    if contains_any(&lower, UNKNOWN_TLD_PATTERNS) {
        return Err(LookupError::unknown_tld(domain));
    }
    if contains_any(&lower, RATE_LIMIT_PATTERNS) {
        return Err(LookupError::rate_limited(server, first_line(text)));
    }
    if contains_any(&lower, NOT_FOUND_PATTERNS) {
        return Err(LookupError::domain_not_found(domain));
    }
    if record.is_empty() {
        return Err(LookupError::protocol(
            domain,
            format!("no recognizable fields in response from {}", server),
        ));
    }

    Ok(record)
}

/// Find the registrar's WHOIS server named in a registry response.
///
/// Scheme prefixes (`whois://`, `rwhois://`) and trailing paths are removed.
pub fn find_referral_server(text: &str) -> Option<String> {
    let record = parse_whois_response(text);
    let value = crate::utils::primary_text(record.get("whois_server"))?;

    let host = value
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&value)
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Whether any `status` value says the domain is free to register.
fn has_available_status(record: &WhoisRecord) -> bool {
    let mut statuses = Vec::new();
    if let Some(value) = record.get("status") {
        collect_text(value, &mut statuses);
    }

    statuses.iter().any(|status| {
        let status = status.trim().to_lowercase();
        AVAILABLE_STATUSES.contains(&status.as_str())
    })
}

fn collect_text<'a>(value: &'a WhoisValue, out: &mut Vec<&'a str>) {
    match value {
        WhoisValue::Text(text) => out.push(text),
        WhoisValue::List(items) => items.iter().for_each(|item| collect_text(item, out)),
    }
}

fn contains_any(haystack: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| haystack.contains(pattern))
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}
