//! Core data types for domain lookups.
//!
//! This module defines the WHOIS record model, the DNS record set, the
//! final report with its status enums, and the lookup configuration.

use crate::error::DnsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Sentinel shown when a field has no usable value.
pub const NOT_FOUND: &str = "Not Found";

/// Sentinel shown when the WHOIS lookup itself failed.
pub const LOOKUP_FAILED: &str = "WHOIS Lookup Failed";

/// A WHOIS field value.
///
/// WHOIS responses have no fixed schema: a field can appear once, many
/// times, or not at all. Absence is modelled by `Option<&WhoisValue>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoisValue {
    /// Field seen once
    Text(String),
    /// Field seen several times, in first-seen order
    List(Vec<WhoisValue>),
}

impl WhoisValue {
    /// Truthiness: a non-empty string or a non-empty list.
    ///
    /// Whitespace-only text still counts as present here; trimming is the
    /// normalizer's job.
    pub fn is_present(&self) -> bool {
        match self {
            WhoisValue::Text(text) => !text.is_empty(),
            WhoisValue::List(items) => !items.is_empty(),
        }
    }
}

impl From<&str> for WhoisValue {
    fn from(value: &str) -> Self {
        WhoisValue::Text(value.to_string())
    }
}

impl From<String> for WhoisValue {
    fn from(value: String) -> Self {
        WhoisValue::Text(value)
    }
}

impl<T: Into<WhoisValue>> From<Vec<T>> for WhoisValue {
    fn from(values: Vec<T>) -> Self {
        WhoisValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for WhoisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhoisValue::Text(text) => write!(f, "{}", text),
            WhoisValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// A parsed WHOIS response: canonical field names mapped to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisRecord {
    fields: BTreeMap<String, WhoisValue>,
    raw: String,
}

impl WhoisRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record that remembers the raw response text.
    pub fn with_raw<S: Into<String>>(raw: S) -> Self {
        Self {
            fields: BTreeMap::new(),
            raw: raw.into(),
        }
    }

    /// Set a field, replacing any previous value.
    pub fn insert<K: Into<String>, V: Into<WhoisValue>>(&mut self, key: K, value: V) {
        self.fields.insert(key.into(), value.into());
    }

    /// Add one occurrence of a field.
    ///
    /// The first occurrence is stored as `Text`; a second distinct
    /// occurrence promotes it to a `List`. Repeats that differ only in
    /// case are dropped.
    pub fn push(&mut self, key: &str, value: String) {
        match self.fields.get_mut(key) {
            None => {
                self.fields.insert(key.to_string(), WhoisValue::Text(value));
            }
            Some(existing) => {
                let duplicate = match &*existing {
                    WhoisValue::Text(text) => text.eq_ignore_ascii_case(&value),
                    WhoisValue::List(items) => items.iter().any(|item| {
                        matches!(item, WhoisValue::Text(text) if text.eq_ignore_ascii_case(&value))
                    }),
                };
                if duplicate {
                    return;
                }
                match existing {
                    WhoisValue::List(items) => items.push(WhoisValue::Text(value)),
                    WhoisValue::Text(first) => {
                        let first = std::mem::take(first);
                        *existing = WhoisValue::List(vec![
                            WhoisValue::Text(first),
                            WhoisValue::Text(value),
                        ]);
                    }
                }
            }
        }
    }

    /// Look up a single field.
    pub fn get(&self, key: &str) -> Option<&WhoisValue> {
        self.fields.get(key)
    }

    /// Return the first field among `keys` that holds a present value.
    ///
    /// `get_any(&["name", "registrant_name"])` reads as "name, or else
    /// registrant_name".
    pub fn get_any(&self, keys: &[&str]) -> Option<&WhoisValue> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .find(|value| value.is_present())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The unparsed response text, if it was kept.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl<K: Into<String>> FromIterator<(K, WhoisValue)> for WhoisRecord {
    fn from_iter<I: IntoIterator<Item = (K, WhoisValue)>>(iter: I) -> Self {
        let mut record = WhoisRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Result of a DNS query: record texts without trailing dots, plus an
/// optional error. When `error` is set, `records` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsRecords {
    pub records: Vec<String>,
    pub error: Option<DnsError>,
}

impl DnsRecords {
    pub fn found(records: Vec<String>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    pub fn failed(error: DnsError) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
        }
    }

    /// First record, when the query succeeded.
    pub fn first(&self) -> Option<&str> {
        if self.error.is_some() {
            return None;
        }
        self.records.first().map(String::as_str)
    }
}

/// Outcome of deriving the registrant or registrar of a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationField {
    /// A value was found
    Found(String),
    /// Only the registrar's URL was found
    Url(String),
    /// The lookup worked but the field was empty
    NotFound,
    /// The WHOIS lookup failed entirely
    LookupFailed,
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationField::Found(value) => write!(f, "{}", value),
            RegistrationField::Url(url) => write!(f, "URL: {}", url),
            RegistrationField::NotFound => write!(f, "{}", NOT_FOUND),
            RegistrationField::LookupFailed => write!(f, "{}", LOOKUP_FAILED),
        }
    }
}

/// The inferred DNS hosting provider, or why it could not be inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostingProvider {
    /// Registrar of the nameserver's owner domain
    Registrar(String),
    /// Owner domain has no registrar, but has an organisation
    OwnerOrg(String),
    /// Owner domain WHOIS had neither
    NotFound,
    /// WHOIS for the owner domain failed
    LookupFailed { owner_domain: String },
    /// The nameserver host has no registrable domain
    UnknownOwner { nameserver: String },
    /// There was no nameserver to start from
    Skipped,
}

impl fmt::Display for HostingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostingProvider::Registrar(name) => write!(f, "{}", name),
            HostingProvider::OwnerOrg(org) => {
                write!(f, "Owner Org: {} (Registrar Not Found)", org)
            }
            HostingProvider::NotFound => write!(f, "{}", NOT_FOUND),
            HostingProvider::LookupFailed { owner_domain } => {
                write!(f, "{} for {}", LOOKUP_FAILED, owner_domain)
            }
            HostingProvider::UnknownOwner { nameserver } => {
                write!(f, "Could not determine owner domain from '{}'.", nameserver)
            }
            HostingProvider::Skipped => write!(f, "Skipped (No nameserver found)."),
        }
    }
}

/// Everything one run produces for a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// The normalized domain that was inspected
    pub domain: String,
    pub registrant: RegistrationField,
    pub registrar: RegistrationField,
    /// NS lookup result, error included
    pub nameservers: DnsRecords,
    pub hosting_provider: HostingProvider,
}

/// How WHOIS queries reach the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhoisTransportKind {
    /// Native TCP port 43 queries with referral following
    #[serde(rename = "socket")]
    Socket,
    /// The system `whois` binary
    #[serde(rename = "command")]
    Command,
}

impl FromStr for WhoisTransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "socket" | "tcp" | "native" => Ok(WhoisTransportKind::Socket),
            "command" | "cmd" | "system" => Ok(WhoisTransportKind::Command),
            other => Err(format!(
                "unknown WHOIS transport '{}', use 'socket' or 'command'",
                other
            )),
        }
    }
}

impl fmt::Display for WhoisTransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhoisTransportKind::Socket => write!(f, "socket"),
            WhoisTransportKind::Command => write!(f, "command"),
        }
    }
}

/// Settings for one lookup run.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    /// Transport used for WHOIS queries
    /// Default: socket
    pub whois_transport: WhoisTransportKind,

    /// Bound on each WHOIS network exchange
    /// Default: 10 seconds
    pub whois_timeout: Duration,

    /// Root referral server asked for a TLD's WHOIS server
    /// Default: whois.iana.org
    pub whois_server: String,

    /// Whether to follow registry -> registrar referrals
    /// Default: true
    pub follow_referrals: bool,

    /// Per-query DNS timeout; `None` keeps the resolver default
    pub dns_timeout: Option<Duration>,

    /// Nameservers to query; empty means the system configuration
    pub nameservers: Vec<IpAddr>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            whois_transport: WhoisTransportKind::Socket,
            whois_timeout: Duration::from_secs(10),
            whois_server: "whois.iana.org".to_string(),
            follow_referrals: true,
            dns_timeout: None,
            nameservers: Vec::new(),
        }
    }
}

impl LookupConfig {
    pub fn with_whois_transport(mut self, transport: WhoisTransportKind) -> Self {
        self.whois_transport = transport;
        self
    }

    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    pub fn with_whois_server<S: Into<String>>(mut self, server: S) -> Self {
        self.whois_server = server.into();
        self
    }

    pub fn with_follow_referrals(mut self, enabled: bool) -> Self {
        self.follow_referrals = enabled;
        self
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = Some(timeout);
        self
    }

    pub fn with_nameservers(mut self, nameservers: Vec<IpAddr>) -> Self {
        self.nameservers = nameservers;
        self
    }
}
