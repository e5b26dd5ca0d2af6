//! Error handling for lookup operations.
//!
//! Two error families live here. [`LookupError`] covers WHOIS queries,
//! domain extraction and configuration. [`DnsError`] covers DNS queries;
//! its `Display` output is the exact message shown to users, because DNS
//! failures are reported as text rather than raised.

use hickory_resolver::proto::rr::RecordType;
use std::time::Duration;
use thiserror::Error;

/// Main error type for WHOIS, extraction and configuration failures.
///
/// Every variant is a classified failure. `Unclassified` is the single
/// residual bucket for anything that does not fit the others.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// No WHOIS server is known for the domain's top-level domain
    #[error("Unknown TLD for '{domain}'")]
    UnknownTld { domain: String },

    /// The transport (system command or TCP connection) failed
    #[error("WHOIS command failed for '{domain}': {message}")]
    CommandFailed { domain: String, message: String },

    /// The server answered, but the answer was unusable
    #[error("WHOIS protocol error for '{domain}': {message}")]
    Protocol { domain: String, message: String },

    /// The registry reported that the domain is not registered
    #[error("No match for '{domain}'")]
    DomainNotFound { domain: String },

    /// The server refused to answer because of query limits
    #[error("Rate limited by {server}: {message}")]
    RateLimited { server: String, message: String },

    /// An operation exceeded its time budget
    #[error("Timeout after {duration:?} during: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// A host name has no determinable registrable domain
    #[error("Could not extract registrable domain from '{host}': {reason}")]
    Extraction { host: String, reason: String },

    /// Invalid configuration values
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration file could not be read
    #[error("File error at '{path}': {message}")]
    File { path: String, message: String },

    /// Anything that fits none of the categories above
    #[error("Unclassified error: {message}")]
    Unclassified { message: String },
}

impl LookupError {
    /// Create a new unknown TLD error.
    pub fn unknown_tld<D: Into<String>>(domain: D) -> Self {
        Self::UnknownTld {
            domain: domain.into(),
        }
    }

    /// Create a new transport/command failure.
    pub fn command_failed<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::CommandFailed {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new WHOIS protocol error.
    pub fn protocol<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::Protocol {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new "domain not registered" error.
    pub fn domain_not_found<D: Into<String>>(domain: D) -> Self {
        Self::DomainNotFound {
            domain: domain.into(),
        }
    }

    /// Create a new rate limiting error.
    pub fn rate_limited<S: Into<String>, M: Into<String>>(server: S, message: M) -> Self {
        Self::RateLimited {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new extraction error.
    pub fn extraction<H: Into<String>, R: Into<String>>(host: H, reason: R) -> Self {
        Self::Extraction {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new unclassified error.
    pub fn unclassified<M: Into<String>>(message: M) -> Self {
        Self::Unclassified {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the WHOIS protocol family.
    ///
    /// Not-found answers, rate limits and unusable responses all count,
    /// since the server was reached but gave no usable record.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::Protocol { .. } | Self::DomainNotFound { .. } | Self::RateLimited { .. }
        )
    }
}

/// DNS failure for one `(domain, record type)` query.
///
/// The `Display` text of each variant is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsError {
    /// The domain does not exist
    #[error("Domain '{domain}' does not exist (NXDOMAIN).")]
    NxDomain { domain: String },

    /// The query returned no result set
    #[error("No {record_type} records found for '{domain}'.")]
    NoAnswer {
        domain: String,
        record_type: RecordType,
    },

    /// No nameserver could answer the query
    #[error("Could not contact nameservers for '{domain}'.")]
    NoNameservers { domain: String },

    /// The query timed out
    #[error("DNS query for {record_type} records of '{domain}' timed out.")]
    Timeout {
        domain: String,
        record_type: RecordType,
    },

    /// No result set, and no CNAME to explain it
    #[error("No {record_type} records found.")]
    NoRecords { record_type: RecordType },

    /// No result set, but the name is an alias
    #[error("No direct {record_type} records found, but found CNAME: {target}")]
    CnameInstead {
        record_type: RecordType,
        target: String,
    },

    /// Nothing was returned and nothing was reported
    #[error("No {record_type} records found (or query failed silently).")]
    EmptyResult { record_type: RecordType },

    /// Any other resolver failure
    #[error("An unexpected DNS error occurred for '{domain}' ({record_type}): {message}")]
    Unexpected {
        domain: String,
        record_type: RecordType,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_error_messages() {
        let nx = DnsError::NxDomain {
            domain: "nope.invalid".to_string(),
        };
        assert_eq!(
            nx.to_string(),
            "Domain 'nope.invalid' does not exist (NXDOMAIN)."
        );

        let cname = DnsError::CnameInstead {
            record_type: RecordType::NS,
            target: "target.example.net".to_string(),
        };
        assert_eq!(
            cname.to_string(),
            "No direct NS records found, but found CNAME: target.example.net"
        );

        let timeout = DnsError::Timeout {
            domain: "example.com".to_string(),
            record_type: RecordType::NS,
        };
        assert_eq!(
            timeout.to_string(),
            "DNS query for NS records of 'example.com' timed out."
        );

        let empty = DnsError::EmptyResult {
            record_type: RecordType::NS,
        };
        assert_eq!(
            empty.to_string(),
            "No NS records found (or query failed silently)."
        );

        let unexpected = DnsError::Unexpected {
            domain: "example.com".to_string(),
            record_type: RecordType::CNAME,
            message: "boom".to_string(),
        };
        assert_eq!(
            unexpected.to_string(),
            "An unexpected DNS error occurred for 'example.com' (CNAME): boom"
        );
    }

    #[test]
    fn test_protocol_family() {
        assert!(LookupError::domain_not_found("example.com").is_protocol_error());
        assert!(LookupError::rate_limited("whois.example", "slow down").is_protocol_error());
        assert!(LookupError::protocol("example.com", "garbage").is_protocol_error());
        assert!(!LookupError::unknown_tld("example.zz").is_protocol_error());
        assert!(!LookupError::timeout("WHOIS query", Duration::from_secs(1)).is_protocol_error());
    }
}
