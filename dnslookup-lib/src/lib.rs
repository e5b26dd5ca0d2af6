//! # DNSLookup Library
//!
//! Registration and DNS hosting details for a domain, from WHOIS and DNS.
//!
//! For one domain the library reports the registrant, the registrar, the
//! authoritative nameservers, and the inferred DNS hosting provider (the
//! registrar of the first nameserver's owner domain).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dnslookup_lib::{Inspector, LookupConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let inspector = Inspector::from_config(&LookupConfig::default());
//!     let report = inspector.inspect("example.com").await;
//!
//!     println!("Registrar: {}", report.registrar);
//!     println!("Hosting: {}", report.hosting_provider);
//! }
//! ```
//!
//! ## Features
//!
//! - **WHOIS**: native port 43 client with IANA referral chain, or the system `whois` binary
//! - **DNS**: NS lookup via `hickory-resolver`, with CNAME explanation for missing NS sets
//! - **Public Suffix List**: correct owner domains under multi-label suffixes
//! - **Never fails outward**: every problem degrades to an explicit sentinel value

// Re-export main public API types and functions
// This makes them available as dnslookup_lib::TypeName
pub use config::{
    build_lookup_config, env_config_from, load_env_config, merge_configs, parse_timeout_string,
    ConfigManager, DnsSection, EnvConfig, FileConfig, WhoisSection,
};
pub use error::{DnsError, LookupError};
pub use inspector::Inspector;
pub use protocols::dns::classify_resolve_error;
pub use protocols::whois::{parse_iana_refer_response, transport_from_config, WHOIS_PORT};
pub use protocols::{
    classify_response, parse_whois_response, CommandTransport, DnsClient, HickoryResolver,
    Resolve, SocketTransport, WhoisClient, WhoisResponse, WhoisTransport,
};
pub use types::{
    DnsRecords, DomainReport, HostingProvider, LookupConfig, RegistrationField, WhoisRecord,
    WhoisTransportKind, WhoisValue, LOOKUP_FAILED, NOT_FOUND,
};
pub use utils::{
    extract_tld, get_primary_whois_value, get_registrable_domain, normalize_domain,
    registrable_domain, strip_root_dot,
};

/// DNS record types, re-exported from `hickory-resolver`.
pub use hickory_resolver::proto::rr::RecordType;

// Internal modules - these are not part of the public API
mod config;
mod error;
mod inspector;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LookupError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
