//! Protocol implementations for domain inspection.
//!
//! This module contains the WHOIS transports and response parser, and the
//! DNS client used for nameserver discovery.

/// WHOIS response parsing and classification
pub mod parser;

/// WHOIS transports and client
pub mod whois;

/// DNS resolver seam and nameserver client
pub mod dns;

// Re-export commonly used functions and types
pub use dns::{DnsClient, HickoryResolver, Resolve};
pub use parser::{classify_response, parse_whois_response};
pub use whois::{CommandTransport, SocketTransport, WhoisClient, WhoisResponse, WhoisTransport};
