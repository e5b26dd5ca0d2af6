//! DNS queries for nameserver discovery.
//!
//! [`Resolve`] is the raw query seam, implemented for production by
//! [`HickoryResolver`]. [`DnsClient`] layers the reporting rules on top:
//! trailing dots are stripped, a missing NS set is explained by probing
//! for a CNAME, and every outcome is a [`DnsRecords`] value rather than
//! an error.

use crate::error::DnsError;
use crate::types::{DnsRecords, LookupConfig};
use crate::utils::strip_root_dot;
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::error::ProtoErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;

/// A DNS resolver queried one `(name, type)` pair at a time.
///
/// Implementations return the text form of every record of the requested
/// type. An answer without such records is `DnsError::NoAnswer`.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn query(&self, name: &str, record_type: RecordType) -> Result<Vec<String>, DnsError>;
}

/// [`Resolve`] backed by `hickory-resolver`.
pub struct HickoryResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryResolver {
    /// Build a resolver honouring the nameservers and timeout in `config`.
    ///
    /// Without configured nameservers the system configuration is used
    /// (`/etc/resolv.conf` on Unix), falling back to the library's default
    /// upstreams when it cannot be read.
    pub fn from_config(config: &LookupConfig) -> Self {
        let (resolver_config, mut options) = if config.nameservers.is_empty() {
            match hickory_resolver::system_conf::read_system_conf() {
                Ok(system) => system,
                Err(e) => {
                    tracing::warn!(
                        "Could not read system DNS configuration, using defaults: {}",
                        e
                    );
                    (ResolverConfig::default(), ResolverOpts::default())
                }
            }
        } else {
            let group = NameServerConfigGroup::from_ips_clear(&config.nameservers, 53, true);
            (
                ResolverConfig::from_parts(None, Vec::new(), group),
                ResolverOpts::default(),
            )
        };

        if let Some(timeout) = config.dns_timeout {
            options.timeout = timeout;
        }

        Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, options),
        }
    }
}

#[async_trait]
impl Resolve for HickoryResolver {
    async fn query(&self, name: &str, record_type: RecordType) -> Result<Vec<String>, DnsError> {
        // Absolute name, so search domains are never appended
        let fqdn = if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{}.", name)
        };

        match self.resolver.lookup(fqdn.as_str(), record_type).await {
            Ok(lookup) => {
                let records: Vec<String> = lookup
                    .iter()
                    .filter(|rdata| rdata.record_type() == record_type)
                    .map(|rdata| rdata.to_string())
                    .collect();
                if records.is_empty() {
                    Err(DnsError::NoAnswer {
                        domain: name.to_string(),
                        record_type,
                    })
                } else {
                    Ok(records)
                }
            }
            Err(e) => Err(classify_resolve_error(name, record_type, &e)),
        }
    }
}

/// Map a hickory error onto the DNS error taxonomy.
pub fn classify_resolve_error(
    domain: &str,
    record_type: RecordType,
    error: &ResolveError,
) -> DnsError {
    let domain = domain.to_string();
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NXDomain => DnsError::NxDomain { domain },
            ResponseCode::ServFail | ResponseCode::Refused => DnsError::NoNameservers { domain },
            _ => DnsError::NoAnswer { domain, record_type },
        },
        ResolveErrorKind::NoConnections => DnsError::NoNameservers { domain },
        ResolveErrorKind::Timeout => DnsError::Timeout { domain, record_type },
        ResolveErrorKind::Proto(proto) if matches!(proto.kind(), ProtoErrorKind::Timeout) => {
            DnsError::Timeout { domain, record_type }
        }
        ResolveErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            DnsError::Timeout { domain, record_type }
        }
        _ => DnsError::Unexpected {
            domain,
            record_type,
            message: error.to_string(),
        },
    }
}

/// DNS client producing [`DnsRecords`] for display.
pub struct DnsClient {
    resolver: Box<dyn Resolve>,
}

impl DnsClient {
    /// Create a client over any resolver.
    pub fn new<R: Resolve + 'static>(resolver: R) -> Self {
        Self {
            resolver: Box::new(resolver),
        }
    }

    /// Create a client over a hickory resolver built from `config`.
    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(HickoryResolver::from_config(config))
    }

    /// Query `record_type` records for `domain`.
    ///
    /// Never fails: errors are carried in [`DnsRecords::error`], and an
    /// empty success is turned into an explicit error.
    pub async fn get_records(&self, domain: &str, record_type: RecordType) -> DnsRecords {
        let result = match self.resolver.query(domain, record_type).await {
            Ok(records) => DnsRecords::found(
                records
                    .iter()
                    .map(|record| strip_root_dot(record).to_string())
                    .collect(),
            ),
            Err(DnsError::NoAnswer { .. }) => {
                DnsRecords::failed(self.explain_missing(domain, record_type).await)
            }
            Err(e) => DnsRecords::failed(e),
        };

        if result.records.is_empty() && result.error.is_none() {
            return DnsRecords::failed(DnsError::EmptyResult { record_type });
        }
        result
    }

    /// Explain an empty answer. For NS, a CNAME at the same name is the
    /// usual reason, so its target is reported when one exists.
    async fn explain_missing(&self, domain: &str, record_type: RecordType) -> DnsError {
        if record_type != RecordType::NS {
            return DnsError::NoRecords { record_type };
        }

        match self.resolver.query(domain, RecordType::CNAME).await {
            Ok(targets) => match targets.first() {
                Some(target) => DnsError::CnameInstead {
                    record_type,
                    target: strip_root_dot(target).to_string(),
                },
                None => DnsError::NoRecords { record_type },
            },
            Err(DnsError::NoAnswer { .. }) | Err(DnsError::NxDomain { .. }) => {
                DnsError::NoRecords { record_type }
            }
            // Probe failures are reported against the NS query
            Err(DnsError::Timeout { domain, .. }) => DnsError::Timeout { domain, record_type },
            Err(DnsError::Unexpected { domain, message, .. }) => DnsError::Unexpected {
                domain,
                record_type,
                message,
            },
            Err(other) => other,
        }
    }
}
