//! Domain inspection.
//!
//! This module provides the [`Inspector`], which runs the whole lookup
//! sequence for one domain: WHOIS for the domain itself, an NS query, and
//! WHOIS for the registrable domain of the first nameserver.

use crate::protocols::{DnsClient, Resolve, WhoisClient, WhoisTransport};
use crate::types::{DomainReport, HostingProvider, LookupConfig, RegistrationField, WhoisRecord};
use crate::utils::{get_registrable_domain, normalize_domain, primary_text};
use hickory_resolver::proto::rr::RecordType;

/// Field names read as the registrant, in order of preference.
const REGISTRANT_NAME_FIELDS: &[&str] = &["name", "registrant_name"];
const REGISTRANT_ORG_FIELDS: &[&str] = &["org", "registrant_organization"];

/// Runs WHOIS and DNS lookups for a domain and assembles a [`DomainReport`].
///
/// Lookups are strictly sequential and never fail outward: every problem
/// degrades the affected field of the report.
///
/// # Example
///
/// ```rust,no_run
/// use dnslookup_lib::{Inspector, LookupConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let inspector = Inspector::from_config(&LookupConfig::default());
///     let report = inspector.inspect("example.com").await;
///     println!("Registrar: {}", report.registrar);
/// }
/// ```
pub struct Inspector {
    whois: WhoisClient,
    dns: DnsClient,
}

impl Inspector {
    /// Create an inspector from explicit clients.
    pub fn new(whois: WhoisClient, dns: DnsClient) -> Self {
        Self { whois, dns }
    }

    /// Create an inspector over any WHOIS transport and DNS resolver.
    pub fn with_backends<T, R>(transport: T, resolver: R) -> Self
    where
        T: WhoisTransport + 'static,
        R: Resolve + 'static,
    {
        Self::new(WhoisClient::new(transport), DnsClient::new(resolver))
    }

    /// Create an inspector with the production transport and resolver
    /// selected by `config`.
    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(WhoisClient::from_config(config), DnsClient::from_config(config))
    }

    /// Inspect a domain.
    ///
    /// The input is trimmed and lower-cased first. The returned report
    /// always carries all four fields.
    pub async fn inspect(&self, domain: &str) -> DomainReport {
        let domain = normalize_domain(domain);
        tracing::debug!("Inspecting '{}'", domain);

        let (registrant, registrar) = match self.whois.lookup(&domain).await {
            Some(record) => (registrant_of(&record), registrar_of(&record)),
            None => (RegistrationField::LookupFailed, RegistrationField::LookupFailed),
        };

        let nameservers = self.dns.get_records(&domain, RecordType::NS).await;

        let hosting_provider = match nameservers.first() {
            Some(nameserver) => self.hosting_provider_of(nameserver).await,
            None => HostingProvider::Skipped,
        };

        DomainReport {
            domain,
            registrant,
            registrar,
            nameservers,
            hosting_provider,
        }
    }

    /// Infer the DNS hosting provider from the registrar of the
    /// nameserver's owner domain.
    async fn hosting_provider_of(&self, nameserver: &str) -> HostingProvider {
        let Some(owner_domain) = get_registrable_domain(nameserver) else {
            return HostingProvider::UnknownOwner {
                nameserver: nameserver.to_string(),
            };
        };
        tracing::debug!("Nameserver '{}' belongs to '{}'", nameserver, owner_domain);

        let Some(record) = self.whois.lookup(&owner_domain).await else {
            return HostingProvider::LookupFailed { owner_domain };
        };

        if let Some(registrar) = primary_text(record.get("registrar")) {
            return HostingProvider::Registrar(registrar);
        }
        match primary_text(record.get("org")) {
            Some(org) => HostingProvider::OwnerOrg(org),
            None => HostingProvider::NotFound,
        }
    }
}

fn registrant_of(record: &WhoisRecord) -> RegistrationField {
    primary_text(record.get_any(REGISTRANT_NAME_FIELDS))
        .or_else(|| primary_text(record.get_any(REGISTRANT_ORG_FIELDS)))
        .map(RegistrationField::Found)
        .unwrap_or(RegistrationField::NotFound)
}

fn registrar_of(record: &WhoisRecord) -> RegistrationField {
    if let Some(registrar) = primary_text(record.get("registrar")) {
        return RegistrationField::Found(registrar);
    }
    match primary_text(record.get("registrar_url")) {
        Some(url) => RegistrationField::Url(url),
        None => RegistrationField::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DnsError, LookupError};
    use crate::protocols::WhoisResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// WHOIS transport answering from a table of raw responses.
    #[derive(Default)]
    struct TableWhois(HashMap<&'static str, &'static str>);

    impl TableWhois {
        fn with(mut self, domain: &'static str, text: &'static str) -> Self {
            self.0.insert(domain, text);
            self
        }
    }

    #[async_trait]
    impl WhoisTransport for TableWhois {
        async fn fetch(&self, domain: &str) -> Result<WhoisResponse, LookupError> {
            match self.0.get(domain) {
                Some(text) => Ok(WhoisResponse {
                    server: "whois.test".to_string(),
                    text: text.to_string(),
                }),
                None => Err(LookupError::timeout(
                    format!("WHOIS query for {}", domain),
                    std::time::Duration::from_secs(1),
                )),
            }
        }
    }

    /// Resolver answering NS queries from a table; everything else is
    /// NXDOMAIN.
    #[derive(Default)]
    struct TableDns(HashMap<&'static str, Vec<&'static str>>);

    impl TableDns {
        fn with(mut self, domain: &'static str, nameservers: Vec<&'static str>) -> Self {
            self.0.insert(domain, nameservers);
            self
        }
    }

    #[async_trait]
    impl Resolve for TableDns {
        async fn query(
            &self,
            name: &str,
            record_type: RecordType,
        ) -> Result<Vec<String>, DnsError> {
            match (self.0.get(name), record_type) {
                (Some(records), RecordType::NS) => {
                    Ok(records.iter().map(|record| record.to_string()).collect())
                }
                _ => Err(DnsError::NxDomain {
                    domain: name.to_string(),
                }),
            }
        }
    }

    const EXAMPLE_WHOIS: &str = "\
Domain Name: EXAMPLE.COM
Registrar: RESERVED-Internet Assigned Numbers Authority
Registrant Organization: Internet Assigned Numbers Authority
";

    const IANA_SERVERS_WHOIS: &str = "\
Domain Name: IANA-SERVERS.NET
Registrar: Example Registrar, Inc.
";

    #[tokio::test]
    async fn test_full_inspection() {
        let inspector = Inspector::with_backends(
            TableWhois::default()
                .with("example.com", EXAMPLE_WHOIS)
                .with("iana-servers.net", IANA_SERVERS_WHOIS),
            TableDns::default().with(
                "example.com",
                vec!["a.iana-servers.net.", "b.iana-servers.net."],
            ),
        );

        let report = inspector.inspect("  Example.COM ").await;
        assert_eq!(report.domain, "example.com");
        assert_eq!(
            report.registrant,
            RegistrationField::Found("Internet Assigned Numbers Authority".to_string())
        );
        assert_eq!(
            report.registrar,
            RegistrationField::Found("RESERVED-Internet Assigned Numbers Authority".to_string())
        );
        assert_eq!(
            report.nameservers.records,
            vec!["a.iana-servers.net", "b.iana-servers.net"]
        );
        assert_eq!(
            report.hosting_provider,
            HostingProvider::Registrar("Example Registrar, Inc.".to_string())
        );
    }

    #[tokio::test]
    async fn test_nonexistent_domain() {
        let inspector = Inspector::with_backends(TableWhois::default(), TableDns::default());

        let report = inspector.inspect("does-not-exist.invalid").await;
        assert_eq!(report.registrant, RegistrationField::LookupFailed);
        assert_eq!(report.registrar, RegistrationField::LookupFailed);
        assert_eq!(report.registrant.to_string(), "WHOIS Lookup Failed");
        assert!(report.nameservers.error.is_some());
        assert_eq!(report.hosting_provider, HostingProvider::Skipped);
        assert_eq!(
            report.hosting_provider.to_string(),
            "Skipped (No nameserver found)."
        );
    }

    #[tokio::test]
    async fn test_registrant_prefers_name_over_org() {
        let inspector = Inspector::with_backends(
            TableWhois::default().with(
                "acme.test",
                "Domain Name: ACME.TEST\n\
                 Registrant Name: Jane Doe\n\
                 Registrant Organization: Acme Inc.\n",
            ),
            TableDns::default(),
        );

        let report = inspector.inspect("acme.test").await;
        assert_eq!(report.registrant, RegistrationField::Found("Jane Doe".to_string()));
        assert_eq!(report.registrar, RegistrationField::NotFound);
    }

    #[tokio::test]
    async fn test_registrar_falls_back_to_url() {
        let inspector = Inspector::with_backends(
            TableWhois::default().with(
                "acme.test",
                "Domain Name: ACME.TEST\nRegistrar URL: https://registrar.example\n",
            ),
            TableDns::default(),
        );

        let report = inspector.inspect("acme.test").await;
        assert_eq!(report.registrant, RegistrationField::NotFound);
        assert_eq!(report.registrar.to_string(), "URL: https://registrar.example");
    }

    #[tokio::test]
    async fn test_hosting_provider_owner_org_fallback() {
        let inspector = Inspector::with_backends(
            TableWhois::default()
                .with("acme.test", EXAMPLE_WHOIS)
                .with("dnshost.com", "Domain Name: DNSHOST.COM\norg: DNS Host Ltd\n"),
            TableDns::default().with("acme.test", vec!["ns1.dnshost.com."]),
        );

        let report = inspector.inspect("acme.test").await;
        assert_eq!(
            report.hosting_provider.to_string(),
            "Owner Org: DNS Host Ltd (Registrar Not Found)"
        );
    }

    #[tokio::test]
    async fn test_hosting_provider_owner_whois_failure() {
        let inspector = Inspector::with_backends(
            TableWhois::default().with("acme.test", EXAMPLE_WHOIS),
            TableDns::default().with("acme.test", vec!["ns1.example.co.uk."]),
        );

        let report = inspector.inspect("acme.test").await;
        assert_eq!(
            report.hosting_provider,
            HostingProvider::LookupFailed {
                owner_domain: "example.co.uk".to_string()
            }
        );
        assert_eq!(
            report.hosting_provider.to_string(),
            "WHOIS Lookup Failed for example.co.uk"
        );
    }

    #[tokio::test]
    async fn test_hosting_provider_owner_reported_free() {
        let inspector = Inspector::with_backends(
            TableWhois::default()
                .with("acme.test", EXAMPLE_WHOIS)
                .with("dnshost.de", "Domain: dnshost.de\nStatus: free\n"),
            TableDns::default().with("acme.test", vec!["ns1.dnshost.de."]),
        );

        let report = inspector.inspect("acme.test").await;
        assert_eq!(
            report.hosting_provider,
            HostingProvider::LookupFailed {
                owner_domain: "dnshost.de".to_string()
            }
        );
        assert_eq!(
            report.hosting_provider.to_string(),
            "WHOIS Lookup Failed for dnshost.de"
        );
    }

    #[tokio::test]
    async fn test_hosting_provider_unknown_owner() {
        let inspector = Inspector::with_backends(
            TableWhois::default().with("acme.test", EXAMPLE_WHOIS),
            TableDns::default().with("acme.test", vec!["ns1.internal"]),
        );

        let report = inspector.inspect("acme.test").await;
        assert_eq!(
            report.hosting_provider.to_string(),
            "Could not determine owner domain from 'ns1.internal'."
        );
    }

    #[tokio::test]
    async fn test_hosting_provider_not_found() {
        let inspector = Inspector::with_backends(
            TableWhois::default()
                .with("acme.test", EXAMPLE_WHOIS)
                .with("dnshost.com", "Domain Name: DNSHOST.COM\n"),
            TableDns::default().with("acme.test", vec!["ns1.dnshost.com"]),
        );

        let report = inspector.inspect("acme.test").await;
        assert_eq!(report.hosting_provider, HostingProvider::NotFound);
    }
}
