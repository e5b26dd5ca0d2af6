//! Report rendering for the dnslookup CLI.
//!
//! Labels are styled with `console`, which drops the escape codes when
//! stdout is not a terminal or `NO_COLOR` is set.

use console::style;
use dnslookup_lib::{DnsRecords, DomainReport, HostingProvider, RegistrationField};

/// Banner printed before any lookup starts.
pub fn render_header(domain: &str) -> String {
    format!(
        "{}\n",
        style(format!("--- Checking Domain: {} ---", domain)).bold()
    )
}

/// Everything after the banner: the four fields and the footer.
pub fn render_report(report: &DomainReport) -> String {
    let mut lines = vec![
        field_line("Domain Registrant", &registration(&report.registrant)),
        field_line("Domain Registrar", &registration(&report.registrar)),
        nameserver_line(&report.nameservers),
        field_line(
            "Inferred DNS Hosting Provider",
            &hosting_provider(&report.hosting_provider),
        ),
    ];

    lines.push(String::new());
    lines.push(
        style(format!("--- Check Complete for: {} ---", report.domain))
            .bold()
            .to_string(),
    );

    lines.join("\n")
}

fn field_line(label: &str, value: &str) -> String {
    format!("{} {}", style(format!("{}:", label)).cyan().bold(), value)
}

fn nameserver_line(nameservers: &DnsRecords) -> String {
    if let Some(error) = &nameservers.error {
        format!("{} {}", style("Error:").red().bold(), error)
    } else if !nameservers.records.is_empty() {
        field_line("Nameservers", &nameservers.records.join(", "))
    } else {
        style("No nameservers identified.").yellow().to_string()
    }
}

fn registration(field: &RegistrationField) -> String {
    match field {
        RegistrationField::Found(_) | RegistrationField::Url(_) => field.to_string(),
        RegistrationField::NotFound => style(field).dim().to_string(),
        RegistrationField::LookupFailed => style(field).red().to_string(),
    }
}

fn hosting_provider(provider: &HostingProvider) -> String {
    match provider {
        HostingProvider::Registrar(_) | HostingProvider::OwnerOrg(_) => provider.to_string(),
        HostingProvider::NotFound | HostingProvider::Skipped => style(provider).dim().to_string(),
        HostingProvider::LookupFailed { .. } | HostingProvider::UnknownOwner { .. } => {
            style(provider).red().to_string()
        }
    }
}
