//! DNSLookup CLI Application
//!
//! A command-line interface that reports who registered a domain, who its
//! registrar is, which nameservers it uses, and who hosts its DNS.
//! This CLI application is a thin layer over the dnslookup-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use dnslookup_lib::{ConfigManager, Inspector};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

const LONG_ABOUT: &str = "\
Get DNS and WHOIS info for a domain.

Outputs the Registrant, Registrar, Nameservers, and inferred
DNS Hosting Provider (Registrar of the nameserver's owner domain).

Definitions:
  - Registrant: The person or organisation who registered the domain.
  - Registrar: The company managing the domain's registration.
  - Nameservers: The Authoritative DNS Servers listed for the domain.
  - DNS Hosting Provider: The platform inferred to host the DNS Records
    (determined by WHOIS lookup on the nameserver's owner domain).

Configuration is read from ./dnslookup.toml, ~/.dnslookup.toml,
$XDG_CONFIG_HOME/dnslookup/config.toml and DNSLOOKUP_* environment
variables. Set RUST_LOG to adjust diagnostics on stderr.";

/// CLI arguments for dnslookup
#[derive(Parser, Debug)]
#[command(name = "dnslookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Get DNS and WHOIS info for a domain")]
#[command(long_about = LONG_ABOUT)]
#[command(styles = STYLES)]
pub struct Args {
    /// The domain name to check (e.g., example.com)
    #[arg(value_name = "DOMAIN", value_parser = parse_domain)]
    pub domain: String,
}

/// Accept any non-blank input; normalization happens in the library.
fn parse_domain(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("domain cannot be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging();

    let config = match ConfigManager::new().load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    tracing::debug!("Using configuration: {:?}", config);

    let domain = dnslookup_lib::normalize_domain(&args.domain);
    println!("{}", ui::render_header(&domain));

    let inspector = Inspector::from_config(&config);
    let report = inspector.inspect(&domain).await;

    println!("{}", ui::render_report(&report));
}
