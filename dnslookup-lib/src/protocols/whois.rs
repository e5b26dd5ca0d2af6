//! WHOIS protocol implementation.
//!
//! Two transports fetch raw WHOIS text: a native TCP port 43 client that
//! walks the IANA -> registry -> registrar referral chain, and a wrapper
//! around the system's `whois` command. [`WhoisClient`] turns that text
//! into a [`WhoisRecord`] and reports every failure as a warning.

use crate::error::LookupError;
use crate::protocols::parser::{classify_response, find_referral_server};
use crate::types::{LookupConfig, WhoisRecord, WhoisTransportKind};
use crate::utils::extract_tld;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::process::Command;

/// Standard WHOIS port.
pub const WHOIS_PORT: u16 = 43;

/// Raw text returned by a transport, with the server that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisResponse {
    pub server: String,
    pub text: String,
}

/// Something that can fetch raw WHOIS text for a domain.
#[async_trait]
pub trait WhoisTransport: Send + Sync {
    async fn fetch(&self, domain: &str) -> Result<WhoisResponse, LookupError>;
}

/// Native WHOIS over TCP.
///
/// The TLD's registry server is discovered from the root referral server
/// (`whois.iana.org` by default). When the registry names a separate
/// registrar WHOIS server, that server is queried too and its answer is
/// appended after the registry's.
#[derive(Debug, Clone)]
pub struct SocketTransport {
    root_server: String,
    port: u16,
    timeout: Duration,
    follow_referrals: bool,
}

impl SocketTransport {
    /// Create a socket transport with default settings.
    pub fn new() -> Self {
        Self {
            root_server: "whois.iana.org".to_string(),
            port: WHOIS_PORT,
            timeout: Duration::from_secs(10),
            follow_referrals: true,
        }
    }

    pub fn with_root_server<S: Into<String>>(mut self, server: S) -> Self {
        self.root_server = server.into();
        self
    }

    /// Use a non-standard port for every server in the chain.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_follow_referrals(mut self, enabled: bool) -> Self {
        self.follow_referrals = enabled;
        self
    }

    /// Send one query line to `server` and read until it closes.
    async fn query_server(
        &self,
        domain: &str,
        server: &str,
        query: &str,
    ) -> Result<String, LookupError> {
        tracing::debug!("WHOIS query '{}' -> {}:{}", query, server, self.port);

        let exchange = async {
            let mut stream = TcpStream::connect((server, self.port)).await?;
            stream.write_all(format!("{}\r\n", query).as_bytes()).await?;
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await?;
            Ok::<_, std::io::Error>(String::from_utf8_lossy(&buf).into_owned())
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => Err(LookupError::timeout(
                format!("WHOIS query to {}", server),
                self.timeout,
            )),
            Ok(Err(e)) => Err(LookupError::command_failed(
                domain,
                format!("connection to {}:{} failed: {}", server, self.port, e),
            )),
            Err(_) => Err(LookupError::timeout(
                format!("WHOIS query to {}", server),
                self.timeout,
            )),
        }
    }
}

impl Default for SocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisTransport for SocketTransport {
    async fn fetch(&self, domain: &str) -> Result<WhoisResponse, LookupError> {
        let tld = extract_tld(domain)?;

        let root_answer = self.query_server(domain, &self.root_server, &tld).await?;
        let registry = parse_iana_refer_response(&root_answer)
            .ok_or_else(|| LookupError::unknown_tld(domain))?;

        let mut text = self.query_server(domain, &registry, domain).await?;
        let mut server = registry.clone();

        if self.follow_referrals {
            if let Some(referral) = find_referral_server(&text) {
                if !referral.eq_ignore_ascii_case(&registry) {
                    match self.query_server(domain, &referral, domain).await {
                        Ok(extra) => {
                            text.push('\n');
                            text.push_str(&extra);
                            server = referral;
                        }
                        Err(e) => {
                            tracing::debug!(
                                "Referral to {} failed for '{}': {}",
                                referral,
                                domain,
                                e
                            );
                        }
                    }
                }
            }
        }

        Ok(WhoisResponse { server, text })
    }
}

/// WHOIS through the system's `whois` command-line tool.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    program: String,
    timeout: Duration,
}

impl CommandTransport {
    /// Create a command transport running `whois` with a 10 second timeout.
    pub fn new() -> Self {
        Self {
            program: "whois".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a different executable instead of `whois`.
    pub fn with_program<S: Into<String>>(mut self, program: S) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for CommandTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisTransport for CommandTransport {
    async fn fetch(&self, domain: &str) -> Result<WhoisResponse, LookupError> {
        let mut command = Command::new(&self.program);
        command.arg(domain).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(LookupError::command_failed(
                    domain,
                    format!(
                        "Failed to execute {} command: {}. Make sure '{}' is installed.",
                        self.program, e, self.program
                    ),
                ))
            }
            Err(_) => return Err(LookupError::timeout("WHOIS command", self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LookupError::command_failed(
                domain,
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        Ok(WhoisResponse {
            server: self.program.clone(),
            text: stdout,
        })
    }
}

/// Build the transport selected by `config`.
pub fn transport_from_config(config: &LookupConfig) -> Box<dyn WhoisTransport> {
    match config.whois_transport {
        WhoisTransportKind::Socket => Box::new(
            SocketTransport::new()
                .with_root_server(config.whois_server.clone())
                .with_timeout(config.whois_timeout)
                .with_follow_referrals(config.follow_referrals),
        ),
        WhoisTransportKind::Command => {
            Box::new(CommandTransport::new().with_timeout(config.whois_timeout))
        }
    }
}

/// WHOIS client that never fails outward.
///
/// [`WhoisClient::lookup`] returns `None` on any failure after logging a
/// warning; [`WhoisClient::query`] returns the classified error instead.
pub struct WhoisClient {
    transport: Box<dyn WhoisTransport>,
}

impl WhoisClient {
    /// Create a client over any transport.
    pub fn new<T: WhoisTransport + 'static>(transport: T) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// Create a client with the transport selected by `config`.
    pub fn from_config(config: &LookupConfig) -> Self {
        Self {
            transport: transport_from_config(config),
        }
    }

    /// Fetch, classify and parse the WHOIS record for `domain`.
    pub async fn query(&self, domain: &str) -> Result<WhoisRecord, LookupError> {
        let response = self.transport.fetch(domain).await?;
        classify_response(domain, &response.server, &response.text)
    }

    /// Fetch the WHOIS record for `domain`, or `None` on any failure.
    pub async fn lookup(&self, domain: &str) -> Option<WhoisRecord> {
        match self.query(domain).await {
            Ok(record) => Some(record),
            Err(e) => {
                report_failure(domain, &e);
                None
            }
        }
    }
}

fn report_failure(domain: &str, error: &LookupError) {
    match error {
        LookupError::UnknownTld { .. } => {
            tracing::warn!("WHOIS lookup failed for '{}'. Unknown TLD.", domain);
        }
        LookupError::CommandFailed { message, .. } => {
            tracing::warn!("WHOIS command execution failed for '{}': {}", domain, message);
        }
        e if e.is_protocol_error() => {
            tracing::warn!("WHOIS lookup error for '{}': {}", domain, e);
        }
        LookupError::Timeout { .. } => {
            tracing::warn!("WHOIS lookup for '{}' timed out.", domain);
        }
        _ => {
            tracing::warn!(
                "An unexpected error occurred during WHOIS lookup for '{}': {}",
                domain,
                error
            );
        }
    }
}

/// Parse an IANA WHOIS response for the authoritative WHOIS server.
///
/// The IANA WHOIS response may use either `refer:` or `whois:` to indicate
/// the authoritative WHOIS server for a TLD. `refer:` wins when present.
///
/// ```text
/// whois:        whois.verisign-grs.com
/// refer:        whois.verisign-grs.com
/// ```
pub fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line_trimmed = line.trim();
        if let Some(server) = line_trimmed.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line_trimmed.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WhoisValue;
    use std::collections::HashMap;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    /// Serve canned answers keyed by query line, one connection at a time.
    async fn spawn_whois_server(answers: HashMap<&'static str, String>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let (read_half, mut write_half) = stream.into_split();
                let mut line = String::new();
                BufReader::new(read_half).read_line(&mut line).await.unwrap();
                let answer = answers.get(line.trim()).cloned().unwrap_or_default();
                write_half.write_all(answer.as_bytes()).await.unwrap();
                write_half.shutdown().await.unwrap();
            }
        });

        port
    }

    struct CannedTransport(Result<WhoisResponse, LookupError>);

    #[async_trait]
    impl WhoisTransport for CannedTransport {
        async fn fetch(&self, _domain: &str) -> Result<WhoisResponse, LookupError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_parse_iana_refer_response() {
        let response = "% IANA WHOIS server\n\
                        % for more information on IANA, visit http://www.iana.org\n\n\
                        refer:        whois.verisign-grs.com\n\n\
                        domain:       COM\n";
        assert_eq!(
            parse_iana_refer_response(response),
            Some("whois.verisign-grs.com".to_string())
        );

        let no_refer = "% IANA WHOIS server\ndomain: TEST\nstatus: ACTIVE\n";
        assert_eq!(parse_iana_refer_response(no_refer), None);

        let empty_refer = "refer:        \ndomain: COM\n";
        assert_eq!(parse_iana_refer_response(empty_refer), None);

        let whois_field = "% IANA WHOIS server\n\n\
                           whois:        whois.verisign-grs.com\n\n\
                           domain:       COM\n\
                           status:       ACTIVE\n";
        assert_eq!(
            parse_iana_refer_response(whois_field),
            Some("whois.verisign-grs.com".to_string())
        );

        let both_fields = "whois:        whois.old-server.com\n\
                           refer:        whois.correct-server.com\n\
                           domain:       COM\n";
        assert_eq!(
            parse_iana_refer_response(both_fields),
            Some("whois.correct-server.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_socket_transport_follows_referral_chain() {
        let answers = HashMap::from([
            ("test", "refer: 127.0.0.1\n".to_string()),
            (
                "acme.test",
                "Domain Name: ACME.TEST\n\
                 Registrar WHOIS Server: localhost\n\
                 Registrar: Registry View LLC\n"
                    .to_string(),
            ),
        ]);
        let port = spawn_whois_server(answers).await;

        let transport = SocketTransport::new()
            .with_root_server("127.0.0.1")
            .with_port(port)
            .with_timeout(Duration::from_secs(5));
        let response = transport.fetch("acme.test").await.unwrap();

        // localhost answers with the same canned registry text
        assert_eq!(response.server, "localhost");
        assert!(response.text.starts_with("Domain Name: ACME.TEST"));
        assert_eq!(response.text.matches("Registry View LLC").count(), 2);
    }

    #[tokio::test]
    async fn test_socket_transport_without_referrals() {
        let answers = HashMap::from([
            ("test", "refer: 127.0.0.1\n".to_string()),
            (
                "acme.test",
                "Domain Name: ACME.TEST\nRegistrar WHOIS Server: localhost\n".to_string(),
            ),
        ]);
        let port = spawn_whois_server(answers).await;

        let transport = SocketTransport::new()
            .with_root_server("127.0.0.1")
            .with_port(port)
            .with_follow_referrals(false);
        let response = transport.fetch("acme.test").await.unwrap();

        assert_eq!(response.server, "127.0.0.1");
        assert_eq!(response.text.matches("Domain Name").count(), 1);
    }

    #[tokio::test]
    async fn test_socket_transport_unknown_tld() {
        let answers = HashMap::from([("zz", "% This query returned 0 objects.\n".to_string())]);
        let port = spawn_whois_server(answers).await;

        let transport = SocketTransport::new().with_root_server("127.0.0.1").with_port(port);
        let err = transport.fetch("example.zz").await.unwrap_err();
        assert!(matches!(err, LookupError::UnknownTld { .. }));

        let err = transport.fetch("localhost").await.unwrap_err();
        assert!(matches!(err, LookupError::UnknownTld { .. }));
    }

    #[tokio::test]
    async fn test_socket_transport_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            // Accept and hold the connection without answering
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let transport = SocketTransport::new()
            .with_root_server("127.0.0.1")
            .with_port(port)
            .with_timeout(Duration::from_millis(200));
        let err = transport.fetch("example.com").await.unwrap_err();
        assert!(matches!(err, LookupError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_command_transport_missing_binary() {
        let transport = CommandTransport::new().with_program("whois-binary-that-does-not-exist");
        let err = transport.fetch("example.com").await.unwrap_err();
        match err {
            LookupError::CommandFailed { domain, message } => {
                assert_eq!(domain, "example.com");
                assert!(message.contains("Make sure"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_lookup_returns_record() {
        let client = WhoisClient::new(CannedTransport(Ok(WhoisResponse {
            server: "whois.example".to_string(),
            text: "Domain Name: EXAMPLE.COM\nRegistrar: Example Registrar\n".to_string(),
        })));

        let record = client.lookup("example.com").await.unwrap();
        assert_eq!(record.get("registrar"), Some(&WhoisValue::from("Example Registrar")));
    }

    #[tokio::test]
    async fn test_client_lookup_absorbs_every_failure() {
        let failures = vec![
            LookupError::unknown_tld("example.zz"),
            LookupError::command_failed("example.com", "no such file"),
            LookupError::protocol("example.com", "garbage"),
            LookupError::timeout("WHOIS query", Duration::from_secs(1)),
            LookupError::unclassified("surprise"),
        ];

        for failure in failures {
            let client = WhoisClient::new(CannedTransport(Err(failure)));
            assert!(client.lookup("example.com").await.is_none());
        }

        let not_found = WhoisClient::new(CannedTransport(Ok(WhoisResponse {
            server: "whois.example".to_string(),
            text: "No match for \"EXAMPLE.COM\".\n".to_string(),
        })));
        assert!(not_found.lookup("example.com").await.is_none());
        assert!(matches!(
            not_found.query("example.com").await,
            Err(LookupError::DomainNotFound { .. })
        ));
    }

    #[test]
    fn test_transport_from_config() {
        // Both kinds build without touching the network
        let socket = LookupConfig::default();
        let _ = transport_from_config(&socket);

        let command = LookupConfig::default().with_whois_transport(WhoisTransportKind::Command);
        let _ = WhoisClient::from_config(&command);
    }
}
