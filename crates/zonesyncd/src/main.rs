// # zonesyncd - Dynamic DNS Daemon
//
// Thin integration layer: reads configuration from environment variables,
// wires the WAN address resolver and the Route53 provider into the update
// engine, and handles process lifecycle. All update logic lives in
// zonesync-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Records
// - `ZONESYNC_HOSTED_ZONE_ID`: Route53 hosted zone ID (required)
// - `ZONESYNC_RECORDS`: Comma-separated records as `name:TYPE[:ttl]`,
//   e.g. `host.example.com:A,host.example.com:AAAA:60`
//
// ### Address families
// - `ZONESYNC_HANDLE_IPV4`: Resolve and apply WAN IPv4 (default: true)
// - `ZONESYNC_HANDLE_IPV6`: Resolve and apply WAN IPv6 (default: false)
//
// ### Schedule
// - `ZONESYNC_SCHEDULE`: Cron expression; empty or unset means run once
//   and exit
// - `ZONESYNC_TIMEZONE`: IANA time zone for schedule evaluation
//   (default: UTC)
//
// ### Resolver
// - `ZONESYNC_RESOLVER_V4_URL`: Override the IPv4 echo endpoint
// - `ZONESYNC_RESOLVER_V6_URL`: Override the IPv6 echo endpoint
//
// ### AWS credentials
// - `ZONESYNC_AWS_ACCESS_KEY_ID` / `ZONESYNC_AWS_SECRET_ACCESS_KEY`:
//   Static credentials; when unset the default AWS credential chain is
//   used (environment, shared config, instance metadata)
//
// ### Logging
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export ZONESYNC_HOSTED_ZONE_ID=Z2FDTNDATAQYW2
// export ZONESYNC_RECORDS=host.example.com:A
// export ZONESYNC_SCHEDULE="*/30 * * * *"
//
// zonesyncd
// ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use zonesync_core::{RecordSpec, UpdateEngine};
use zonesync_provider_route53::Route53Provider;
use zonesync_resolver_http::HttpResolver;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ZonesyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    hosted_zone_id: String,
    records: Vec<RecordSpec>,
    handle_ipv4: bool,
    handle_ipv6: bool,
    schedule: String,
    timezone: String,
    resolver_v4_url: Option<String>,
    resolver_v6_url: Option<String>,
    aws_access_key_id: Option<String>,
    aws_secret_access_key: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let records = env::var("ZONESYNC_RECORDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            hosted_zone_id: env::var("ZONESYNC_HOSTED_ZONE_ID").unwrap_or_default(),
            records,
            handle_ipv4: parse_bool_var("ZONESYNC_HANDLE_IPV4", true)?,
            handle_ipv6: parse_bool_var("ZONESYNC_HANDLE_IPV6", false)?,
            schedule: env::var("ZONESYNC_SCHEDULE").unwrap_or_default(),
            timezone: env::var("ZONESYNC_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            resolver_v4_url: env::var("ZONESYNC_RESOLVER_V4_URL").ok(),
            resolver_v6_url: env::var("ZONESYNC_RESOLVER_V6_URL").ok(),
            aws_access_key_id: env::var("ZONESYNC_AWS_ACCESS_KEY_ID").ok(),
            aws_secret_access_key: env::var("ZONESYNC_AWS_SECRET_ACCESS_KEY").ok(),
            log_level: env::var("ZONESYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs validation including:
    /// - Required field presence
    /// - Domain name format validation
    /// - Address family sanity checks
    /// - Time zone and log level enumeration
    fn validate(&self) -> Result<()> {
        if self.hosted_zone_id.is_empty() {
            anyhow::bail!(
                "ZONESYNC_HOSTED_ZONE_ID is required. \
                Set it via: export ZONESYNC_HOSTED_ZONE_ID=Z2FDTNDATAQYW2"
            );
        }

        if self.records.is_empty() {
            anyhow::bail!(
                "ZONESYNC_RECORDS must contain at least one record. \
                Set it via: export ZONESYNC_RECORDS=host.example.com:A"
            );
        }

        for record in &self.records {
            validate_domain_name(&record.name)?;
        }

        if !self.handle_ipv4 && !self.handle_ipv6 {
            anyhow::bail!(
                "At least one of ZONESYNC_HANDLE_IPV4 and ZONESYNC_HANDLE_IPV6 \
                must be enabled"
            );
        }

        // Static credentials must come as a pair
        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            anyhow::bail!(
                "ZONESYNC_AWS_ACCESS_KEY_ID and ZONESYNC_AWS_SECRET_ACCESS_KEY \
                must be set together (or both left unset for the default chain)"
            );
        }

        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            anyhow::bail!(
                "ZONESYNC_TIMEZONE '{}' is not a valid IANA time zone \
                (e.g. Europe/Paris, America/New_York, UTC)",
                self.timezone
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse one `name:TYPE[:ttl]` record entry
fn parse_record(entry: &str) -> Result<RecordSpec> {
    let mut parts = entry.split(':');
    let name = parts.next().unwrap_or_default();
    let kind = parts.next().ok_or_else(|| {
        anyhow::anyhow!(
            "Record entry '{}' is missing a type. \
            Expected name:TYPE[:ttl], e.g. host.example.com:A",
            entry
        )
    })?;

    let kind = kind
        .parse()
        .map_err(|e| anyhow::anyhow!("Record entry '{}': {}", entry, e))?;
    let mut spec = RecordSpec::new(name, kind);

    if let Some(ttl) = parts.next() {
        let ttl = ttl
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Record entry '{}' has a non-numeric TTL", entry))?;
        spec = spec.with_ttl(ttl);
    }

    if parts.next().is_some() {
        anyhow::bail!(
            "Record entry '{}' has too many fields. Expected name:TYPE[:ttl]",
            entry
        );
    }

    Ok(spec)
}

/// Parse a boolean environment variable
fn parse_bool_var(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{} '{}' is not a valid boolean (use true/false)", name, other),
        },
    }
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd daemon");
    info!("Configuration loaded: {} record(s)", config.records.len());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            ZonesyncExitCode::RuntimeError
        } else {
            ZonesyncExitCode::CleanShutdown
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let resolver = match (&config.resolver_v4_url, &config.resolver_v6_url) {
        (None, None) => HttpResolver::new(),
        (v4, v6) => HttpResolver::with_endpoints(
            v4.as_deref().unwrap_or("https://v4.ident.me"),
            v6.as_deref().unwrap_or("https://v6.ident.me"),
        ),
    };

    let provider = match (&config.aws_access_key_id, &config.aws_secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => {
            info!("Using static AWS credentials");
            Route53Provider::from_static_credentials(access_key_id, secret_access_key).await?
        }
        _ => {
            info!("Using default AWS credential chain");
            Route53Provider::from_default_chain().await
        }
    };

    let core_config = zonesync_core::Config {
        hosted_zone_id: config.hosted_zone_id.clone(),
        records: config.records.clone(),
        handle_ipv4: config.handle_ipv4,
        handle_ipv6: config.handle_ipv6,
        schedule: config.schedule.clone(),
        // Already validated
        timezone: config.timezone.parse().unwrap_or(chrono_tz::UTC),
    };

    for record in &core_config.records {
        info!("Managing record: {} ({})", record.name, record.kind);
    }

    let engine = Arc::new(UpdateEngine::new(core_config, Arc::new(resolver), Arc::new(provider))?);

    let mut runner = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.start().await }
    });

    tokio::select! {
        // Run-once mode finished, or the schedule was rejected
        joined = &mut runner => {
            joined??;
            info!("Update run complete");
        }
        received = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", received?);
            info!("Shutting down daemon");
            engine.close().await;
            runner.await??;
        }
    }

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(received)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonesync_core::RecordType;

    #[test]
    fn record_entry_parses_with_default_ttl() {
        let spec = parse_record("host.example.com:A").unwrap();
        assert_eq!(spec.name, "host.example.com");
        assert_eq!(spec.kind, RecordType::A);
        assert_eq!(spec.ttl, 300);
    }

    #[test]
    fn record_entry_parses_with_explicit_ttl() {
        let spec = parse_record("host.example.com:AAAA:60").unwrap();
        assert_eq!(spec.kind, RecordType::Aaaa);
        assert_eq!(spec.ttl, 60);
    }

    #[test]
    fn record_entry_rejects_missing_type() {
        assert!(parse_record("host.example.com").is_err());
    }

    #[test]
    fn record_entry_rejects_unknown_type() {
        assert!(parse_record("host.example.com:CNAME").is_err());
    }

    #[test]
    fn record_entry_rejects_extra_fields() {
        assert!(parse_record("host.example.com:A:300:extra").is_err());
    }

    #[test]
    fn domain_validation_accepts_normal_names() {
        assert!(validate_domain_name("host.example.com").is_ok());
        assert!(validate_domain_name("a-b.example.com").is_ok());
    }

    #[test]
    fn domain_validation_rejects_bad_labels() {
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("host..example.com").is_err());
        assert!(validate_domain_name("-host.example.com").is_err());
        assert!(validate_domain_name("ho_st.example.com").is_err());
    }
}
