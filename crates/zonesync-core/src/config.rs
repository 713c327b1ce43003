//! Configuration types for the zonesync system
//!
//! This module defines all configuration structures used throughout the crate.
//! The configuration is immutable for the lifetime of a run: it is built once
//! by the daemon (from environment variables) and handed to the engine.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Route53 hosted zone ID the record set lives in
    pub hosted_zone_id: String,

    /// DNS records to keep pointed at the WAN address
    pub records: Vec<RecordSpec>,

    /// Whether to resolve and apply the WAN IPv4 address
    #[serde(default = "default_true")]
    pub handle_ipv4: bool,

    /// Whether to resolve and apply the WAN IPv6 address
    #[serde(default)]
    pub handle_ipv6: bool,

    /// Cron schedule expression; empty string means run once and exit
    #[serde(default)]
    pub schedule: String,

    /// Time zone used for schedule evaluation and batch comments
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.hosted_zone_id.is_empty() {
            return Err(crate::Error::config("hosted zone ID cannot be empty"));
        }
        if self.records.is_empty() {
            return Err(crate::Error::config("no records configured"));
        }
        for record in &self.records {
            record.validate()?;
        }
        Ok(())
    }
}

/// A single DNS record to manage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Fully qualified record name (e.g., "host.example.com")
    pub name: String,

    /// Record type; decides which address family the record consumes
    #[serde(rename = "type")]
    pub kind: RecordType,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: i64,
}

impl RecordSpec {
    /// Create a new record spec with the default TTL
    pub fn new(name: impl Into<String>, kind: RecordType) -> Self {
        Self {
            name: name.into(),
            kind,
            ttl: default_ttl(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate the record spec
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("record name cannot be empty"));
        }
        if self.ttl < 0 {
            return Err(crate::Error::config(format!(
                "record {} has negative TTL {}",
                self.name, self.ttl
            )));
        }
        Ok(())
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::Aaaa => write!(f, "AAAA"),
        }
    }
}

impl std::str::FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::config(format!(
                "unsupported record type '{}' (expected A or AAAA)",
                other
            ))),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> i64 {
    300
}

fn default_timezone() -> Tz {
    chrono_tz::UTC
}
