//! Host allow-list and IP block-list.
//!
//! # Responsibilities
//! - Decide, from the request head alone, whether a request may proceed
//! - Report a human-readable reason on rejection
//!
//! # Design Decisions
//! - Empty list = check disabled
//! - Host is checked before IP; the first failing check is reported
//! - Hosts compare case-insensitively; an allow-listed host without a port
//!   admits the same host on any port
//! - IPs compare in canonical form (`::ffff:10.0.0.1` equals `10.0.0.1`)

use std::net::IpAddr;

use thiserror::Error;

use crate::config::AccessConfig;

/// Why a request was refused. Rendered as a `403` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("Invalid Host")]
    InvalidHost,
    #[error("Blocked IP")]
    BlockedIp,
}

impl AccessDenied {
    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            AccessDenied::InvalidHost => "invalid_host",
            AccessDenied::BlockedIp => "blocked_ip",
        }
    }
}

/// Access rules for one server instance.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    valid_hosts: Vec<String>,
    blocked_ips: Vec<String>,
}

impl AccessPolicy {
    pub fn new<H, I>(valid_hosts: H, blocked_ips: I) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            valid_hosts: valid_hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .collect(),
            blocked_ips: blocked_ips
                .into_iter()
                .map(|ip| normalize_ip(ip.as_ref()))
                .collect(),
        }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(&config.valid_hosts, &config.blocked_ips)
    }

    pub fn is_disabled(&self) -> bool {
        self.valid_hosts.is_empty() && self.blocked_ips.is_empty()
    }

    /// Check the declared host and the resolved source IP.
    pub fn check(&self, host: Option<&str>, source_ip: Option<&str>) -> Result<(), AccessDenied> {
        if !self.valid_hosts.is_empty() && !host.is_some_and(|h| self.host_allowed(h)) {
            return Err(AccessDenied::InvalidHost);
        }

        if let Some(ip) = source_ip {
            let ip = normalize_ip(ip);
            if self.blocked_ips.iter().any(|blocked| *blocked == ip) {
                return Err(AccessDenied::BlockedIp);
            }
        }

        Ok(())
    }

    fn host_allowed(&self, host: &str) -> bool {
        let host = host.trim().to_ascii_lowercase();
        let bare = strip_port(&host);
        self.valid_hosts
            .iter()
            .any(|allowed| *allowed == host || *allowed == bare)
    }
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal: "[::1]:8080"
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

fn normalize_ip(ip: &str) -> String {
    let ip = ip.trim();
    match ip.parse::<IpAddr>() {
        Ok(addr) => addr.to_canonical().to_string(),
        Err(_) => ip.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_empty_policy_allows_everything() {
        let policy = AccessPolicy::default();
        assert!(policy.is_disabled());
        assert_eq!(policy.check(None, None), Ok(()));
        assert_eq!(policy.check(Some("anything"), Some("10.0.0.1")), Ok(()));
    }

    #[test]
    fn test_host_allow_list() {
        let policy = AccessPolicy::new(["API.example.com"], NONE);
        assert_eq!(policy.check(Some("api.example.com"), None), Ok(()));
        assert_eq!(policy.check(Some("Api.Example.Com:8443"), None), Ok(()));
        assert_eq!(policy.check(Some("evil.com"), None), Err(AccessDenied::InvalidHost));
        assert_eq!(policy.check(None, None), Err(AccessDenied::InvalidHost));
    }

    #[test]
    fn test_allow_listed_host_with_port_requires_that_port() {
        let policy = AccessPolicy::new(["localhost:3000"], NONE);
        assert_eq!(policy.check(Some("localhost:3000"), None), Ok(()));
        assert_eq!(policy.check(Some("localhost:4000"), None), Err(AccessDenied::InvalidHost));
    }

    #[test]
    fn test_ip_block_list() {
        let policy = AccessPolicy::new(NONE, ["203.0.113.9", "2001:db8::1"]);
        assert_eq!(policy.check(None, Some("203.0.113.9")), Err(AccessDenied::BlockedIp));
        assert_eq!(policy.check(None, Some("::ffff:203.0.113.9")), Err(AccessDenied::BlockedIp));
        assert_eq!(policy.check(None, Some("2001:DB8:0::1")), Err(AccessDenied::BlockedIp));
        assert_eq!(policy.check(None, Some("203.0.113.10")), Ok(()));
        assert_eq!(policy.check(None, None), Ok(()));
    }

    #[test]
    fn test_host_checked_first() {
        let policy = AccessPolicy::new(["good.com"], ["10.0.0.1"]);
        assert_eq!(
            policy.check(Some("bad.com"), Some("10.0.0.1")),
            Err(AccessDenied::InvalidHost)
        );
        assert_eq!(
            policy.check(Some("good.com"), Some("10.0.0.1")),
            Err(AccessDenied::BlockedIp)
        );
    }

    #[test]
    fn test_reason_and_message() {
        assert_eq!(AccessDenied::InvalidHost.to_string(), "Invalid Host");
        assert_eq!(AccessDenied::BlockedIp.to_string(), "Blocked IP");
        assert_eq!(AccessDenied::BlockedIp.reason(), "blocked_ip");
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.com:80"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
    }

    #[test]
    fn test_from_config() {
        let config = AccessConfig {
            valid_hosts: vec!["localhost".into()],
            blocked_ips: vec!["127.0.0.2".into()],
        };
        let policy = AccessPolicy::from_config(&config);
        assert_eq!(policy.check(Some("localhost:8443"), Some("127.0.0.1")), Ok(()));
        assert_eq!(
            policy.check(Some("localhost"), Some("127.0.0.2")),
            Err(AccessDenied::BlockedIp)
        );
    }
}
