// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSRF-safe DNS resolver that blocks connections to private IP ranges.
//!
//! Base URLs are supplied by end users, so the proxy must never become a way
//! to reach the operator's internal network. Implements
//! `reqwest::dns::Resolve` to filter resolved addresses before any connection
//! is made, and checks literal IP hosts statically.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use cliniq_core::CliniqError;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::{info, warn};

/// DNS resolver that drops private/reserved addresses.
///
/// A hostname that resolves only to private addresses fails to resolve,
/// unless the address is on the configured allowlist.
#[derive(Debug, Clone, Default)]
pub struct SsrfSafeResolver {
    allowed_private_ips: Vec<IpAddr>,
}

impl SsrfSafeResolver {
    /// Create a new resolver with the given private IP allowlist.
    ///
    /// Unparseable entries are ignored; config validation reports them.
    pub fn new(allowed: &[String]) -> Self {
        let allowed_private_ips = allowed
            .iter()
            .filter_map(|s| s.parse::<IpAddr>().ok())
            .collect();
        Self {
            allowed_private_ips,
        }
    }

    /// Check if an IP is in a private or reserved range.
    ///
    /// Blocks: RFC 1918, loopback, link-local, CGNAT, broadcast, unspecified,
    /// cloud metadata, IPv6 loopback, unique-local, link-local, and
    /// IPv4-mapped IPv6 forms of all of the above.
    pub fn is_private(ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => is_private_v4(v4),
            IpAddr::V6(v6) => {
                if let Some(mapped) = v6.to_ipv4_mapped() {
                    return is_private_v4(&mapped);
                }
                v6.is_loopback()
                    || v6.is_unspecified()
                    || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7 unique local
                    || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10 link-local
            }
        }
    }

    fn permits(&self, ip: &IpAddr) -> bool {
        !Self::is_private(ip) || self.allowed_private_ips.contains(ip)
    }
}

fn is_private_v4(v4: &Ipv4Addr) -> bool {
    let [a, b, ..] = v4.octets();
    v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_broadcast()
        || v4.is_unspecified()
        || (a == 100 && (64..=127).contains(&b)) // 100.64.0.0/10 CGNAT
        || *v4 == Ipv4Addr::new(169, 254, 169, 254) // cloud metadata
}

impl Resolve for SsrfSafeResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        let hostname = name.as_str().to_string();

        Box::pin(async move {
            let host = format!("{hostname}:0");
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&host)
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?
                .collect();

            let filtered: Vec<SocketAddr> = addrs
                .into_iter()
                .filter(|addr| {
                    let ip = addr.ip();
                    let permitted = resolver.permits(&ip);
                    if !permitted {
                        warn!(ip = %ip, host = %hostname, "SSRF blocked: resolved to private IP");
                    } else if SsrfSafeResolver::is_private(&ip) {
                        info!(ip = %ip, host = %hostname, "allowing configured private IP");
                    }
                    permitted
                })
                .collect();

            if filtered.is_empty() {
                let err: Box<dyn std::error::Error + Send + Sync> =
                    format!("SSRF blocked: {hostname} resolves only to private IPs").into();
                return Err(err);
            }

            let addrs: Addrs = Box::new(filtered.into_iter());
            Ok(addrs)
        })
    }
}

/// Reject URLs whose host is a literal private IP.
///
/// This is a static check on the URL host. Hostnames are checked at connect
/// time by [`SsrfSafeResolver`].
pub fn validate_url_host(url: &url::Url, resolver: &SsrfSafeResolver) -> Result<(), CliniqError> {
    let ip = match url.host() {
        Some(url::Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(url::Host::Ipv6(v6)) => IpAddr::V6(v6),
        _ => return Ok(()),
    };

    if !resolver.permits(&ip) {
        warn!(ip = %ip, "SSRF blocked: URL targets private IP");
        return Err(CliniqError::InvalidInput(format!(
            "base_url targets a private address ({ip})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn parse(url: &str) -> url::Url {
        url::Url::parse(url).unwrap()
    }

    #[test]
    fn blocks_rfc1918_ranges() {
        for ip in [
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(172, 16, 0, 1),
            Ipv4Addr::new(172, 31, 255, 255),
            Ipv4Addr::new(192, 168, 1, 1),
        ] {
            assert!(SsrfSafeResolver::is_private(&IpAddr::V4(ip)), "{ip}");
        }
    }

    #[test]
    fn blocks_loopback_and_link_local_v4() {
        assert!(SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::new(
            127, 255, 255, 255
        ))));
        assert!(SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::new(
            169, 254, 1, 1
        ))));
    }

    #[test]
    fn blocks_metadata_and_cgnat() {
        assert!(SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::new(
            169, 254, 169, 254
        ))));
        assert!(SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::new(
            100, 64, 0, 1
        ))));
        assert!(!SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::new(
            100, 128, 0, 1
        ))));
    }

    #[test]
    fn blocks_unspecified_and_broadcast() {
        assert!(SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::UNSPECIFIED)));
        assert!(SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::BROADCAST)));
        assert!(SsrfSafeResolver::is_private(&IpAddr::V6(Ipv6Addr::UNSPECIFIED)));
    }

    #[test]
    fn blocks_private_v6() {
        assert!(SsrfSafeResolver::is_private(&IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(SsrfSafeResolver::is_private(&IpAddr::V6(Ipv6Addr::new(
            0xfd00, 0, 0, 0, 0, 0, 0, 1
        ))));
        assert!(SsrfSafeResolver::is_private(&IpAddr::V6(Ipv6Addr::new(
            0xfe80, 0, 0, 0, 0, 0, 0, 1
        ))));
    }

    #[test]
    fn blocks_ipv4_mapped_private_v6() {
        let mapped = Ipv4Addr::new(10, 1, 2, 3).to_ipv6_mapped();
        assert!(SsrfSafeResolver::is_private(&IpAddr::V6(mapped)));
    }

    #[test]
    fn allows_public_addresses() {
        assert!(!SsrfSafeResolver::is_private(&IpAddr::V4(Ipv4Addr::new(
            8, 8, 8, 8
        ))));
        assert!(!SsrfSafeResolver::is_private(&IpAddr::V6(Ipv6Addr::new(
            0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888
        ))));
    }

    #[test]
    fn allowlist_ignores_invalid_entries() {
        let resolver = SsrfSafeResolver::new(&[
            "10.0.0.1".to_string(),
            "192.168.1.100".to_string(),
            "invalid".to_string(),
        ]);
        assert_eq!(resolver.allowed_private_ips.len(), 2);
    }

    #[test]
    fn validate_url_host_blocks_private_literals() {
        let resolver = SsrfSafeResolver::default();
        for url in [
            "http://10.0.0.1:8080/api",
            "http://192.168.1.1/admin",
            "http://127.0.0.1/internal",
            "http://[::1]:5678/api/v1",
            "http://169.254.169.254/latest/meta-data",
        ] {
            let err = validate_url_host(&parse(url), &resolver).unwrap_err();
            assert!(matches!(err, CliniqError::InvalidInput(_)), "{url}");
        }
    }

    #[test]
    fn validate_url_host_honours_allowlist() {
        let resolver = SsrfSafeResolver::new(&["10.0.0.5".to_string()]);
        assert!(validate_url_host(&parse("http://10.0.0.5:5678/api/v1"), &resolver).is_ok());
        assert!(validate_url_host(&parse("http://10.0.0.6:5678/api/v1"), &resolver).is_err());
    }

    #[test]
    fn validate_url_host_allows_hostnames_and_public_ips() {
        let resolver = SsrfSafeResolver::default();
        assert!(validate_url_host(&parse("https://n8n.example.com/api/v1"), &resolver).is_ok());
        assert!(validate_url_host(&parse("https://1.1.1.1/"), &resolver).is_ok());
    }
}
