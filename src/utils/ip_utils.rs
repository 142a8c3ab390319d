//! Host classification helpers used by optimizers and diagnostics

use std::net::IpAddr;

/// Check if a string is a literal IP address (IPv4 or IPv6)
pub fn is_valid_ip(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

/// Check if a host is the unspecified ("bind everywhere") address
pub fn is_wildcard_host(host: &str) -> bool {
    match host.parse::<IpAddr>() {
        Ok(ip) => ip.is_unspecified(),
        Err(_) => false,
    }
}

/// Check if a host is a loopback address or `localhost`
pub fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(ip) => ip.is_loopback(),
        Err(_) => false,
    }
}

/// Check if an IP host is not reachable from the public Internet.
///
/// Covers RFC 1918 and link-local ranges for IPv4, RFC 4193 unique local and
/// link-local ranges for IPv6, plus loopback and unspecified addresses.
/// Host names are not resolved and are reported as not private.
pub fn is_private_host(host: &str) -> bool {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ipv4)) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        Ok(IpAddr::V6(ipv6)) => {
            let segments = ipv6.segments();
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // fc00::/7
                || segments[0] & 0xfe00 == 0xfc00
                // fe80::/10
                || segments[0] & 0xffc0 == 0xfe80
        }
        Err(_) => is_loopback_host(host),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_hosts() {
        assert!(is_private_host("10.1.2.3"));
        assert!(is_private_host("172.16.0.1"));
        assert!(is_private_host("192.168.1.1"));
        assert!(is_private_host("127.0.0.1"));
        assert!(is_private_host("0.0.0.0"));
        assert!(is_private_host("fd00::1"));
        assert!(is_private_host("fe80::1"));
        assert!(is_private_host("localhost"));

        assert!(!is_private_host("203.0.113.9"));
        assert!(!is_private_host("172.32.0.1"));
        assert!(!is_private_host("2001:db8::1"));
        assert!(!is_private_host("example.org"));
    }

    #[test]
    fn test_wildcard_and_loopback() {
        assert!(is_wildcard_host("0.0.0.0"));
        assert!(is_wildcard_host("::"));
        assert!(!is_wildcard_host("127.0.0.1"));
        assert!(is_loopback_host("::1"));
        assert!(is_loopback_host("LOCALHOST"));
        assert!(!is_loopback_host("10.0.0.1"));
        assert!(is_valid_ip("::1"));
        assert!(!is_valid_ip("any"));
    }
}
