//! SSRF guard: classifies an already-resolved address as safe-to-dial or
//! not, against a fixed RFC1918/loopback/link-local/CGN/cloud-metadata
//! blocklist, widened with multicast.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// True if `ip` is loopback, link-local, multicast, carrier-grade-NAT,
/// "this network" (0.0.0.0/8), or the cloud-metadata address, and therefore
/// must be refused unless the plugin's capability explicitly permits it.
pub fn is_blocked_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => is_blocked_v6(v6),
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    if ip == Ipv4Addr::new(169, 254, 169, 254) {
        return true; // cloud metadata endpoint
    }
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_unspecified()
        || is_cgn(ip)
        || ip.octets()[0] == 0
}

/// 100.64.0.0/10 — carrier-grade NAT space.
fn is_cgn(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_v4(v4);
    }
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || is_unique_local(ip)
        || is_link_local_v6(ip)
}

/// fc00::/7 — unique local addresses.
fn is_unique_local(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}

/// fe80::/10 — link-local.
fn is_link_local_v6(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_loopback_v4() {
        assert!(is_blocked_address("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn blocks_cloud_metadata() {
        assert!(is_blocked_address("169.254.169.254".parse().unwrap()));
    }

    #[test]
    fn blocks_rfc1918_ranges() {
        for ip in ["10.0.0.1", "172.16.0.1", "192.168.1.1"] {
            assert!(is_blocked_address(ip.parse().unwrap()), "{ip} should be blocked");
        }
    }

    #[test]
    fn blocks_carrier_grade_nat() {
        assert!(is_blocked_address("100.64.0.1".parse().unwrap()));
        assert!(!is_blocked_address("100.128.0.1".parse().unwrap()));
    }

    #[test]
    fn blocks_multicast() {
        assert!(is_blocked_address("224.0.0.1".parse().unwrap()));
    }

    #[test]
    fn allows_ordinary_public_v4() {
        assert!(!is_blocked_address("93.184.216.34".parse().unwrap()));
    }

    #[test]
    fn blocks_v6_loopback_and_link_local() {
        assert!(is_blocked_address("::1".parse().unwrap()));
        assert!(is_blocked_address("fe80::1".parse().unwrap()));
        assert!(is_blocked_address("fc00::1".parse().unwrap()));
    }

    #[test]
    fn blocks_v4_mapped_v6_private() {
        assert!(is_blocked_address("::ffff:10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn allows_ordinary_public_v6() {
        assert!(!is_blocked_address("2001:db8::1".parse().unwrap()));
    }
}
