use crate::parser::{extract_real_ip, is_public_ip};
use std::net::IpAddr;

#[test]
fn picks_first_public_ip_in_chain() {
    assert_eq!(extract_real_ip("10.0.0.1, 203.0.113.5, 8.8.8.8"), "203.0.113.5");
    assert_eq!(extract_real_ip("192.168.0.1,2001:4860::8888"), "2001:4860::8888");
}

#[test]
fn falls_back_to_first_valid_ip() {
    assert_eq!(extract_real_ip("192.168.1.1"), "192.168.1.1");
    assert_eq!(extract_real_ip("garbage, 127.0.0.1, 10.1.1.1"), "127.0.0.1");
}

#[test]
fn no_valid_ip_yields_invalid() {
    assert_eq!(extract_real_ip("unknown"), "invalid");
    assert_eq!(extract_real_ip(""), "invalid");
}

#[test]
fn bracketed_ipv6_is_accepted() {
    assert_eq!(extract_real_ip("[2001:db8::1]:443"), "2001:db8::1");
}

#[test]
fn classifies_non_public_ranges() {
    for ip in [
        "127.0.0.1",
        "10.2.3.4",
        "172.20.0.1",
        "192.168.1.1",
        "224.0.0.1",
        "::1",
        "fe80::1",
        "fd00::1",
    ] {
        let ip: IpAddr = ip.parse().unwrap();
        assert!(!is_public_ip(&ip), "{ip} should not be public");
    }
    assert!(is_public_ip(&"8.8.8.8".parse().unwrap()));
}
