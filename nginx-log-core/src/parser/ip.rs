use ipnet::IpNet;
use once_cell::sync::Lazy;
use std::net::IpAddr;

pub const INVALID_IP: &str = "invalid";

/// Loopback, private, link-local, shared, reserved, and multicast ranges.
static NON_PUBLIC_NETS: Lazy<Vec<IpNet>> = Lazy::new(|| {
    [
        "0.0.0.0/8",
        "10.0.0.0/8",
        "100.64.0.0/10",
        "127.0.0.0/8",
        "169.254.0.0/16",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "224.0.0.0/4",
        "240.0.0.0/4",
        "::/128",
        "::1/128",
        "fc00::/7",
        "fe80::/10",
        "ff00::/8",
    ]
    .iter()
    .filter_map(|cidr| cidr.parse().ok())
    .collect()
});

pub fn is_public_ip(ip: &IpAddr) -> bool {
    !NON_PUBLIC_NETS.iter().any(|net| net.contains(ip))
}

/// Resolve the client IP from `$remote_addr` or an X-Forwarded-For chain.
///
/// Rules:
/// - Walk the list left → right (left = original client)
/// - Return the first public IP
/// - Otherwise return the first syntactically valid IP
/// - Otherwise return the literal `"invalid"`
pub fn extract_real_ip(raw: &str) -> String {
    let ips: Vec<IpAddr> = raw.split(',').filter_map(parse_ip).collect();

    ips.iter()
        .find(|ip| is_public_ip(ip))
        .or_else(|| ips.first())
        .map(IpAddr::to_string)
        .unwrap_or_else(|| INVALID_IP.to_string())
}

fn parse_ip(candidate: &str) -> Option<IpAddr> {
    let candidate = candidate.trim();
    candidate
        .parse::<IpAddr>()
        .ok()
        .or_else(|| {
            candidate
                .strip_prefix('[')
                .and_then(|s| s.split(']').next())
                .and_then(|s| s.parse().ok())
        })
}
