use crate::enrichment::geoip::GeoInfo;
use ipnet::IpNet;
use std::net::IpAddr;

/// Longest-prefix CIDR table.
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    entries: Vec<(IpNet, GeoInfo)>,
}

impl GeoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, net: IpNet, info: GeoInfo) {
        self.entries.push((net, info));
        // Most specific network first so the first hit is the longest prefix.
        self.entries
            .sort_by(|(a, _), (b, _)| b.prefix_len().cmp(&a.prefix_len()));
    }

    pub fn with(mut self, cidr: &str, info: GeoInfo) -> anyhow::Result<Self> {
        self.insert(cidr.parse()?, info);
        Ok(self)
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<GeoInfo> {
        self.entries
            .iter()
            .find(|(net, _)| net.contains(&ip))
            .map(|(_, info)| info.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
