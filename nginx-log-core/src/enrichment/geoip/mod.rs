mod maxmind;
mod table;


use crate::conf::EnrichmentConfig;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub use maxmind::MaxMindGeo;
pub use table::GeoTable;

/// Build the geolocation collaborator described by the enrichment config.
pub fn build_geo_engine(cfg: &EnrichmentConfig) -> anyhow::Result<Option<GeoEngine>> {
    match (cfg.enable_geoip, &cfg.geoip_db) {
        (true, Some(path)) => Ok(Some(GeoEngine::MaxMind(MaxMindGeo::open(path)?))),
        _ => Ok(None),
    }
}

/// Geolocation capability: `lookup(ip) -> {region_code, province, city}`.
pub enum GeoEngine {
    MaxMind(MaxMindGeo),
    /// Static CIDR table, used for offline deployments and tests.
    Table(GeoTable),
}

impl GeoEngine {
    pub fn lookup(&self, ip: IpAddr) -> Option<GeoInfo> {
        match self {
            GeoEngine::MaxMind(g) => g.lookup(ip),
            GeoEngine::Table(t) => t.lookup(ip),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    /// ISO country code, e.g. CN, US
    pub region_code: String,
    pub province: String,
    pub city: String,
}

impl GeoInfo {
    pub fn new(
        region_code: impl Into<String>,
        province: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            region_code: region_code.into(),
            province: province.into(),
            city: city.into(),
        }
    }

    pub fn has_some_info(&self) -> bool {
        !self.region_code.is_empty() || !self.province.is_empty() || !self.city.is_empty()
    }
}
