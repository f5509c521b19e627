use crate::enrichment::geoip::GeoInfo;
use crate::parser::is_public_ip;
use maxminddb::PathElement;
use std::net::IpAddr;
use std::path::Path;

/// Names are read in this order of preference.
const NAME_LANGUAGES: &[&str] = &["zh-CN", "en"];

pub struct MaxMindGeo {
    city_reader: maxminddb::Reader<maxminddb::Mmap>,
}

impl MaxMindGeo {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        // Safety note on the memory-mapped database...
        // - File is opened read-only
        // - Lifetime is bound to MaxMindGeo
        // - The engine never mutates the mmdb file
        let city_reader = unsafe { maxminddb::Reader::open_mmap(path)? };
        tracing::info!(path = %path.display(), "geoip database loaded");
        Ok(Self { city_reader })
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<GeoInfo> {
        if !is_public_ip(&ip) {
            return None;
        }

        let lookup = self.city_reader.lookup(ip).ok()?;

        let region_code = lookup
            .decode_path::<String>(&[PathElement::Key("country"), PathElement::Key("iso_code")])
            .ok()
            .flatten()
            .unwrap_or_default();

        let province = NAME_LANGUAGES
            .iter()
            .find_map(|&lang| {
                lookup
                    .decode_path::<String>(&[
                        PathElement::Key("subdivisions"),
                        PathElement::Index(0),
                        PathElement::Key("names"),
                        PathElement::Key(lang),
                    ])
                    .ok()
                    .flatten()
            })
            .unwrap_or_default();

        let city = NAME_LANGUAGES
            .iter()
            .find_map(|&lang| {
                lookup
                    .decode_path::<String>(&[
                        PathElement::Key("city"),
                        PathElement::Key("names"),
                        PathElement::Key(lang),
                    ])
                    .ok()
                    .flatten()
            })
            .unwrap_or_default();

        let geo = GeoInfo {
            region_code,
            province,
            city,
        };

        geo.has_some_info().then_some(geo)
    }
}
