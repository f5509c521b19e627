pub mod geoip;
pub mod user_agent;

pub use geoip::{GeoEngine, GeoInfo, GeoTable, MaxMindGeo, build_geo_engine};
pub use user_agent::{
    DeviceType, RegexUaEngine, UaEngine, UserAgentInfo, WootheeEngine, build_ua_engine,
};
