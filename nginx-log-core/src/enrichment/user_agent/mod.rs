mod regex_engine;
mod woothee_engine;

#[cfg(test)]
mod tests;

use crate::conf::UaEngineKind;
use serde::{Deserialize, Serialize};

pub use regex_engine::RegexUaEngine;
pub use woothee_engine::WootheeEngine;

pub fn build_ua_engine(kind: UaEngineKind) -> UaEngine {
    match kind {
        UaEngineKind::Regex => UaEngine::Regex(RegexUaEngine::new()),
        UaEngineKind::Woothee => UaEngine::Woothee(WootheeEngine::new()),
    }
}

/// User-agent classifier capability.
///
/// Blank and `-` inputs classify as `Unknown` across the board; any other
/// input leaves unrecognized browser/OS fields empty and falls back to
/// `Desktop` for the device.
pub enum UaEngine {
    Regex(RegexUaEngine),
    Woothee(WootheeEngine),
}

impl UaEngine {
    pub fn classify(&self, ua: &str) -> UserAgentInfo {
        let ua = ua.trim();
        if ua.is_empty() || ua == "-" {
            return UserAgentInfo::unknown();
        }

        match self {
            UaEngine::Regex(p) => p.classify(ua),
            UaEngine::Woothee(p) => p.classify(ua),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgentInfo {
    pub browser: String,
    /// `major.minor`
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device_type: DeviceType,
}

impl UserAgentInfo {
    pub fn unknown() -> Self {
        Self {
            browser: "Unknown".to_string(),
            browser_version: String::new(),
            os: "Unknown".to_string(),
            os_version: String::new(),
            device_type: DeviceType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    #[default]
    Desktop,
    Mobile,
    Tablet,
    #[serde(rename = "iPhone")]
    IPhone,
    #[serde(rename = "iPad")]
    IPad,
    #[serde(rename = "iPod")]
    IPod,
    Bot,
    #[serde(rename = "TV")]
    Tv,
    #[serde(rename = "Game Console")]
    GameConsole,
    #[serde(rename = "Smart Speaker")]
    SmartSpeaker,
    Wearable,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "Desktop",
            DeviceType::Mobile => "Mobile",
            DeviceType::Tablet => "Tablet",
            DeviceType::IPhone => "iPhone",
            DeviceType::IPad => "iPad",
            DeviceType::IPod => "iPod",
            DeviceType::Bot => "Bot",
            DeviceType::Tv => "TV",
            DeviceType::GameConsole => "Game Console",
            DeviceType::SmartSpeaker => "Smart Speaker",
            DeviceType::Wearable => "Wearable",
            DeviceType::Unknown => "Unknown",
        }
    }
}

/// Reduce a dotted version to `major.minor`; a bare major gets `.0`.
pub(crate) fn major_minor(version: &str) -> String {
    let mut parts = version
        .split(['.', '_'])
        .map(str::trim)
        .filter(|p| !p.is_empty());

    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) if major.chars().all(|c| c.is_ascii_digit()) => {
            let minor: String = minor.chars().take_while(|c| c.is_ascii_digit()).collect();
            if minor.is_empty() {
                format!("{major}.0")
            } else {
                format!("{major}.{minor}")
            }
        }
        (Some(major), None) if major.chars().all(|c| c.is_ascii_digit()) => format!("{major}.0"),
        _ => String::new(),
    }
}
