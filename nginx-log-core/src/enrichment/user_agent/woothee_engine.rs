use crate::enrichment::user_agent::{DeviceType, UserAgentInfo, major_minor};
use woothee::parser::Parser;

const WOOTHEE_UNKNOWN: &str = "UNKNOWN";

pub struct WootheeEngine {
    parser: Parser,
}

impl WootheeEngine {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn classify(&self, ua: &str) -> UserAgentInfo {
        let Some(result) = self.parser.parse(ua) else {
            return UserAgentInfo::default();
        };

        let device_type = match result.category {
            "pc" => DeviceType::Desktop,
            "smartphone" => match result.os {
                "iPhone" => DeviceType::IPhone,
                "iPad" => DeviceType::IPad,
                "iPod" => DeviceType::IPod,
                _ if ua.contains("Android") && !ua.contains("Mobile") => DeviceType::Tablet,
                _ => DeviceType::Mobile,
            },
            "mobilephone" => DeviceType::Mobile,
            "crawler" => DeviceType::Bot,
            "appliance" => {
                if result.name.contains("PlayStation") || result.name.contains("Nintendo") {
                    DeviceType::GameConsole
                } else {
                    DeviceType::Tv
                }
            }
            _ => DeviceType::Desktop,
        };

        let browser = known(result.name);
        let os = known(result.os);
        let os_version = if os.is_empty() {
            String::new()
        } else {
            major_minor(&result.os_version.to_string())
        };

        UserAgentInfo {
            browser_version: if browser.is_empty() {
                String::new()
            } else {
                major_minor(result.version)
            },
            browser,
            os,
            os_version,
            device_type,
        }
    }
}

impl Default for WootheeEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn known(value: &str) -> String {
    if value == WOOTHEE_UNKNOWN {
        String::new()
    } else {
        value.to_string()
    }
}
