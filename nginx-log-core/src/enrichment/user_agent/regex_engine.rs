use crate::enrichment::user_agent::{DeviceType, UserAgentInfo};
use once_cell::sync::Lazy;
use regex::Regex;

struct Pattern {
    name: &'static str,
    re: Regex,
}

fn pattern(name: &'static str, re: &str) -> Pattern {
    Pattern {
        name,
        re: Regex::new(re).expect("static user-agent pattern"),
    }
}

// First match wins. Chromium derivatives must come before Chrome and
// everything carrying `Version/x Safari` must come after them.
static BROWSERS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        pattern("Edge", r"Edg(?:e|A|iOS)?/(\d+)(?:\.(\d+))?"),
        pattern("Opera", r"(?:OPR|Opera)/(\d+)(?:\.(\d+))?"),
        pattern("Samsung Browser", r"SamsungBrowser/(\d+)(?:\.(\d+))?"),
        pattern("UC Browser", r"UCBrowser/(\d+)(?:\.(\d+))?"),
        pattern("WeChat", r"MicroMessenger/(\d+)(?:\.(\d+))?"),
        pattern("QQ Browser", r"MQQBrowser/(\d+)(?:\.(\d+))?|QQBrowser/(\d+)(?:\.(\d+))?"),
        pattern("Yandex", r"YaBrowser/(\d+)(?:\.(\d+))?"),
        pattern("Vivaldi", r"Vivaldi/(\d+)(?:\.(\d+))?"),
        pattern("Firefox", r"(?:Firefox|FxiOS)/(\d+)(?:\.(\d+))?"),
        pattern("Chrome", r"(?:Chrome|CriOS)/(\d+)(?:\.(\d+))?"),
        pattern("Safari", r"Version/(\d+)(?:\.(\d+))?.*Safari/"),
        pattern("Internet Explorer", r"MSIE (\d+)(?:\.(\d+))?|Trident/.*rv:(\d+)(?:\.(\d+))?"),
        pattern("curl", r"curl/(\d+)(?:\.(\d+))?"),
        pattern("Wget", r"Wget/(\d+)(?:\.(\d+))?"),
        pattern("Python Requests", r"python-requests/(\d+)(?:\.(\d+))?"),
        pattern("Go HTTP Client", r"Go-http-client/(\d+)(?:\.(\d+))?"),
        pattern("Googlebot", r"Googlebot/(\d+)(?:\.(\d+))?"),
        pattern("Bingbot", r"bingbot/(\d+)(?:\.(\d+))?"),
        pattern("Baiduspider", r"Baiduspider/(\d+)(?:\.(\d+))?"),
    ]
});

// iOS before macOS (iPad UAs mention "like Mac OS X"); Android before Linux.
static OPERATING_SYSTEMS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        pattern("Windows Phone", r"Windows Phone(?: OS)? (\d+)(?:\.(\d+))?"),
        pattern("Windows", r"Windows NT (\d+)(?:\.(\d+))?"),
        pattern("iOS", r"(?:iPhone|iPad|iPod).*? OS (\d+)(?:_(\d+))?"),
        pattern("macOS", r"Mac OS X (\d+)(?:[_.](\d+))?"),
        pattern("HarmonyOS", r"HarmonyOS(?:[ /](\d+)(?:\.(\d+))?)?"),
        pattern("Android", r"Android[ /]?(\d+)?(?:\.(\d+))?"),
        pattern("Chrome OS", r"CrOS \S+ (\d+)(?:\.(\d+))?"),
        pattern("Ubuntu", r"Ubuntu(?:/(\d+)(?:\.(\d+))?)?"),
        pattern("Linux", r"Linux"),
    ]
});

static BOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bot\b|bot/|crawler|spider|slurp|crawl|bingpreview|facebookexternalhit|headlesschrome")
        .expect("static bot pattern")
});
static TV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)smart-?tv|hbbtv|appletv|googletv|android tv|\btv\b|roku|crkey|bravia|webos")
        .expect("static tv pattern")
});
static CONSOLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)playstation|xbox|nintendo").expect("static console pattern")
});
static SPEAKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)alexa|\becho\b|homepod|google home").expect("static speaker pattern")
});
static WEARABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)watch|wear os|wearable").expect("static wearable pattern")
});
static OTHER_MOBILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)windows phone|blackberry|opera mini|iemobile|harmonyos.*mobile")
        .expect("static mobile pattern")
});

/// Regex-driven classifier; the default engine.
pub struct RegexUaEngine;

impl RegexUaEngine {
    pub fn new() -> Self {
        // Force compilation up front instead of on the first parsed line.
        Lazy::force(&BROWSERS);
        Lazy::force(&OPERATING_SYSTEMS);
        Self
    }

    pub fn classify(&self, ua: &str) -> UserAgentInfo {
        let (browser, browser_version) = match_versioned(&BROWSERS, ua);
        let (os, os_version) = match_versioned(&OPERATING_SYSTEMS, ua);

        let (os, os_version) = match os.as_str() {
            "Windows" => windows_release(&os_version),
            _ => (os, os_version),
        };

        UserAgentInfo {
            browser,
            browser_version,
            os,
            os_version,
            device_type: classify_device(ua),
        }
    }
}

impl Default for RegexUaEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn match_versioned(patterns: &[Pattern], ua: &str) -> (String, String) {
    for p in patterns {
        let Some(caps) = p.re.captures(ua) else {
            continue;
        };

        // Alternations put the version in different groups; take the first pair that matched.
        let mut groups = caps.iter().skip(1).flatten().map(|m| m.as_str());
        let version = match (groups.next(), groups.next()) {
            (Some(major), Some(minor)) => format!("{major}.{minor}"),
            (Some(major), None) => format!("{major}.0"),
            _ => String::new(),
        };

        return (p.name.to_string(), version);
    }

    (String::new(), String::new())
}

/// `Windows NT 10.0` is marketed as "Windows 10", `6.1` as "Windows 7", and so on.
fn windows_release(nt_version: &str) -> (String, String) {
    let name = match nt_version {
        "10.0" => "Windows 10",
        "6.3" => "Windows 8.1",
        "6.2" => "Windows 8",
        "6.1" => "Windows 7",
        "6.0" => "Windows Vista",
        "5.1" | "5.2" => "Windows XP",
        _ => "Windows",
    };
    (name.to_string(), nt_version.to_string())
}

/// Priority: bot, Apple handhelds, Android phone/tablet, appliances, desktop.
fn classify_device(ua: &str) -> DeviceType {
    if BOT.is_match(ua) {
        return DeviceType::Bot;
    }
    if ua.contains("iPhone") {
        return DeviceType::IPhone;
    }
    if ua.contains("iPad") {
        return DeviceType::IPad;
    }
    if ua.contains("iPod") {
        return DeviceType::IPod;
    }

    let android = ua.contains("Android");
    let mobile = ua.contains("Mobile");
    if android && mobile {
        return DeviceType::Mobile;
    }
    if android && TV.is_match(ua) {
        return DeviceType::Tv;
    }
    if android && !WEARABLE.is_match(ua) {
        return DeviceType::Tablet;
    }

    if TV.is_match(ua) {
        return DeviceType::Tv;
    }
    if CONSOLE.is_match(ua) {
        return DeviceType::GameConsole;
    }
    if SPEAKER.is_match(ua) {
        return DeviceType::SmartSpeaker;
    }
    if WEARABLE.is_match(ua) {
        return DeviceType::Wearable;
    }
    if OTHER_MOBILE.is_match(ua) {
        return DeviceType::Mobile;
    }

    DeviceType::Desktop
}
