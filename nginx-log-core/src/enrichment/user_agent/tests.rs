use crate::enrichment::user_agent::{
    DeviceType, RegexUaEngine, UaEngine, UserAgentInfo, major_minor,
};
use pretty_assertions::assert_eq;

const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/91.0.4472.124 Safari/537.36";
const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1";
const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 15_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.4 Mobile/15E148 Safari/604.1";
const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
const CHROME_ANDROID_PHONE: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Mobile Safari/537.36";
const CHROME_ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 12; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.5735.196 Safari/537.36";
const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";
const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.61";
const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const PLAYSTATION: &str = "Mozilla/5.0 (PlayStation; PlayStation 5/2.26) AppleWebKit/605.1.15 (KHTML, like Gecko)";
const SMART_TV: &str = "Mozilla/5.0 (SMART-TV; Linux; Tizen 6.0) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/4.0 Chrome/76.0.3809.146 TV Safari/537.36";

const ROKU_APP_ON_PHONE: &str = "Mozilla/5.0 (Linux; Android 13; SM-S911B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Mobile Safari/537.36 Roku/DVP-13.0";
const BRAVIA_ANDROID_TV: &str = "Mozilla/5.0 (Linux; Android 9; BRAVIA 4K UR2) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.5735.196 Safari/537.36";

fn classify(ua: &str) -> UserAgentInfo {
    UaEngine::Regex(RegexUaEngine::new()).classify(ua)
}

#[test]
fn chrome_on_windows_10() {
    // Act
    let info = classify(CHROME_WINDOWS);

    // Assert
    assert_eq!(info.browser, "Chrome");
    assert_eq!(info.browser_version, "91.0");
    assert_eq!(info.os, "Windows 10");
    assert_eq!(info.os_version, "10.0");
    assert_eq!(info.device_type, DeviceType::Desktop);
}

#[test]
fn ios_is_matched_before_macos() {
    let iphone = classify(SAFARI_IPHONE);
    assert_eq!(iphone.os, "iOS");
    assert_eq!(iphone.os_version, "16.5");
    assert_eq!(iphone.browser, "Safari");
    assert_eq!(iphone.browser_version, "16.5");
    assert_eq!(iphone.device_type, DeviceType::IPhone);

    let ipad = classify(SAFARI_IPAD);
    assert_eq!(ipad.os, "iOS");
    assert_eq!(ipad.device_type, DeviceType::IPad);

    let mac = classify(SAFARI_MAC);
    assert_eq!(mac.os, "macOS");
    assert_eq!(mac.os_version, "10.15");
    assert_eq!(mac.device_type, DeviceType::Desktop);
}

#[test]
fn android_is_matched_before_linux() {
    let phone = classify(CHROME_ANDROID_PHONE);
    assert_eq!(phone.os, "Android");
    assert_eq!(phone.os_version, "13.0");
    assert_eq!(phone.device_type, DeviceType::Mobile);

    let tablet = classify(CHROME_ANDROID_TABLET);
    assert_eq!(tablet.os, "Android");
    assert_eq!(tablet.device_type, DeviceType::Tablet);

    let linux = classify(FIREFOX_LINUX);
    assert_eq!(linux.os, "Linux");
    assert_eq!(linux.browser, "Firefox");
    assert_eq!(linux.browser_version, "115.0");
}

#[test]
fn chromium_derivatives_win_over_chrome() {
    let info = classify(EDGE_WINDOWS);
    assert_eq!(info.browser, "Edge");
    assert_eq!(info.browser_version, "120.0");
}

#[test]
fn bots_take_priority_over_everything() {
    let info = classify(GOOGLEBOT);
    assert_eq!(info.device_type, DeviceType::Bot);
    assert_eq!(info.browser, "Googlebot");
}

#[test]
fn appliances_are_classified() {
    assert_eq!(classify(PLAYSTATION).device_type, DeviceType::GameConsole);
    assert_eq!(classify(SMART_TV).device_type, DeviceType::Tv);
}

#[test]
fn android_phone_mentioning_a_tv_brand_is_mobile() {
    assert_eq!(classify(ROKU_APP_ON_PHONE).device_type, DeviceType::Mobile);
    assert_eq!(classify(BRAVIA_ANDROID_TV).device_type, DeviceType::Tv);
}

#[test]
fn blank_and_dash_are_unknown() {
    assert_eq!(classify(""), UserAgentInfo::unknown());
    assert_eq!(classify("-"), UserAgentInfo::unknown());
    assert_eq!(classify("  "), UserAgentInfo::unknown());
}

#[test]
fn unrecognized_input_is_left_blank_not_unknown() {
    // Act
    let info = classify("SomethingCustom");

    // Assert
    assert_eq!(info.browser, "");
    assert_eq!(info.os, "");
    assert_eq!(info.device_type, DeviceType::Desktop);
}

#[test]
fn device_type_labels() {
    assert_eq!(DeviceType::IPhone.as_str(), "iPhone");
    assert_eq!(DeviceType::GameConsole.as_str(), "Game Console");
    assert_eq!(DeviceType::SmartSpeaker.as_str(), "Smart Speaker");
    assert_eq!(DeviceType::Tv.as_str(), "TV");
}

#[test]
fn major_minor_truncates_versions() {
    assert_eq!(major_minor("91.0.4472.124"), "91.0");
    assert_eq!(major_minor("16_5_1"), "16.5");
    assert_eq!(major_minor("13"), "13.0");
    assert_eq!(major_minor("UNKNOWN"), "");
    assert_eq!(major_minor(""), "");
}
