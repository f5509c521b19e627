use crate::parser::{LogFormat, detect_log_format};

const DETAILED: &str = r#"1.2.3.4 - - [25/Dec/2023:10:00:00 +0000] "GET / HTTP/1.1" 200 10 "-" "curl/8.0" 0.010 0.005"#;
const COMBINED: &str = r#"1.2.3.4 - - [25/Dec/2023:10:00:00 +0000] "GET / HTTP/1.1" 200 10 "-" "curl/8.0""#;
const MAIN: &str = r#"1.2.3.4 - - [25/Dec/2023:10:00:00 +0000] "GET / HTTP/1.1" 200 10"#;

#[test]
fn wider_formats_take_priority() {
    assert_eq!(detect_log_format(&[DETAILED, DETAILED]), Some(LogFormat::Detailed));
    assert_eq!(detect_log_format(&[COMBINED, COMBINED]), Some(LogFormat::Combined));
    assert_eq!(detect_log_format(&[MAIN, MAIN]), Some(LogFormat::Main));
}

#[test]
fn requires_a_strict_majority_of_non_blank_samples() {
    // Two of four detailed is not a majority, but every line is at least `main`.
    let samples = [DETAILED, DETAILED, MAIN, MAIN, "", "   "];
    assert_eq!(detect_log_format(&samples), Some(LogFormat::Main));

    let garbage = ["hello", "world", MAIN];
    assert_eq!(detect_log_format(&garbage), None);
}

#[test]
fn blank_samples_detect_nothing() {
    let samples: [&str; 2] = ["", "\n"];
    assert_eq!(detect_log_format(&samples), None);
    assert_eq!(detect_log_format::<&str>(&[]), None);
}

#[test]
fn combined_tolerates_trailing_forwarded_for() {
    let line = format!(r#"{COMBINED} "203.0.113.9""#);
    assert!(LogFormat::Combined.matches(&line));
    assert!(!LogFormat::Detailed.matches(&line));
}
