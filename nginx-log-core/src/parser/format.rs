use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// $remote_addr (or an X-Forwarded-For chain) - $remote_user [$time_local] "$request" $status $body_bytes_sent
macro_rules! prefix {
    () => {
        r#"^(?P<ip>\S+(?:,\s*\S+)*) \S+ \S+ \[(?P<time>[^\]]+)\] "(?P<request>[^"]*)" (?P<status>\d{1,3}|-) (?P<bytes>\d+|-)"#
    };
}

// "$http_referer" "$http_user_agent"
macro_rules! referer_ua {
    () => {
        r#" "(?P<referer>[^"]*)" "(?P<ua>[^"]*)""#
    };
}

// Anything after the known fields ($http_x_forwarded_for, extra timings, ...).
macro_rules! tail {
    () => {
        r#"(?:[\s,:].*)?$"#
    };
}

static DETAILED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        prefix!(),
        referer_ua!(),
        r#" (?P<rt>\d+(?:\.\d+)?|-) (?P<urt>\d+(?:\.\d+)?|-)"#,
        tail!()
    ))
    .expect("static detailed format pattern")
});

static COMBINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(prefix!(), referer_ua!(), tail!())).expect("static combined format pattern")
});

static MAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(concat!(prefix!(), tail!())).expect("static main format pattern"));

/// Known nginx access-log formats, widest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `combined` plus `$request_time $upstream_response_time`.
    Detailed,
    /// `main` plus referer and user agent.
    Combined,
    /// nginx `main` / common log format.
    Main,
}

impl LogFormat {
    /// Matching order. A line matching several formats belongs to the first.
    pub const PRIORITY: [LogFormat; 3] =
        [LogFormat::Detailed, LogFormat::Combined, LogFormat::Main];

    pub fn regex(&self) -> &'static Regex {
        match self {
            LogFormat::Detailed => &DETAILED,
            LogFormat::Combined => &COMBINED,
            LogFormat::Main => &MAIN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Detailed => "detailed",
            LogFormat::Combined => "combined",
            LogFormat::Main => "main",
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        self.regex().is_match(line)
    }
}

/// Pick the format that more than half of the non-blank samples match.
///
/// Wider formats are checked first, so a detailed log is reported as
/// `Detailed` even though every detailed line also matches `Main`.
pub fn detect_log_format<S: AsRef<str>>(samples: &[S]) -> Option<LogFormat> {
    let lines: Vec<&str> = samples
        .iter()
        .map(|s| s.as_ref().trim_end_matches(['\r', '\n']))
        .filter(|s| !s.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return None;
    }

    LogFormat::PRIORITY.into_iter().find(|format| {
        let hits = lines.iter().filter(|line| format.matches(line)).count();
        hits * 2 > lines.len()
    })
}
