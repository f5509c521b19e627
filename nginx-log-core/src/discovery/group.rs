use crate::discovery::error::DiscoveryError;
use glob::{Pattern, glob};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

static ROTATION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\d{1,3}$").expect("static rotation suffix pattern"));

static DATE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.-](?:\d{8}|\d{4}-\d{2}-\d{2})$").expect("static date suffix pattern")
});

/// Files under a whitelist root that are considered log files during rediscovery.
const LOG_FILE_GLOB: &str = "**/*.log*";

pub fn is_gzip(path: &str) -> bool {
    path.ends_with(".gz")
}

pub fn is_compressed(path: &str) -> bool {
    path.ends_with(".gz") || path.ends_with(".bz2")
}

/// Compressed with something other than gzip; such files are never read.
pub fn is_unsupported_compression(path: &str) -> bool {
    is_compressed(path) && !is_gzip(path)
}

/// Map any member of a log group to the group's main log path.
///
/// ```text
/// /var/log/nginx/access.log            -> /var/log/nginx/access.log
/// /var/log/nginx/access.log.1          -> /var/log/nginx/access.log
/// /var/log/nginx/access.log.12.gz      -> /var/log/nginx/access.log
/// /var/log/nginx/access.log-20240101   -> /var/log/nginx/access.log
/// /var/log/nginx/access.log.2024-01-01 -> /var/log/nginx/access.log
/// ```
pub fn main_log_path(path: &str) -> String {
    let stripped = path
        .strip_suffix(".gz")
        .or_else(|| path.strip_suffix(".bz2"))
        .unwrap_or(path);

    if let Some(m) = ROTATION_SUFFIX.find(stripped) {
        return stripped[..m.start()].to_string();
    }

    if let Some(m) = DATE_SUFFIX.find(stripped) {
        return stripped[..m.start()].to_string();
    }

    stripped.to_string()
}

/// Enumerate the regular files belonging to the group of `main_path`, sorted.
///
/// `main_path` itself is included whenever it exists. Files that share the
/// prefix but belong to another group (`access.log_old`) are left out, and so
/// are siblings in a compression format the scanner cannot decode.
pub fn discover_group_files(main_path: &str) -> Result<Vec<String>, DiscoveryError> {
    let pattern = format!("{}*", Pattern::escape(main_path));
    let entries = glob(&pattern).map_err(|source| DiscoveryError::Glob {
        pattern: pattern.clone(),
        source,
    })?;

    let mut files: BTreeSet<String> = entries
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .map(|path| path.to_string_lossy().into_owned())
        .filter(|path| main_log_path(path) == main_path)
        .filter(|path| {
            let unsupported = is_unsupported_compression(path);
            if unsupported {
                tracing::debug!(path, "skipping file with unsupported compression");
            }
            !unsupported
        })
        .collect();

    if Path::new(main_path).is_file() {
        files.insert(main_path.to_string());
    }

    Ok(files.into_iter().collect())
}

/// Main log paths of every log group found under the whitelist roots.
pub fn discover_main_logs(roots: &[PathBuf]) -> Result<Vec<String>, DiscoveryError> {
    let mut groups = BTreeSet::new();

    for root in roots {
        if root.is_file() {
            groups.insert(main_log_path(&root.to_string_lossy()));
            continue;
        }
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "whitelist root missing, skipping");
            continue;
        }

        let pattern = root.join(LOG_FILE_GLOB).to_string_lossy().into_owned();
        let entries = glob(&pattern).map_err(|source| DiscoveryError::Glob {
            pattern: pattern.clone(),
            source,
        })?;

        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    groups.insert(main_log_path(&path.to_string_lossy()));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %e.path().display(),
                        error = %e.error(),
                        "skipping unreadable path"
                    );
                }
            }
        }
    }

    Ok(groups.into_iter().collect())
}

/// Total on-disk size of a group's files.
pub fn group_size(files: &[String]) -> Result<u64, DiscoveryError> {
    files.iter().try_fold(0u64, |acc, file| {
        let meta = fs::metadata(file).map_err(|source| DiscoveryError::Io {
            path: PathBuf::from(file),
            source,
        })?;
        Ok(acc + meta.len())
    })
}
