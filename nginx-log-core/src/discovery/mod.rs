//! Log-group discovery and safe file access.
//!
//! A log group is a live file plus its rotated and compressed siblings
//! (`access.log`, `access.log.1`, `access.log.2.gz`, `access.log-20240101`).
//! The live file's path is the group's main log path.

mod access;
mod error;
mod group;


pub use access::AccessPolicy;
pub use error::{DiscoveryError, FileAccessError};
pub use group::{
    discover_group_files, discover_main_logs, group_size, is_compressed, is_gzip,
    is_unsupported_compression, main_log_path,
};
