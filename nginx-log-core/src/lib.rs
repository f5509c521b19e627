pub mod analytics;
pub mod conf;
pub mod cursor;
pub mod discovery;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod events;
pub mod index;
pub mod indexer;
pub mod logging;
pub mod parser;
pub mod progress;
pub mod search;

pub use engine::{Collaborators, Engine};
pub use error::ErrorCategory;
