mod fixtures;
pub mod tracing;

pub use fixtures::{DAY1, DAY2, LogDir, access_line, completions, test_config};
pub use self::tracing::{CapturedEvent, init_test_tracing};
