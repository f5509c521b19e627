mod format_tests;
mod ip_tests;
