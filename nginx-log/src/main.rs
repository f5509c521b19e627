mod cli;

use crate::cli::{Command, run};
use clap::Parser;
use nginx_log_core::logging::{LogMode, default_log_mode, init_logging};
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "nginx-log",
    version,
    about = "nginx-log: index and analyze nginx access logs"
)]
struct Cli {
    /// Engine config file (HCL). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Human readable engine logs.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// `--pretty` wins; otherwise JSON unless stdout is a terminal.
    fn log_mode(&self) -> LogMode {
        if self.pretty {
            LogMode::Pretty
        } else {
            default_log_mode()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_mode());

    if let Err(e) = run(cli.command, cli.config.as_deref(), cli.json) {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
