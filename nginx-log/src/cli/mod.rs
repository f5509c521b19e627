mod detect;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use nginx_log_core::analytics::DashboardQueryRequest;
use nginx_log_core::conf::{EngineConfig, load_config};
use nginx_log_core::discovery::main_log_path;
use nginx_log_core::parser::parse_timestamp;
use nginx_log_core::search::QueryRequest;
use nginx_log_core::{Collaborators, Engine};
use std::path::{Path, PathBuf};
use tokio::runtime::Builder;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index new lines of a log file, or rebuild its whole group with --full
    Index {
        path: PathBuf,

        #[arg(long)]
        full: bool,
    },

    /// Drop the index and rebuild every known log group
    Rebuild,

    /// Search indexed entries
    Search(SearchArgs),

    /// Dashboard statistics for a time window
    Dashboard {
        #[command(flatten)]
        range: RangeArgs,

        /// Include world and China map rollups
        #[arg(long)]
        geo: bool,
    },

    /// Index and cache statistics
    Stats {
        /// Drop documents and cursors of files that no longer exist first
        #[arg(long)]
        cleanup: bool,
    },

    /// Guess the log format of a file from its first lines
    Detect {
        path: PathBuf,

        #[arg(long, default_value_t = 100)]
        lines: usize,
    },
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Main log path of the group
    #[arg(long, default_value = "")]
    log_path: String,

    /// RFC 3339, nginx time or Unix seconds
    #[arg(long)]
    start: Option<String>,

    #[arg(long)]
    end: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    range: RangeArgs,

    /// Free text over the raw line; quote for a phrase
    #[arg(long, short, default_value = "")]
    query: String,

    #[arg(long, default_value = "")]
    ip: String,

    #[arg(long, default_value = "")]
    method: String,

    /// Exact path, `prefix*`, or a `*`/`?` pattern
    #[arg(long, default_value = "")]
    path: String,

    #[arg(long, value_delimiter = ',')]
    status: Vec<u16>,

    #[arg(long, default_value = "")]
    browser: String,

    #[arg(long, default_value = "")]
    os: String,

    #[arg(long, default_value = "")]
    device: String,

    #[arg(long, default_value_t = 20)]
    limit: usize,

    #[arg(long, default_value_t = 0)]
    offset: usize,

    #[arg(long, default_value = "timestamp")]
    sort_by: String,

    #[arg(long)]
    asc: bool,
}

pub fn run(command: Command, config: Option<&Path>, json: bool) -> Result<()> {
    if let Command::Detect { path, lines } = &command {
        return detect::detect(path, *lines, json);
    }

    let config = match config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(path)?
        }
        None => EngineConfig::default(),
    };
    let collaborators = Collaborators::from_config(&config)?;

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(async move {
        let engine = Engine::init(config, collaborators)?;
        let result = execute(&engine, command, json).await;
        engine.shutdown().await?;
        result
    })
}

async fn execute(engine: &Engine, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Index { path, full } => {
            let path = absolute(&path)?;
            if full {
                let outcome = engine.index_log_file_full(&main_log_path(&path)).await?;
                render::group_outcome(&outcome);
            } else {
                let outcome = engine.index_log_file(&path).await?;
                render::file_outcome(&outcome);
            }
        }

        Command::Rebuild => {
            let groups = engine.rebuild_index().await?;
            render::rebuilt(&groups, engine.index_stats()?.doc_count);
        }

        Command::Search(args) => {
            let result = engine.search_logs(args.into_request()?).await?;
            if json {
                render::json(&result)?;
            } else {
                render::search_result(&result);
            }
        }

        Command::Dashboard { range, geo } => {
            let req = range.into_dashboard_request()?;
            let dashboard = engine.get_dashboard_analytics(req.clone()).await?;
            let maps = if geo {
                Some((
                    engine.world_map(req.clone()).await?,
                    engine.china_map(req).await?,
                ))
            } else {
                None
            };

            if json {
                render::json(&serde_json::json!({
                    "dashboard": dashboard,
                    "world_map": maps.as_ref().map(|m| &m.0),
                    "china_map": maps.as_ref().map(|m| &m.1),
                }))?;
            } else {
                render::dashboard(&dashboard);
                if let Some((world, china)) = &maps {
                    render::geo(world, china);
                }
            }
        }

        Command::Stats { cleanup } => {
            if cleanup {
                let report = engine.cleanup_orphaned_indexes().await?;
                render::cleanup(&report);
            }
            let stats = engine.index_stats()?;
            let caches = engine.cache_stats();
            if json {
                render::json(&serde_json::json!({ "index": stats, "caches": caches }))?;
            } else {
                render::stats(&stats, &caches);
            }
        }

        Command::Detect { .. } => unreachable!("handled before the engine starts"),
    }
    Ok(())
}

impl RangeArgs {
    fn bounds(&self) -> Result<(Option<i64>, Option<i64>)> {
        Ok((time_arg(self.start.as_deref())?, time_arg(self.end.as_deref())?))
    }

    fn into_dashboard_request(self) -> Result<DashboardQueryRequest> {
        let (start_time, end_time) = self.bounds()?;
        Ok(DashboardQueryRequest {
            start_time,
            end_time,
            log_path: self.log_path,
        })
    }
}

impl SearchArgs {
    fn into_request(self) -> Result<QueryRequest> {
        let (start_time, end_time) = self.range.bounds()?;
        Ok(QueryRequest {
            start_time,
            end_time,
            query: self.query,
            ip: self.ip,
            method: self.method,
            path: self.path,
            browser: self.browser,
            os: self.os,
            device: self.device,
            status: self.status,
            log_path: self.range.log_path,
            limit: self.limit,
            offset: self.offset,
            sort_by: self.sort_by,
            sort_order: if self.asc { "asc" } else { "desc" }.to_string(),
            ..Default::default()
        })
    }
}

fn time_arg(raw: Option<&str>) -> Result<Option<i64>> {
    raw.map(|s| parse_timestamp(s).with_context(|| format!("invalid time {s:?}")))
        .transpose()
}

fn absolute(path: &Path) -> Result<String> {
    let path = std::path::absolute(path)
        .with_context(|| format!("cannot resolve {}", path.display()))?;
    Ok(path.to_string_lossy().into_owned())
}
