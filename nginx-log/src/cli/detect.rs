use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use nginx_log_core::discovery::is_gzip;
use nginx_log_core::parser::detect_log_format;
use owo_colors::OwoColorize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Print the detected format of the first `lines` lines of `path`.
pub fn detect(path: &Path, lines: usize, json: bool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader: Box<dyn Read> = if is_gzip(&path.to_string_lossy()) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let samples = BufReader::new(reader)
        .lines()
        .take(lines)
        .collect::<Result<Vec<String>, _>>()
        .with_context(|| format!("cannot read {}", path.display()))?;
    let format = detect_log_format(&samples);

    if json {
        println!(
            "{}",
            serde_json::json!({ "path": path, "samples": samples.len(), "format": format })
        );
        return Ok(());
    }

    match format {
        Some(format) => println!(
            "{} {} ({} samples)",
            "✔".green(),
            format.as_str().bold(),
            samples.len()
        ),
        None => println!(
            "{} no known format matches a majority of {} samples",
            "✘".red(),
            samples.len()
        ),
    }
    Ok(())
}
