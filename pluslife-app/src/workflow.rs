use crate::config::HarnessConfig;
use crate::plotting;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use pluslife_core::{
    codec::first_difference,
    flat::FlatSampleLog,
    testrun::{Testrun, TestrunBuilder},
    webhook::WebhookEnvelope,
};
use serde_json::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Caller overrides for a single `check` run.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub start: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub plot: bool,
    pub plot_path: Option<PathBuf>,
}

/// Loads a persisted testrun, writes its re-encoding beside it and verifies
/// that nothing was lost on the way.
pub fn run_check(path: &Path, options: &CheckOptions, config: &HarnessConfig) -> Result<Testrun> {
    info!(file = ?path, "checking testrun");
    let document = read_json(path)?;

    let start = options.start.or_else(|| start_from_file_name(path));
    let mut builder = TestrunBuilder::new();
    match start {
        Some(start) => builder = builder.with_start(start),
        None => warn!(file = ?path, "no start time in file name, deriving it from the samples"),
    }
    if let Some(comment) = &options.comment {
        builder = builder.with_comment(comment.clone());
    }
    let testrun = builder
        .decode_value(document.clone())
        .with_context(|| format!("Failed to decode testrun from {:?}", path))?;
    info!(
        id = %testrun.id,
        samples = testrun.samples.len(),
        finished = testrun.is_finished(),
        "decoded testrun"
    );

    let encoded = testrun.to_value()?;
    let tested_path = with_suffix(path, &config.output.tested_suffix);
    fs::write(&tested_path, serde_json::to_string(&encoded)?)
        .with_context(|| format!("Failed to write {:?}", tested_path))?;
    info!(file = ?tested_path, "wrote re-encoded testrun");

    if let Some(at) = first_difference(&document, &encoded) {
        bail!("Re-encoded testrun differs from {:?} at {}", path, at);
    }

    let age = Utc::now().signed_duration_since(testrun.start);
    if age.num_seconds() <= config.output.min_start_age_secs {
        bail!(
            "Testrun start {} is only {}s in the past, expected more than {}s",
            testrun.start,
            age.num_seconds(),
            config.output.min_start_age_secs
        );
    }

    if options.plot {
        let plot_path = options
            .plot_path
            .clone()
            .unwrap_or_else(|| config.output.plot_path.clone());
        plotting::render_png(&testrun, &config.plot, &plot_path)
            .with_context(|| format!("Failed to render plot to {:?}", plot_path))?;
    }

    info!(id = %testrun.id, "check passed");
    Ok(testrun)
}

/// Decodes a webhook payload and prints what it reports.
pub fn run_webhook(path: &Path) -> Result<WebhookEnvelope> {
    let envelope = WebhookEnvelope::from_value(read_json(path)?)
        .with_context(|| format!("Failed to decode webhook from {:?}", path))?;

    println!("{}", envelope);
    println!("State: {}", envelope.state);
    println!("Latest sample time: {}", envelope.latest_sample_time());
    if let Some(result) = &envelope.result {
        println!("{}", serde_json::to_string_pretty(&result.human_readable())?);
    }
    Ok(envelope)
}

/// Writes the flat sample log of a testrun to `output`, or to stdout.
pub fn run_flat(path: &Path, output: Option<&Path>) -> Result<usize> {
    let testrun = read_testrun(path)?;
    let written = match output {
        Some(output) => {
            let mut log = FlatSampleLog::create(output)
                .with_context(|| format!("Failed to create flat log {:?}", output))?;
            log.log_samples(&testrun.samples)?
        }
        None => FlatSampleLog::new(io::stdout().lock()).log_samples(&testrun.samples)?,
    };
    info!(samples = written, "wrote flat sample log");
    Ok(written)
}

/// Prints the current state line, plus the minimal projection once finished.
pub fn run_state(path: &Path) -> Result<()> {
    let testrun = read_testrun(path)?;
    println!("{}", testrun.get_current_human_readable_state());
    if testrun.is_finished() {
        println!("{}", serde_json::to_string_pretty(&testrun.to_minimal_json()?)?);
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON from {:?}", path))
}

fn read_testrun(path: &Path) -> Result<Testrun> {
    Testrun::from_value(read_json(path)?)
        .with_context(|| format!("Failed to decode testrun from {:?}", path))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Reads the start time embedded in names like
/// `pluslife_test_data-2025-02-14T08_30_00.000Z.json`: the first
/// `YYYY-MM-DD` run up to the next dot, interpreted as UTC.
pub fn start_from_file_name(path: &Path) -> Option<DateTime<Utc>> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".json").unwrap_or(name);
    let begin = (0..name.len()).find(|&i| is_date_prefix(&name.as_bytes()[i..]))?;
    let stamp = name[begin..].split('.').next()?;
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H_%M_%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn is_date_prefix(bytes: &[u8]) -> bool {
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
