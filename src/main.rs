// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use lanewise::backends::local::TracingErrorSink;
use lanewise::config::{load_and_validate_config, RuntimeBuilder};
use lanewise::engine::RunReport;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: lanewise <pipeline.(yaml|yml|toml)> [--preview] [--max-batches N]";

/// Command line arguments
struct Args {
    config_file: String,
    preview: bool,
    max_batches: Option<usize>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut config_file = None;
    let mut preview = false;
    let mut max_batches = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--preview" => preview = true,
            "--max-batches" => {
                let value = iter.next().context("--max-batches needs a value")?;
                max_batches = Some(
                    value
                        .parse()
                        .with_context(|| format!("invalid --max-batches value '{}'", value))?,
                );
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
            path if config_file.is_none() => config_file = Some(path.to_string()),
            extra => bail!("unexpected argument '{}'\n{}", extra, USAGE),
        }
    }

    Ok(Args {
        config_file: config_file.context(USAGE)?,
        preview,
        max_batches,
    })
}

fn print_summary(pipeline: &str, report: &RunReport, errors: u64, elapsed: std::time::Duration) {
    println!("Pipeline: {}", pipeline);
    println!(
        "Batches: {} (source exhausted: {}, last offset: {})",
        report.batches,
        report.source_exhausted,
        report.last_offset.as_deref().unwrap_or("-")
    );
    println!();
    println!("{:<20} {:<10} {:>8} {:>8} {:>10} {:>8}", "STAGE", "KIND", "IN", "OUT", "DISCARDED", "ERRORS");
    for stage in &report.stages {
        let (discarded, sent_to_error) = stage
            .outcomes
            .map(|o| (o.discarded.to_string(), o.sent_to_error.to_string()))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        println!(
            "{:<20} {:<10} {:>8} {:>8} {:>10} {:>8}",
            stage.stage,
            format!("{:?}", stage.kind).to_lowercase(),
            stage.input,
            stage.output,
            discarded,
            sent_to_error
        );
    }
    println!();
    println!("Error records: {}", errors);
    println!("Leftover records: {}", report.leftover_records);
    println!("Elapsed: {:?}", elapsed);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = parse_args(&args)?;

    let config = load_and_validate_config(&args.config_file)
        .with_context(|| format!("failed to load {}", args.config_file))?;

    let error_sink = Arc::new(TracingErrorSink::new());
    let (pipeline, mut options) = RuntimeBuilder::from_config(&config, error_sink.clone())?;
    options.preview |= args.preview;
    if args.max_batches.is_some() {
        options.max_batches = args.max_batches;
    }

    let started = Instant::now();
    let report = pipeline.run(options).await?;
    print_summary(pipeline.name(), &report, error_sink.count(), started.elapsed());

    Ok(())
}
