use std::sync::Arc;

use anyhow::{Context, Result};
use contact_sleuth::{EmailPipeline, Target, config::DriverConfig, process_target};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DriverConfig::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let websites = read_websites().await?;
    info!(
        targets = websites.len(),
        concurrency = config.concurrency,
        "starting email lookups"
    );

    let pipeline = Arc::new(
        EmailPipeline::from_config(config.pipeline.clone()).context("building email pipeline")?,
    );
    if !pipeline.has_renderer() {
        info!("no render endpoint configured, browser level disabled");
    }

    let shutdown_token = CancellationToken::new();
    {
        let shutdown_token = shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, cancelling in-flight lookups...");
            shutdown_token.cancel();
        });
    }

    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut tasks = JoinSet::new();

    for website in websites {
        if shutdown_token.is_cancelled() {
            break;
        }
        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();
        let cancel = shutdown_token.child_token();

        tasks.spawn(async move {
            let _permit = permit;
            let mut target = Target::new(website);
            process_target(&pipeline, &mut target, cancel).await;
            target
        });

        // Print finished targets as we go to keep memory flat.
        while let Some(joined) = tasks.try_join_next() {
            print_target(joined?)?;
        }
    }

    while let Some(joined) = tasks.join_next().await {
        print_target(joined?)?;
    }

    Ok(())
}

/// Websites from the command line, or one per line on stdin when none given.
async fn read_websites() -> Result<Vec<String>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args);
    }

    let mut websites = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if !line.is_empty() {
            websites.push(line.to_string());
        }
    }
    Ok(websites)
}

fn print_target(target: Target) -> Result<()> {
    println!("{}", serde_json::to_string(&target)?);
    Ok(())
}
