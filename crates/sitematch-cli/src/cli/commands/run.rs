//! The search run: seed list, batches, result file, summary.

use anyhow::Result;
use sitematch_core::aggregate::{Aggregator, Outcome, Summary};
use sitematch_core::config::SiteMatchConfig;
use sitematch_core::fallback::Checker;
use sitematch_core::fetch::{Connector, CurlConnector};
use sitematch_core::pattern::Pattern;
use sitematch_core::report::ResultWriter;
use sitematch_core::scheduler;
use sitematch_core::seed;
use std::sync::Arc;

const OUTCOME_CHANNEL_DEPTH: usize = 64;

/// Runs one search over libcurl and prints the summary.
pub async fn run_search(cfg: SiteMatchConfig) -> Result<()> {
    let connector: Arc<dyn Connector> = Arc::new(CurlConnector::new(cfg.fetch_options()));
    if let Some(summary) = search(&cfg, connector).await? {
        print_summary(&summary);
    }
    Ok(())
}

/// Only a bad pattern is returned as an error. Seed or output failures are
/// reported on stdout and give `None`: no hostname is fetched and no summary
/// is printed.
async fn search(cfg: &SiteMatchConfig, connector: Arc<dyn Connector>) -> Result<Option<Summary>> {
    let pattern = Arc::new(Pattern::new(&cfg.pattern)?);

    let input_url = cfg.input_url.clone();
    let seed_connector = Arc::clone(&connector);
    let hostnames = match tokio::task::spawn_blocking(move || {
        seed::fetch_hostnames(&*seed_connector, &input_url)
    })
    .await?
    {
        Ok(hostnames) => hostnames,
        Err(err) => {
            tracing::error!("seed list unavailable: {:#}", err);
            println!("Exception reading urls from {}: {:#}", cfg.input_url, err);
            return Ok(None);
        }
    };
    println!(
        "Start website search. Search term: \"{}\", total urls: {}",
        pattern.as_str(),
        hostnames.len()
    );

    let mut writer = match ResultWriter::create(&cfg.output_path) {
        Ok(writer) => writer,
        Err(err) => {
            tracing::error!("output unavailable: {:#}", err);
            println!("Exception opening output file {}: {:#}", cfg.output_path.display(), err);
            return Ok(None);
        }
    };

    let (outcome_tx, mut outcome_rx) = tokio::sync::mpsc::channel::<Outcome>(OUTCOME_CHANNEL_DEPTH);
    let output_path = cfg.output_path.clone();
    let writer_handle = tokio::task::spawn_blocking(move || {
        while let Some(outcome) = outcome_rx.blocking_recv() {
            if let Err(err) = writer.write_outcome(&outcome) {
                tracing::warn!(hostname = %outcome.hostname, "failed to write result: {}", err);
            }
        }
        let written = writer.written();
        match writer.finish() {
            Ok(_) => tracing::debug!(written, path = %output_path.display(), "results written"),
            Err(err) => tracing::warn!("failed to flush {}: {}", output_path.display(), err),
        }
    });

    let budget = cfg.budget();
    let batch_size = cfg.batch_size;
    let strategy = cfg.strategy;
    let engine_handle = tokio::task::spawn_blocking(move || -> Summary {
        let checker = Checker::new(&*connector, &*pattern);
        let aggregator = Aggregator::new(Some(&outcome_tx));
        let batches = scheduler::run_batches(
            &hostnames,
            batch_size,
            &checker,
            budget,
            strategy,
            &aggregator,
            |index, len| {
                tracing::debug!(batch = index + 1, len, "starting batch");
                println!("Processing batch {}", index + 1);
            },
        );
        tracing::info!(batches, "all batches complete");
        let summary = aggregator.into_summary();
        // Closing the channel ends the writer loop.
        drop(outcome_tx);
        summary
    });

    let summary = engine_handle.await?;
    writer_handle.await?;
    Ok(Some(summary))
}

fn print_summary(summary: &Summary) {
    println!("##### Summary #####");
    for (classification, count) in summary.iter() {
        println!("Total {}: {}", classification, count);
    }
}
