use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::PageCache;
use crate::calendar::{date_page_path, Interval};
use crate::error::PageResult;
use crate::fetcher::{Fetcher, Page};
use crate::parser::{self, ResultPage};
use crate::report::{self, Layout};
use crate::settings::Settings;

pub struct RunOptions {
    pub breed: String,
    pub interval: Interval,
    pub output: Option<PathBuf>,
    pub layout: Layout,
    pub json: bool,
    pub refresh: bool,
    pub progress: bool,
}

/// Run counts reported at the end.
#[derive(Debug, Default)]
pub struct RunStats {
    pub days: usize,
    pub events: usize,
    pub results: usize,
    pub failed: usize,
}

/// Days → calendar pages → event pages → per-breed results pages → report.
pub async fn run(opts: &RunOptions, settings: &Settings) -> Result<RunStats> {
    let mut stats = RunStats::default();

    let t_verify = Instant::now();
    let cache = PageCache::open(&settings.cache_path)?;
    let cached = cache.stats(settings.cache_ttl())?;
    info!(
        "Verified cache {:?}: {} items ({} expired) in {:.2}s",
        settings.cache_path,
        cached.items,
        cached.expired,
        t_verify.elapsed().as_secs_f64()
    );

    let fetcher = Fetcher::new(settings, cache, opts.refresh, opts.progress)?;

    let days = opts.interval.days();
    stats.days = days.len();
    info!(
        "Scanning {} days ({} to {}) for {} specialties",
        days.len(),
        opts.interval.start,
        opts.interval.end,
        opts.breed
    );
    let day_links: Vec<String> = days.iter().map(|d| date_page_path(*d, &opts.breed)).collect();
    let date_pages = fetcher.fetch_all("days", &day_links).await?;

    let event_links = links_from(&date_pages, "date", &mut stats.failed, parser::parse_date_page);
    stats.events = event_links.len();
    debug!(?event_links, "event links");
    let event_pages = fetcher.fetch_all("events", &event_links).await?;

    let result_links = links_from(&event_pages, "event", &mut stats.failed, |body| {
        parser::parse_event_page(body, &opts.breed)
    });
    debug!(?result_links, "result links");
    let result_pages = fetcher.fetch_all("results", &result_links).await?;

    let parsed: Vec<(&Page, PageResult<ResultPage>)> = result_pages
        .par_iter()
        .map(|page| (page, parser::parse_result_page(&page.body)))
        .collect();

    let mut results = Vec::with_capacity(parsed.len());
    for (page, outcome) in parsed {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                stats.failed += 1;
                warn!("Skipping results page {}: {}", page.key, e);
            }
        }
    }
    stats.results = results.len();

    write_output(opts, &results)?;
    Ok(stats)
}

/// Collect links from every page, skipping pages that fail to parse.
fn links_from<F>(pages: &[Page], kind: &str, failed: &mut usize, parse: F) -> Vec<String>
where
    F: Fn(&str) -> PageResult<Vec<String>>,
{
    let mut links = Vec::new();
    for page in pages {
        match parse(&page.body) {
            Ok(found) => links.extend(found),
            Err(e) => {
                *failed += 1;
                warn!("Skipping {} page {}: {}", kind, page.key, e);
            }
        }
    }
    links
}

fn write_output(opts: &RunOptions, results: &[ResultPage]) -> Result<()> {
    let writer: Box<dyn Write> = match &opts.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    if opts.json {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, results)?;
        writeln!(writer)?;
        writer.flush()?;
    } else {
        report::write_report(writer, results, opts.layout)?;
    }
    Ok(())
}
