use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::cache::PageCache;
use crate::settings::Settings;

/// A fetched page body and the request path it came from.
#[derive(Debug, Clone)]
pub struct Page {
    pub key: String,
    pub body: String,
}

pub struct Fetcher {
    client: Client,
    base: Url,
    cache: PageCache,
    ttl: chrono::Duration,
    refresh: bool,
    concurrency: usize,
    max_retries: u32,
    backoff_ms: u64,
    progress: bool,
}

impl Fetcher {
    pub fn new(settings: &Settings, cache: PageCache, refresh: bool, progress: bool) -> Result<Self> {
        let base = Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid base url {:?}", settings.base_url))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build http client")?;
        Ok(Fetcher {
            client,
            base,
            cache,
            ttl: settings.cache_ttl(),
            refresh,
            concurrency: settings.concurrency.max(1),
            max_retries: settings.max_retries,
            backoff_ms: settings.backoff_ms,
            progress,
        })
    }

    /// Fetch every link, cache first, the rest concurrently. Pages that still
    /// fail after retries are logged and left out; the others come back in
    /// input order.
    pub async fn fetch_all(&self, label: &str, links: &[String]) -> Result<Vec<Page>> {
        let total = links.len();
        let pb = self.progress_bar(label, total)?;
        let mut slots: Vec<Option<Page>> = vec![None; total];

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (tx, mut rx) =
            tokio::sync::mpsc::channel::<(usize, String, Result<String>)>(self.concurrency * 2);

        let mut pending = 0usize;
        for (i, key) in links.iter().enumerate() {
            if !self.refresh {
                if let Some(body) = self.cache.get(key, self.ttl)? {
                    debug!(key, "cache hit");
                    slots[i] = Some(Page { key: key.clone(), body });
                    pb.inc(1);
                    continue;
                }
            }

            let url = resolve(&self.base, key)?;
            let client = self.client.clone();
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();
            let key = key.clone();
            let (max_retries, backoff_ms) = (self.max_retries, self.backoff_ms);
            pending += 1;

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return;
                };
                let result = fetch_with_retry(&client, url, max_retries, backoff_ms).await;
                let _ = tx.send((i, key, result)).await;
            });
        }

        // Drop our copy of tx so rx closes when all spawned tasks finish
        drop(tx);

        let mut errors = 0usize;
        while let Some((i, key, result)) = rx.recv().await {
            match result {
                Ok(body) => {
                    self.cache.put(&key, &body)?;
                    debug!(key, bytes = body.len(), "fetched");
                    slots[i] = Some(Page { key, body });
                }
                Err(e) => {
                    errors += 1;
                    warn!("Fetch failed for {}: {:#}", key, e);
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            "Fetched {} {} ({} from network, {} errors)",
            total, label, pending, errors
        );
        Ok(slots.into_iter().flatten().collect())
    }

    fn progress_bar(&self, label: &str, total: usize) -> Result<ProgressBar> {
        if !self.progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>8} [{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                .progress_chars("=> "),
        );
        pb.set_prefix(label.to_string());
        Ok(pb)
    }
}

/// Links on AKC pages are mostly site-relative; absolute ones pass through.
pub fn resolve(base: &Url, link: &str) -> Result<Url> {
    base.join(link)
        .with_context(|| format!("Cannot resolve link {:?}", link))
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(2u64.saturating_pow(attempt)))
}

async fn fetch_with_retry(client: &Client, url: Url, max_retries: u32, backoff_ms: u64) -> Result<String> {
    let mut attempt = 0;
    loop {
        let start = Instant::now();
        let reason = match client.get(url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("Failed to read body of {}", url))?;
                debug!(%url, latency_ms = start.elapsed().as_millis() as u64, "response");
                return Ok(body);
            }
            Ok(resp) if should_retry(resp.status()) => format!("HTTP {}", resp.status()),
            Ok(resp) => bail!("HTTP ERROR {} for {}", resp.status().as_u16(), url),
            Err(e) if e.is_timeout() || e.is_connect() => e.to_string(),
            Err(e) => return Err(e).with_context(|| format!("Request to {} failed", url)),
        };

        if attempt >= max_retries {
            bail!("Giving up on {} after {} attempts: {}", url, attempt + 1, reason);
        }

        let backoff = backoff_delay(backoff_ms, attempt);
        warn!(
            "{} on {} (attempt {}/{}), backing off {:.1}s",
            reason,
            url,
            attempt + 1,
            max_retries,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}
