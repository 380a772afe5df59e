use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

/// Something that can produce the current HTML of a page.
///
/// Every call returns a fresh snapshot, so content that loads
/// asynchronously shows up on later calls.
pub trait PageSource: Send + Sync {
    fn snapshot(&self) -> impl Future<Output = Result<String>> + Send;

    /// Human-readable location, for logs and tab info.
    fn describe(&self) -> String;
}

/// The page sources the CLI knows how to open.
#[derive(Debug, Clone)]
pub enum Source {
    /// Fixed markup held in memory.
    Inline(String),
    /// A file on disk, re-read on every snapshot.
    File(PathBuf),
    /// An HTTP(S) page, re-fetched on every snapshot.
    Url { url: String, client: reqwest::Client },
}

impl Source {
    /// Interpret a CLI argument: `http://` and `https://` prefixes open a URL,
    /// anything else is a file path.
    pub fn parse(arg: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(user_agent)
                .build()
                .map_err(|source| Error::Fetch {
                    url: arg.to_string(),
                    source,
                })?;
            Ok(Source::Url {
                url: arg.to_string(),
                client,
            })
        } else {
            Ok(Source::File(PathBuf::from(arg)))
        }
    }

    /// The URL this source was opened from, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Source::Url { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl PageSource for Source {
    async fn snapshot(&self) -> Result<String> {
        match self {
            Source::Inline(html) => Ok(html.clone()),
            Source::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| Error::Io {
                        path: path.clone(),
                        source,
                    })
            }
            Source::Url { url, client } => {
                let fetch_err = |source| Error::Fetch {
                    url: url.clone(),
                    source,
                };
                let resp = client.get(url).send().await.map_err(fetch_err)?;
                if !resp.status().is_success() {
                    return Err(Error::HttpStatus {
                        url: url.clone(),
                        status: resp.status().as_u16(),
                    });
                }
                resp.text().await.map_err(fetch_err)
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Source::Inline(_) => "<inline html>".to_string(),
            Source::File(path) => path.display().to_string(),
            Source::Url { url, .. } => url.clone(),
        }
    }
}

/// Waits for a page to stop changing.
///
/// Snapshots are taken every `poll_interval`; the first snapshot identical
/// to its predecessor is returned. After `max_wait` the latest snapshot is
/// returned whether or not it settled.
#[derive(Debug, Clone, Copy)]
pub struct ContentWatcher {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl ContentWatcher {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }

    /// Same polling cadence, different bound.
    #[must_use]
    pub fn with_max_wait(self, max_wait: Duration) -> Self {
        Self { max_wait, ..self }
    }

    /// Snapshot `source` until it stops changing.
    ///
    /// The first snapshot is always taken, bounded only by the source itself.
    /// Every later snapshot counts against `max_wait`; one still pending at
    /// the deadline is abandoned and the latest completed snapshot returned.
    /// Cancellation is observed at every await, including in-flight snapshots.
    pub async fn wait_until_stable<S: PageSource>(
        &self,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let started = Instant::now();
        let deadline = started + self.max_wait;
        let mut current = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            snapshot = source.snapshot() => snapshot?,
        };
        let mut current_print = fingerprint(&current);
        let mut polls = 0usize;

        loop {
            let now = Instant::now();
            if now >= deadline {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                debug!(
                    polls,
                    "{} still changing after {:?}",
                    source.describe(),
                    started.elapsed()
                );
                return Ok(current);
            }

            let pause = self.poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                polled = tokio::time::timeout_at(deadline, source.snapshot()) => match polled {
                    Ok(snapshot) => snapshot?,
                    Err(_) => {
                        debug!(polls, "{} snapshot still pending at the deadline", source.describe());
                        return Ok(current);
                    }
                },
            };
            let next_print = fingerprint(&next);
            polls += 1;
            if next_print == current_print {
                debug!(polls, "{} settled", source.describe());
                return Ok(next);
            }
            current = next;
            current_print = next_print;
        }
    }
}

fn fingerprint(html: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    html.hash(&mut hasher);
    hasher.finish()
}
