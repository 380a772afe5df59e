/// JSON request/response protocol spoken over newline-delimited stdio.
///
/// Requests carry an `action` tag:
///
/// - `{"action":"analyzeReviews"}` (optional `"source"`) answers with a report
/// - `{"action":"getTabInfo"}` (optional `"url"`) answers with tab info
///
/// Every request line gets exactly one response line, including malformed ones.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::config::{Config, FetchConfig, SiteConfig};
use crate::error::Result;
use crate::page::{PageSource, Source};
use crate::report::Report;

/// Bytes buffered between a blocking reader thread and the session.
const PIPE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "analyzeReviews")]
    AnalyzeReviews {
        #[serde(default)]
        source: Option<String>,
    },
    #[serde(rename = "getTabInfo")]
    GetTabInfo {
        #[serde(default)]
        url: Option<String>,
    },
}

/// Whether a URL points at the review site, and at a restaurant page on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub url: String,
    pub is_target_site: bool,
    pub is_detail_page: bool,
}

impl TabInfo {
    #[must_use]
    pub fn for_url(url: &str, site: &SiteConfig) -> Self {
        Self {
            url: url.to_string(),
            is_target_site: url.contains(&site.target_host),
            is_detail_page: url.contains(&site.detail_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Report(Report),
    TabInfo(TabInfo),
}

/// One client's view of a page: the bound source plus everything needed
/// to analyze it.
pub struct Session {
    source: Option<Source>,
    analyzer: Analyzer,
    site: SiteConfig,
    fetch: FetchConfig,
}

impl Session {
    pub fn new(source: Option<Source>, analyzer: Analyzer, config: &Config) -> Self {
        Self {
            source,
            analyzer,
            site: config.site.clone(),
            fetch: config.fetch.clone(),
        }
    }

    pub fn from_config(config: &Config, source: Option<Source>) -> Result<Self> {
        Ok(Self::new(source, Analyzer::from_config(config)?, config))
    }

    /// Answer one request line.
    pub async fn handle(&self, line: &str, cancel: &CancellationToken) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!("Rejected request: {e}");
                return Response::Report(Report::failure(format!("invalid request: {e}")));
            }
        };
        debug!(?request, "handling request");

        match request {
            Request::AnalyzeReviews { source: None } => match &self.source {
                Some(source) => Response::Report(self.analyzer.analyze(source, cancel).await),
                None => Response::Report(Report::failure("no page source bound to this session")),
            },
            Request::AnalyzeReviews {
                source: Some(location),
            } => {
                let timeout = Duration::from_secs(self.fetch.timeout_secs);
                match Source::parse(&location, &self.fetch.user_agent, timeout) {
                    Ok(source) => Response::Report(self.analyzer.analyze(&source, cancel).await),
                    Err(e) => Response::Report(Report::failure(e.to_string())),
                }
            }
            Request::GetTabInfo { url } => {
                let url = url
                    .or_else(|| self.source.as_ref().map(|s| s.describe()))
                    .unwrap_or_default();
                Response::TabInfo(TabInfo::for_url(&url, &self.site))
            }
        }
    }

    /// Read requests line by line until EOF or cancellation, writing one
    /// JSON response line per request. Requests are handled one at a time.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        mut writer: W,
        cancel: &CancellationToken,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        info!("Serving requests");
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle(&line, cancel).await;
            let mut out = serde_json::to_string(&response).map_err(std::io::Error::other)?;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
        info!("Session closed");
        Ok(())
    }
}

/// Forward lines from a blocking reader (such as stdin) into an async pipe.
///
/// The reader runs on a detached OS thread, outside the runtime's blocking
/// pool, so runtime shutdown never waits on a pending read. Must be called
/// from within a tokio runtime.
pub fn blocking_lines<R>(input: R) -> BufReader<DuplexStream>
where
    R: std::io::BufRead + Send + 'static,
{
    let (reader, mut writer) = tokio::io::duplex(PIPE_CAPACITY);
    let handle = tokio::runtime::Handle::current();
    std::thread::spawn(move || {
        for line in std::io::BufRead::lines(input) {
            let Ok(mut line) = line else {
                break;
            };
            line.push('\n');
            if handle.block_on(writer.write_all(line.as_bytes())).is_err() {
                break;
            }
        }
        debug!("input reader finished");
    });
    BufReader::new(reader)
}
