//! Plain-HTTP product page retrieval
//!
//! A blocking ureq agent stands in for the browser when only the initial
//! page is needed. No script runs, so the offers side panel is never
//! available this way; extraction falls back to the main page for offers.

use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::chain::compile_one;
use crate::config::FetchConfig;
use crate::error::{ExtractError, Result};
use crate::snapshot::MarkupSnapshot;

/// Parse `raw` and check that it is an http(s) URL on an allowed host.
pub fn validate_product_url(raw: &str, allowed_hosts: &[String]) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| ExtractError::UnsupportedUrl(format!("{raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::UnsupportedUrl(format!("{raw}: not an http(s) url")));
    }

    let host = url.host_str().unwrap_or_default().to_lowercase();
    if !allowed_hosts.iter().any(|allowed| allowed.eq_ignore_ascii_case(&host)) {
        return Err(ExtractError::UnsupportedUrl(format!("{raw}: host '{host}' is not supported")));
    }

    Ok(url)
}

pub struct PageFetcher {
    agent: ureq::Agent,
    allowed_hosts: Vec<String>,
    ready: Selector,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(config.timeout()))
                .user_agent(config.user_agent.as_str())
                .http_status_as_error(false)
                .build(),
        );

        Ok(Self {
            agent,
            allowed_hosts: config.allowed_hosts.clone(),
            ready: compile_one("ready_selector", &config.ready_selector)?,
        })
    }

    /// Fetch a product page. Anything short of a loaded product page is
    /// `SnapshotUnavailable`.
    pub fn fetch(&self, raw_url: &str) -> Result<MarkupSnapshot> {
        let url = validate_product_url(raw_url, &self.allowed_hosts)?;
        debug!(%url, "fetching product page");

        let markup = match self.agent.get(url.as_str()).call() {
            Ok(resp) => {
                if !resp.status().is_success() {
                    return Err(ExtractError::unavailable(format!("HTTP {} for {}", resp.status(), url)));
                }
                resp.into_body()
                    .read_to_string()
                    .map_err(|e| ExtractError::unavailable(format!("failed to read {url}: {e}")))?
            }
            Err(e) => {
                return Err(ExtractError::unavailable(format!("failed to fetch {url}: {e}")));
            }
        };

        self.ensure_loaded(&markup)?;
        info!(%url, bytes = markup.len(), "product page fetched");
        Ok(MarkupSnapshot::new(markup)?.with_base_url(url))
    }

    /// The page counts as loaded once the ready anchor is present.
    pub fn ensure_loaded(&self, markup: &str) -> Result<()> {
        if markup.trim().is_empty() {
            return Err(ExtractError::unavailable("page body is empty"));
        }
        if Html::parse_document(markup).select(&self.ready).next().is_none() {
            return Err(ExtractError::unavailable("product title never appeared on the page"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        FetchConfig::default().allowed_hosts
    }

    #[test]
    fn test_accepts_product_urls() {
        let url = validate_product_url("https://www.amazon.in/dp/B0C1234567", &hosts()).unwrap();
        assert_eq!(url.host_str(), Some("www.amazon.in"));
        assert!(validate_product_url("http://AMAZON.in/some-tv/dp/B0C1234567?th=1", &hosts()).is_ok());
    }

    #[test]
    fn test_rejects_other_urls() {
        for raw in [
            "https://www.amazon.com/dp/B0C1234567",
            "ftp://www.amazon.in/dp/B0C1234567",
            "not a url",
            "https://www.amazon.in.evil.example/dp/x",
        ] {
            assert!(
                matches!(validate_product_url(raw, &hosts()), Err(ExtractError::UnsupportedUrl(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_ready_anchor() {
        let fetcher = PageFetcher::new(&FetchConfig::default()).unwrap();
        assert!(fetcher
            .ensure_loaded(r#"<span id="productTitle">TV</span>"#)
            .is_ok());
        assert!(matches!(
            fetcher.ensure_loaded("<html><body>Robot check</body></html>"),
            Err(ExtractError::SnapshotUnavailable(_))
        ));
        assert!(matches!(fetcher.ensure_loaded(""), Err(ExtractError::SnapshotUnavailable(_))));
    }

    fn local_fetcher() -> PageFetcher {
        PageFetcher::new(&FetchConfig {
            allowed_hosts: vec!["127.0.0.1".to_string()],
            timeout_ms: 5_000,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    /// Serve one canned HTTP response on a local port.
    fn serve_once(response: &'static str) -> u16 {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        port
    }

    #[test]
    fn test_http_error_status_is_unavailable() {
        let port = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let err = local_fetcher()
            .fetch(&format!("http://127.0.0.1:{port}/dp/x"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::SnapshotUnavailable(ref msg) if msg.contains("503")), "{err:?}");
    }

    #[test]
    fn test_refused_connection_is_unavailable() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        // listener dropped, nothing accepts on this port any more
        let err = local_fetcher()
            .fetch(&format!("http://127.0.0.1:{port}/dp/x"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::SnapshotUnavailable(_)), "{err:?}");
    }

    #[test]
    fn test_loaded_page_becomes_snapshot() {
        let port = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 33\r\nConnection: close\r\n\r\n<span id=\"productTitle\">TV</span>",
        );
        let url = format!("http://127.0.0.1:{port}/dp/x");
        let snapshot = local_fetcher().fetch(&url).unwrap();
        assert!(snapshot.markup().contains("productTitle"));
        assert_eq!(snapshot.base_url().map(|u| u.as_str()), Some(url.as_str()));
    }

    #[test]
    fn test_page_without_title_is_unavailable() {
        let port = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 19\r\nConnection: close\r\n\r\n<p>Robot check</p>\n",
        );
        let err = local_fetcher()
            .fetch(&format!("http://127.0.0.1:{port}/dp/x"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::SnapshotUnavailable(_)), "{err:?}");
    }

    #[test]
    fn test_fetch_rejects_before_network() {
        let fetcher = PageFetcher::new(&FetchConfig::default()).unwrap();
        assert!(matches!(
            fetcher.fetch("https://example.com/dp/x"),
            Err(ExtractError::UnsupportedUrl(_))
        ));
    }
}
