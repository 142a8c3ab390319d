//! Fetching seed address lists from a remote bootstrap service.
//!
//! The service answers a plain HTTP GET with whitespace or newline separated
//! URI tokens. Tokens that do not parse are skipped.

use crate::address::Uri;
use std::time::Duration;

/// Upper bound on a single bootstrap request, connect included.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(7);

/// Errors that can occur while contacting a bootstrap service
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("bootstrap request to {uri} failed: {source}")]
    Request {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("bootstrap service {uri} returned status {status}")]
    Status { uri: String, status: u16 },

    #[error("bootstrap URI {uri} is not an http(s) URL")]
    UnsupportedUri { uri: String },
}

/// Source of seed addresses for sentinel replacement.
pub trait SeedSource {
    fn fetch(&self, uri: &Uri) -> Result<Vec<Uri>, BootstrapError>;
}

/// Blocking HTTP implementation of [`SeedSource`].
#[derive(Debug, Clone)]
pub struct HttpSeedFetcher {
    timeout: Duration,
}

impl Default for HttpSeedFetcher {
    fn default() -> Self {
        Self {
            timeout: FETCH_TIMEOUT,
        }
    }
}

impl HttpSeedFetcher {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl SeedSource for HttpSeedFetcher {
    fn fetch(&self, uri: &Uri) -> Result<Vec<Uri>, BootstrapError> {
        let url = uri.to_string();
        if !(uri.has_scheme("http") || uri.has_scheme("https")) {
            return Err(BootstrapError::UnsupportedUri { uri: url });
        }

        log::debug!("Fetching bootstrap seeds from: {}", url);
        let body = fetch_text(&url, self.timeout)?;
        let seeds = parse_seed_list(&body);
        log::info!("Bootstrap service {} returned {} seed(s)", url, seeds.len());
        Ok(seeds)
    }
}

/// GET `url` and return the response body, bounded by `timeout`.
pub fn fetch_text(url: &str, timeout: Duration) -> Result<String, BootstrapError> {
    let request_err = |source| BootstrapError::Request {
        uri: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("peercfg/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(request_err)?;

    let response = client.get(url).send().map_err(request_err)?;

    if !response.status().is_success() {
        return Err(BootstrapError::Status {
            uri: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().map_err(request_err)
}

/// Tokenize a seed list body into URIs, discarding unparsable tokens.
pub fn parse_seed_list(body: &str) -> Vec<Uri> {
    body.split_whitespace()
        .filter_map(|token| match token.parse::<Uri>() {
            Ok(uri) => Some(uri),
            Err(e) => {
                log::warn!("Ignoring bootstrap token '{}': {}", token, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one HTTP response on a local port and return the base URL.
    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut stream = stream;
            write!(
                stream,
                "{}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            )
            .unwrap();
        });
        (format!("http://127.0.0.1:{}/seeds", port), handle)
    }

    #[test]
    fn test_parse_seed_list_skips_garbage() {
        let seeds = parse_seed_list("tcp://10.0.0.1:9701\n  http://10.0.0.2:9700\ttcp:bad\n\n");
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].to_string(), "tcp://10.0.0.1:9701");
        assert_eq!(seeds[1].to_string(), "http://10.0.0.2:9700");
    }

    #[test]
    fn test_fetch_from_local_service() {
        let (url, handle) =
            serve_once("HTTP/1.1 200 OK", "tcp://192.0.2.1:9701\nhttp://192.0.2.2:9700\n");
        let seeds = HttpSeedFetcher::default().fetch(&url.parse().unwrap()).unwrap();
        handle.join().unwrap();
        assert_eq!(seeds.len(), 2);
        assert!(seeds[0].has_scheme("tcp"));
        assert!(seeds[1].has_scheme("http"));
    }

    #[test]
    fn test_fetch_reports_http_status() {
        let (url, handle) = serve_once("HTTP/1.1 503 Service Unavailable", "");
        let err = HttpSeedFetcher::default().fetch(&url.parse().unwrap()).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, BootstrapError::Status { status: 503, .. }));
    }

    #[test]
    fn test_fetch_connection_refused_is_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let uri: Uri = format!("http://127.0.0.1:{}/", port).parse().unwrap();
        let err = HttpSeedFetcher::with_timeout(Duration::from_secs(2))
            .fetch(&uri)
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Request { .. }));
    }

    #[test]
    fn test_fetch_rejects_non_http_uri() {
        let uri: Uri = "tcp://127.0.0.1:9701".parse().unwrap();
        let err = HttpSeedFetcher::default().fetch(&uri).unwrap_err();
        assert!(matches!(err, BootstrapError::UnsupportedUri { .. }));
    }
}
