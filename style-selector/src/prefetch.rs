use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{debug, warn};

const PREFETCH_THREAD_NAME: &str = "tile-prefetch";
const DEFAULT_PREFETCH_TIMEOUT: Duration = Duration::from_secs(5);
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Warms a cache by requesting a tile. Implementations must return without
/// waiting on the request and must swallow its failures.
pub trait TilePrefetcher: Send + Sync {
    fn prefetch(&self, url: &str);

    /// Blocks until outstanding prefetches finish or `timeout` elapses.
    /// Returns `true` when nothing is left in flight.
    fn wait(&self, _timeout: Duration) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPrefetcher;

impl TilePrefetcher for NoopPrefetcher {
    fn prefetch(&self, url: &str) {
        debug!(%url, "tile prefetch disabled");
    }
}

/// Issues one GET per prefetch on a background thread. Clones share the set
/// of in-flight requests, so any clone can [`wait`](TilePrefetcher::wait) on
/// them.
#[derive(Clone, Debug)]
pub struct HttpTilePrefetcher {
    client: Client,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl HttpTilePrefetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_PREFETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Number of prefetch threads that have not been reaped yet.
    pub fn pending(&self) -> usize {
        self.reap_finished()
    }

    fn reap_finished(&self) -> usize {
        let Ok(mut in_flight) = self.in_flight.lock() else {
            warn!("tile prefetch registry poisoned");
            return 0;
        };

        let (finished, running): (Vec<_>, Vec<_>) =
            in_flight.drain(..).partition(JoinHandle::is_finished);
        *in_flight = running;

        for handle in finished {
            if handle.join().is_err() {
                warn!("tile prefetch thread panicked");
            }
        }
        in_flight.len()
    }
}

impl TilePrefetcher for HttpTilePrefetcher {
    fn prefetch(&self, url: &str) {
        let client = self.client.clone();
        let url = url.to_string();

        let spawned = thread::Builder::new()
            .name(PREFETCH_THREAD_NAME.to_string())
            .spawn(move || fetch_tile(&client, &url));

        match spawned {
            Ok(handle) => match self.in_flight.lock() {
                Ok(mut in_flight) => in_flight.push(handle),
                Err(_) => warn!("tile prefetch registry poisoned, request detached"),
            },
            Err(err) => warn!(?err, "failed to spawn tile prefetch thread"),
        }
    }

    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = self.reap_finished();
            if remaining == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(remaining, "tile prefetch still running after wait timeout");
                return false;
            }
            thread::sleep(WAIT_POLL_INTERVAL.min(deadline - now));
        }
    }
}

fn fetch_tile(client: &Client, url: &str) {
    let response = match client.get(url).send() {
        Ok(response) => response,
        Err(err) => {
            warn!(%url, ?err, "tile prefetch request failed");
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(%url, %status, "tile prefetch returned an error status");
        return;
    }

    // Reading the body is what lands the tile in any intermediate cache.
    match response.bytes() {
        Ok(bytes) => debug!(%url, bytes = bytes.len(), "prefetched tile"),
        Err(err) => warn!(%url, ?err, "failed to read prefetched tile"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Serves one `200 OK` tile and reports the request line it received.
    fn one_shot_tile_server() -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept prefetch");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("read request line");
            loop {
                let mut header = String::new();
                let read = reader.read_line(&mut header).expect("read header");
                if read == 0 || header == "\r\n" {
                    break;
                }
            }
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\ntile")
                .expect("write response");
            tx.send(request_line).expect("report request");
        });

        (format!("http://{addr}"), rx)
    }

    #[test]
    fn noop_prefetcher_accepts_any_url() {
        NoopPrefetcher.prefetch("not a url");
        assert!(NoopPrefetcher.wait(Duration::ZERO));
    }

    #[test]
    fn http_prefetch_returns_before_the_request_completes() {
        let prefetcher =
            HttpTilePrefetcher::with_timeout(Duration::from_secs(2)).expect("build client");
        // Accepts connections but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let url = format!("http://{}/0/0/0.png", listener.local_addr().expect("addr"));

        let started = Instant::now();
        prefetcher.prefetch(&url);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(prefetcher.pending(), 1);

        assert!(!prefetcher.wait(Duration::from_millis(20)));
        assert!(prefetcher.wait(Duration::from_secs(5)));
        assert_eq!(prefetcher.pending(), 0);
    }

    #[test]
    fn wait_lets_the_tile_request_reach_the_server() {
        let (base, requests) = one_shot_tile_server();
        let prefetcher = HttpTilePrefetcher::new().expect("build client");

        prefetcher.prefetch(&format!("{base}/10/0/0.png"));
        assert!(prefetcher.wait(Duration::from_secs(5)));

        let request_line = requests
            .recv_timeout(Duration::from_secs(1))
            .expect("server saw the prefetch");
        assert!(request_line.starts_with("GET /10/0/0.png "));
    }

    #[test]
    fn failed_requests_are_swallowed() {
        let prefetcher =
            HttpTilePrefetcher::with_timeout(Duration::from_millis(200)).expect("build client");
        prefetcher.prefetch("definitely not a url");
        assert!(prefetcher.wait(Duration::from_secs(5)));
    }
}
