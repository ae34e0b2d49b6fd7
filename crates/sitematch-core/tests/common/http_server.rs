//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves one body at `/` (optionally gzip or raw-deflate encoded), can
//! redirect `/` elsewhere first, and counts the GET requests it answered.
//! Anything that is not a readable HTTP request (e.g. a TLS ClientHello) gets
//! the connection closed.

use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// `Some("gzip")` or `Some("deflate")` to compress the body.
    pub encoding: Option<&'static str>,
    /// Status code for the body response.
    pub status: u16,
    /// If set, `/` answers 301 to this path and the body is served there.
    pub redirect_to: Option<&'static str>,
    /// Send this instead of the real encoding's bytes (corrupt payload).
    pub corrupt: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            status: 200,
            redirect_to: None,
            corrupt: false,
        }
    }
}

pub struct TestServer {
    /// `127.0.0.1:<port>`: usable as a hostname.
    pub host: String,
    requests: Arc<AtomicUsize>,
}

impl TestServer {
    /// GET requests answered so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn start(body: &str) -> TestServer {
    start_with_options(body, ServerOptions::default())
}

/// Starts a server in a background thread; it runs until the process exits.
pub fn start_with_options(body: &str, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let payload = Arc::new(encode(body.as_bytes(), opts));
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let payload = Arc::clone(&payload);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &payload, opts, &counter));
        }
    });
    TestServer {
        host: format!("127.0.0.1:{}", port),
        requests,
    }
}

fn encode(body: &[u8], opts: ServerOptions) -> Vec<u8> {
    if opts.corrupt {
        return b"this is not a compressed stream".to_vec();
    }
    match opts.encoding {
        Some("gzip") => {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(body).unwrap();
            enc.finish().unwrap()
        }
        Some("deflate") => {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
            enc.write_all(body).unwrap();
            enc.finish().unwrap()
        }
        _ => body.to_vec(),
    }
}

fn handle(mut stream: TcpStream, payload: &[u8], opts: ServerOptions, counter: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return;
    };
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }
    counter.fetch_add(1, Ordering::SeqCst);

    if let Some(target) = opts.redirect_to {
        if path == "/" {
            let response = format!(
                "HTTP/1.1 301 Moved Permanently\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                target
            );
            let _ = stream.write_all(response.as_bytes());
            return;
        }
    }

    let encoding_header = match opts.encoding {
        Some(enc) => format!("Content-Encoding: {}\r\n", enc),
        None => String::new(),
    };
    let response = format!(
        "HTTP/1.1 {} Status\r\nContent-Type: text/html\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        opts.status,
        payload.len(),
        encoding_header
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(payload);
}
