//! In-memory connector that records every opened attempt and every disconnect.

use flate2::write::GzEncoder;
use flate2::Compression;
use sitematch_core::fetch::{Connection, Connector, FetchError};
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// What the fake returns for a URL.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Connection succeeds and serves `body` with the given Content-Encoding.
    Body {
        body: Vec<u8>,
        encoding: Option<&'static str>,
    },
    /// Establishing the connection fails with this message.
    ConnectError(String),
    /// Connection succeeds, `prefix` is readable, then reading fails with `message`.
    ReadError { prefix: Vec<u8>, message: String },
}

impl Reply {
    pub fn text(body: &str) -> Self {
        Reply::Body {
            body: body.as_bytes().to_vec(),
            encoding: None,
        }
    }

    pub fn gzip(body: &str) -> Self {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(body.as_bytes()).unwrap();
        Reply::Body {
            body: enc.finish().unwrap(),
            encoding: Some("gzip"),
        }
    }

    pub fn refused(message: &str) -> Self {
        Reply::ConnectError(message.to_string())
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

/// Routes full URLs (e.g. `https://a.com`) to replies; unknown URLs fail to connect.
#[derive(Default)]
pub struct FakeConnector {
    routes: HashMap<String, Reply>,
    pub counters: Arc<Counters>,
    calls: Mutex<Vec<String>>,
    /// Time each successful connection stays open before its body is readable.
    delay: Duration,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn route(mut self, url: &str, reply: Reply) -> Self {
        self.routes.insert(url.to_string(), reply);
        self
    }

    /// URLs passed to `open`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.counters.disconnects.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn open(&self, url: &str) -> Box<dyn Connection> {
        self.calls.lock().unwrap().push(url.to_string());
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Reply::refused("could not resolve host"));
        Box::new(FakeConnection {
            reply: Some(reply),
            body: Box::new(io::empty()),
            encoding: None,
            established: false,
            delay: self.delay,
            counters: Arc::clone(&self.counters),
        })
    }
}

struct FailingRead(String);

impl Read for FailingRead {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, self.0.clone()))
    }
}

struct FakeConnection {
    reply: Option<Reply>,
    body: Box<dyn Read + Send>,
    encoding: Option<&'static str>,
    established: bool,
    delay: Duration,
    counters: Arc<Counters>,
}

impl Connection for FakeConnection {
    fn establish(&mut self) -> Result<(), FetchError> {
        let (body, encoding): (Box<dyn Read + Send>, Option<&'static str>) = match self.reply.take() {
            Some(Reply::Body { body, encoding }) => (Box::new(Cursor::new(body)), encoding),
            Some(Reply::ReadError { prefix, message }) => {
                (Box::new(Cursor::new(prefix).chain(FailingRead(message))), None)
            }
            Some(Reply::ConnectError(message)) => {
                return Err(FetchError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    message,
                )))
            }
            None => panic!("connection established twice"),
        };
        self.body = body;
        self.encoding = encoding;
        self.established = true;
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        Ok(())
    }

    fn status(&self) -> Option<u32> {
        self.established.then_some(200)
    }

    fn content_encoding(&self) -> Option<&str> {
        self.encoding
    }

    fn body(&mut self) -> &mut dyn Read {
        &mut self.body
    }

    fn disconnect(&mut self) {
        self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.established {
            self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
