//! libcurl-backed connector.
//!
//! An opened connection does nothing until `establish`, which runs
//! `Easy::perform` on its own thread. Body chunks are
//! handed to the reader over a bounded channel, so the body is pulled lazily
//! and never buffered whole. Disconnecting drops the receiver and raises the
//! cancel flag; the next write or progress callback aborts the transfer and
//! the thread is joined.

use std::cell::{Cell, RefCell};
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use curl::easy::{Easy, List};

use super::headers::{ResponseHead, ResponseHeaders};
use super::{Connection, Connector, FetchError, FetchOptions, ACCEPT_ENCODINGS};

/// Chunks buffered between the transfer thread and the reader.
const CHANNEL_DEPTH: usize = 8;

const USER_AGENT: &str = concat!("sitematch/", env!("CARGO_PKG_VERSION"));

enum Event {
    Head(ResponseHead),
    Data(Vec<u8>),
    Done,
    Failed(curl::Error),
}

/// Opens connections with libcurl.
#[derive(Debug, Clone, Default)]
pub struct CurlConnector {
    opts: FetchOptions,
}

impl CurlConnector {
    pub fn new(opts: FetchOptions) -> Self {
        Self { opts }
    }

    fn prepare(&self, url: &str) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.opts.max_redirects)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        if let Some(stall) = self.opts.stall_timeout {
            easy.low_speed_limit(1)?;
            easy.low_speed_time(stall)?;
        }
        easy.useragent(USER_AGENT)?;
        // We decode ourselves from the declared Content-Encoding.
        easy.http_content_decoding(false)?;
        let mut list = List::new();
        list.append(&format!("Accept-Encoding: {}", ACCEPT_ENCODINGS))?;
        easy.http_headers(list)?;
        // Needed for the progress callback, which is how a cancelled transfer stops.
        easy.progress(true)?;
        Ok(easy)
    }
}

impl Connector for CurlConnector {
    fn open(&self, url: &str) -> Box<dyn Connection> {
        Box::new(CurlConnection {
            url: url.to_string(),
            connector: self.clone(),
            head: ResponseHead::default(),
            body: CurlBody::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }
}

fn run_transfer(mut easy: Easy, tx: SyncSender<Event>, cancel: &AtomicBool) {
    let headers = RefCell::new(ResponseHeaders::default());
    let head_sent = Cell::new(false);
    let event = match perform(&mut easy, &tx, cancel, &headers, &head_sent) {
        Ok(()) => {
            // Empty body: the write callback never ran.
            if !head_sent.get() && tx.send(Event::Head(headers.borrow().head())).is_err() {
                return;
            }
            Event::Done
        }
        Err(e) => Event::Failed(e),
    };
    let _ = tx.send(event);
}

fn perform(
    easy: &mut Easy,
    tx: &SyncSender<Event>,
    cancel: &AtomicBool,
    headers: &RefCell<ResponseHeaders>,
    head_sent: &Cell<bool>,
) -> Result<(), curl::Error> {
    let mut transfer = easy.transfer();
    transfer.header_function(|line| {
        headers.borrow_mut().push_line(line);
        true
    })?;
    transfer.write_function(|data| {
        if !head_sent.get() {
            head_sent.set(true);
            if tx.send(Event::Head(headers.borrow().head())).is_err() {
                return Ok(0);
            }
        }
        // Returning fewer bytes than given aborts the transfer.
        match tx.send(Event::Data(data.to_vec())) {
            Ok(()) => Ok(data.len()),
            Err(_) => Ok(0),
        }
    })?;
    transfer.progress_function(|_, _, _, _| !cancel.load(Ordering::Relaxed))?;
    transfer.perform()
}

/// Pull side of the chunk channel.
struct CurlBody {
    rx: Option<Receiver<Event>>,
    chunk: Vec<u8>,
    pos: usize,
    done: bool,
}

impl CurlBody {
    /// Empty until the connection is established.
    fn new() -> Self {
        Self {
            rx: None,
            chunk: Vec::new(),
            pos: 0,
            done: false,
        }
    }
}

impl Read for CurlBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.chunk.len() {
                let n = buf.len().min(self.chunk.len() - self.pos);
                buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.done || buf.is_empty() {
                return Ok(0);
            }
            let Some(rx) = self.rx.as_ref() else {
                return Ok(0);
            };
            match rx.recv() {
                Ok(Event::Data(data)) => {
                    self.chunk = data;
                    self.pos = 0;
                }
                Ok(Event::Done) => self.done = true,
                Ok(Event::Failed(e)) => {
                    self.done = true;
                    return Err(io::Error::new(io::ErrorKind::Other, e));
                }
                Ok(Event::Head(_)) => {}
                Err(_) => {
                    self.done = true;
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "transfer ended before the body completed",
                    ));
                }
            }
        }
    }
}

struct CurlConnection {
    url: String,
    connector: CurlConnector,
    head: ResponseHead,
    body: CurlBody,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Connection for CurlConnection {
    fn establish(&mut self) -> Result<(), FetchError> {
        let easy = self.connector.prepare(&self.url)?;
        let (tx, rx) = mpsc::sync_channel(CHANNEL_DEPTH);
        let cancel = Arc::clone(&self.cancel);
        self.handle = Some(
            thread::Builder::new()
                .name("sitematch-transfer".to_string())
                .spawn(move || run_transfer(easy, tx, &cancel))?,
        );

        let first = rx.recv();
        self.body.rx = Some(rx);
        match first {
            Ok(Event::Head(head)) => {
                tracing::debug!(url = %self.url, status = ?head.status, encoding = ?head.content_encoding, "response established");
                self.head = head;
                Ok(())
            }
            Ok(Event::Failed(e)) => Err(FetchError::Curl(e)),
            Ok(Event::Data(_)) | Ok(Event::Done) | Err(_) => Err(FetchError::TransferLost),
        }
    }

    fn status(&self) -> Option<u32> {
        self.head.status
    }

    fn content_encoding(&self) -> Option<&str> {
        self.head.content_encoding.as_deref()
    }

    fn body(&mut self) -> &mut dyn Read {
        &mut self.body
    }

    fn disconnect(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        // Dropping the receiver unblocks a sender waiting on a full channel.
        self.body.rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("transfer thread panicked");
            }
        }
    }
}

impl Drop for CurlConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
