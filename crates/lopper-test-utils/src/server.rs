//! Loopback HTTP server serving canned policy pack bodies.
//!
//! Speaks just enough HTTP/1.1 for a blocking client: reads the request
//! head, answers with `Content-Length` and `Connection: close`.

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A canned response for one request path.
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl Route {
    /// `200 OK` with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: None,
        }
    }

    /// An empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            delay: None,
        }
    }

    /// Wait `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Serves [`Route`]s on `127.0.0.1` until dropped; unknown paths get 404.
pub struct PackServer {
    addr: SocketAddr,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PackServer {
    /// Start serving `routes`, keyed by request path (e.g. `/packs/base.yml`).
    ///
    /// # Panics
    /// Panics if the listener cannot be bound.
    pub fn start<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = (S, Route)>,
        S: Into<String>,
    {
        let routes: HashMap<String, Route> =
            routes.into_iter().map(|(p, r)| (p.into(), r)).collect();
        let listener = TcpListener::bind("127.0.0.1:0")
            .unwrap_or_else(|e| panic!("PackServer: bind failed: {e}"));
        listener
            .set_nonblocking(true)
            .unwrap_or_else(|e| panic!("PackServer: set_nonblocking failed: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("PackServer: local_addr failed: {e}"));

        let hits = Arc::new(Mutex::new(HashMap::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = {
            let hits = Arc::clone(&hits);
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || serve(listener, routes, hits, shutdown))
        };

        Self {
            addr,
            hits,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .map(|h| h.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Drop for PackServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    listener: TcpListener,
    routes: HashMap<String, Route>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                let _ = handle_connection(stream, &routes, &hits);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(_) => break,
        }
    }
}

fn handle_connection(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, usize>>,
) -> std::io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;

    let head = read_request_head(&mut stream)?;
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    if let Ok(mut hits) = hits.lock() {
        *hits.entry(path.clone()).or_insert(0) += 1;
    }

    let route = routes.get(&path).cloned().unwrap_or(Route::status(404));
    if let Some(delay) = route.delay {
        thread::sleep(delay);
    }

    write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        reason(route.status),
        route.body.len()
    )?;
    stream.write_all(&route.body)?;
    stream.flush()
}

fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = [0_u8; 1024];
    let mut request = Vec::new();
    loop {
        let read = stream.read(&mut buf)?;
        if read == 0 {
            break;
        }
        request.extend_from_slice(&buf[..read]);
        if request.windows(4).any(|window| window == b"\r\n\r\n") || request.len() > 64 * 1024 {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&request).into_owned())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
