//! Shared test infrastructure for integration tests.
//!
//! `StubService` stands in for the generation service: it serves a fixed
//! list of HTTP replies, one per connection, and hands back the raw requests
//! it received.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long the stub waits for the next connection before giving up.
const ACCEPT_DEADLINE: Duration = Duration::from_secs(20);

/// One scripted reply.
pub struct StubReply {
    pub status: u16,
    pub reason: &'static str,
    pub body: String,
}

impl StubReply {
    /// 200 carrying `records` as the generated text.
    pub fn records(records: &[Value]) -> Self {
        let text = serde_json::to_string(records).expect("serialize records");
        Self {
            status: 200,
            reason: "OK",
            body: json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
                .to_string(),
        }
    }

    pub fn status(status: u16, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            body: json!({ "error": { "code": status, "message": reason } }).to_string(),
        }
    }
}

/// A request as seen by the stub.
#[derive(Debug)]
pub struct SeenRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

pub struct StubService {
    pub base_url: String,
    handle: JoinHandle<Vec<SeenRequest>>,
}

impl StubService {
    pub fn start(replies: Vec<StubReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub service");
        let addr = listener.local_addr().expect("stub address");
        listener
            .set_nonblocking(true)
            .expect("set stub listener nonblocking");
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for reply in replies {
                let Some(mut stream) = accept_with_deadline(&listener) else {
                    break;
                };
                match read_request(&mut stream) {
                    Ok(request) => seen.push(request),
                    Err(_) => break,
                }
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reply.status,
                    reply.reason,
                    reply.body.len(),
                    reply.body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
            seen
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Wait for the scripted replies to be served and return the requests.
    pub fn finish(self) -> Vec<SeenRequest> {
        self.handle.join().expect("stub service thread")
    }
}

fn accept_with_deadline(listener: &TcpListener) -> Option<TcpStream> {
    let start = Instant::now();
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false).ok()?;
                stream
                    .set_read_timeout(Some(Duration::from_secs(5)))
                    .ok()?;
                return Some(stream);
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                if start.elapsed() > ACCEPT_DEADLINE {
                    return None;
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return None,
        }
    }
}

fn read_request(stream: &mut TcpStream) -> io::Result<SeenRequest> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let header = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    };
    let body = if let Some(length) = header("content-length") {
        let length: usize = length
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "bad content-length"))?;
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;
        body
    } else if header("transfer-encoding").is_some_and(|value| value.contains("chunked")) {
        read_chunked(&mut reader)?
    } else {
        Vec::new()
    };

    Ok(SeenRequest {
        request_line: request_line.trim_end().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn read_chunked(reader: &mut impl BufRead) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line)?;
        let size = usize::from_str_radix(size_line.trim().split(';').next().unwrap_or("0"), 16)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "bad chunk size"))?;
        if size == 0 {
            let mut trailer = String::new();
            reader.read_line(&mut trailer)?;
            return Ok(body);
        }
        let mut chunk = vec![0u8; size];
        reader.read_exact(&mut chunk)?;
        body.extend_from_slice(&chunk);
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
    }
}

/// A listener nothing should ever connect to.
pub struct SilentService {
    pub base_url: String,
    listener: TcpListener,
}

impl SilentService {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent service");
        listener
            .set_nonblocking(true)
            .expect("set silent listener nonblocking");
        let addr = listener.local_addr().expect("silent address");
        Self {
            base_url: format!("http://{addr}"),
            listener,
        }
    }

    pub fn connection_attempted(&self) -> bool {
        self.listener.accept().is_ok()
    }
}

pub fn game(name: &str) -> Value {
    json!({
        "name": name,
        "studio": format!("{name} Studio"),
        "genres": ["Adventure", "Indie"],
        "release_date": "2023-11-14",
        "image": format!("https://img.example.com/{name}.jpg"),
        "description": format!("{name} is a game."),
        "site": format!("https://{name}.example.com"),
    })
}

pub fn games(prefix: &str, count: usize) -> Vec<Value> {
    (0..count).map(|i| game(&format!("{prefix}{i}"))).collect()
}

pub fn write_corpus(path: &Path, records: &[Value]) {
    std::fs::write(path, serde_json::to_vec_pretty(records).expect("serialize corpus"))
        .expect("write corpus");
}

pub fn read_corpus(path: &Path) -> Vec<Value> {
    let bytes = std::fs::read(path).expect("read corpus");
    serde_json::from_slice(&bytes).expect("corpus is a JSON array")
}

/// Run the built binary with a clean credential environment.
pub fn gamedex(args: &[&str], api_key: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gamedex"));
    command.args(args).env_remove("GEMINI_API_KEY").env_remove("RUST_LOG");
    if let Some(key) = api_key {
        command.env("GEMINI_API_KEY", key);
    }
    command.output().expect("run gamedex")
}
