//! Shared fixtures: a one-route HTTP server and collaborator fakes.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use dzsync_core::ParsedVersion;
use dzsync_renderer::RenderedCommand;
use dzsync_sync::{CommandExecutor, DocumentFetcher, IdentityClient, SyncError, VersionProbe};

// ---------------------------------------------------------------------------
// HTTP fixture
// ---------------------------------------------------------------------------

/// A captured request: header block plus body.
#[derive(Debug, Clone)]
pub struct Captured {
    pub head: String,
    pub body: String,
}

/// Serves the same canned response to every request on a loopback port.
pub struct HttpFixture {
    pub url: String,
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl HttpFixture {
    pub fn serve(status: u16, content_type: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture");
        let url = format!("http://{}/", listener.local_addr().expect("addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        let response = format!(
            "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            reason(status),
            body.len()
        );
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                if let Some(captured) = read_request(&mut stream) {
                    log.lock().expect("request log").push(captured);
                }
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        HttpFixture { url, requests }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().expect("request log").clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Captured> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut head = String::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        if line == "\r\n" {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        head.push_str(&line);
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(Captured {
        head,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// A loopback URL with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}/")
}

// ---------------------------------------------------------------------------
// Collaborator fakes
// ---------------------------------------------------------------------------

/// Serves a fixed document and counts fetches.
pub struct StaticFetcher {
    body: String,
    pub fetches: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new(body: impl Into<String>) -> Self {
        StaticFetcher {
            body: body.into(),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl DocumentFetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> Result<String, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

pub struct FixedProbe(pub &'static str);

impl VersionProbe for FixedProbe {
    fn installed_version(&self) -> Result<ParsedVersion, SyncError> {
        ParsedVersion::parse(self.0).map_err(|source| SyncError::VersionParse {
            text: self.0.to_string(),
            source,
        })
    }
}

pub struct FailingProbe;

impl VersionProbe for FailingProbe {
    fn installed_version(&self) -> Result<ParsedVersion, SyncError> {
        Err(SyncError::Probe {
            bin: "doublezero".to_string(),
            reason: "not installed".to_string(),
        })
    }
}

pub struct FixedIdentity(pub &'static str);

impl IdentityClient for FixedIdentity {
    fn get_identity(&self) -> Result<String, SyncError> {
        Ok(self.0.to_string())
    }
}

/// Records every command it is asked to run; fails those named in `fail`.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    pub ran: Arc<Mutex<Vec<RenderedCommand>>>,
    pub fail: Vec<String>,
}

impl RecordingExecutor {
    pub fn failing(names: &[&str]) -> Self {
        RecordingExecutor {
            ran: Arc::default(),
            fail: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn ran(&self) -> Vec<RenderedCommand> {
        self.ran.lock().expect("executor log").clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, command: &RenderedCommand) -> Result<(), SyncError> {
        self.ran.lock().expect("executor log").push(command.clone());
        if self.fail.contains(&command.name) {
            return Err(SyncError::CommandExecution {
                name: command.name.clone(),
                reason: "exited with exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Two install blocks, no cluster markers.
pub fn positional_page(first: &str, second: &str) -> String {
    format!(
        r#"<html><body>
<h2>Install</h2>
<p>Run the following:</p>
<pre><code>sudo apt-get install doublezero={first}</code></pre>
<p>Or for the other cluster:</p>
<pre><code>sudo apt-get install doublezero={second}</code></pre>
</body></html>"#
    )
}

/// Testnet listed first, each block preceded by its marker.
pub fn marked_page(testnet: &str, mainnet: &str) -> String {
    format!(
        r#"<html><body>
<h3>Testnet</h3>
<p>The current recommended deployment for <strong>testnet</strong> is:</p>
<div class="highlight"><pre><code>sudo apt-get install doublezero={testnet}</code></pre></div>
<h3>Mainnet-Beta</h3>
<p>The current recommended deployment for Mainnet-Beta is:</p>
<div class="highlight"><pre><code>sudo apt-get install doublezero={mainnet}</code></pre></div>
</body></html>"#
    )
}
