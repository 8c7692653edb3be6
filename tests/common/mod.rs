//! Shared test doubles: an in-process fake server on duplex pipes and a
//! process control that records termination calls.

#![allow(dead_code)]

use async_trait::async_trait;
use mcp_probe::config::ProbeConfig;
use mcp_probe::errors::{ProbeError, ProbeResult};
use mcp_probe::mcp::process::{ProcessControl, Termination};
use mcp_probe::session::Session;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

// --- Process double ---

#[derive(Clone, Default)]
pub struct TerminationLog(Arc<AtomicUsize>);

impl TerminationLog {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct RecordingProcess {
    log: TerminationLog,
    fail: bool,
}

impl RecordingProcess {
    pub fn new(log: TerminationLog) -> Self {
        Self { log, fail: false }
    }

    pub fn failing(log: TerminationLog) -> Self {
        Self { log, fail: true }
    }
}

#[async_trait]
impl ProcessControl for RecordingProcess {
    async fn terminate(&mut self) -> ProbeResult<Termination> {
        self.log.0.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProbeError::Process("refused to die".to_string()));
        }
        Ok(Termination {
            code: Some(0),
            forced: false,
        })
    }

    fn pid(&self) -> Option<u32> {
        Some(4242)
    }
}

// --- Fake server ---

/// What the fake server does when the next request arrives.
pub enum Scripted {
    Line(String),
    /// Arbitrary bytes, newline appended
    Bytes(Vec<u8>),
    /// Close stdout without answering
    Close,
}

pub fn line(text: &str) -> Scripted {
    Scripted::Line(text.to_string())
}

pub struct FakeServer {
    pub received: Arc<Mutex<Vec<String>>>,
    pub task: JoinHandle<()>,
}

impl FakeServer {
    /// Wait for the probe to hang up, then return every line it sent.
    pub async fn finish(self) -> Vec<String> {
        self.task.await.expect("fake server task");
        let lines = self.received.lock().unwrap().clone();
        lines
    }
}

pub type FakeSession = Session<DuplexStream, DuplexStream, RecordingProcess>;

/// Session wired to a fake server replying from `replies`, one per request.
/// Once the replies run out the server closes its output.
pub fn fake_session(
    replies: Vec<Scripted>,
    process: RecordingProcess,
) -> (FakeSession, FakeServer) {
    let (probe_stdin, server_stdin) = tokio::io::duplex(64 * 1024);
    let (server_stdout, probe_stdout) = tokio::io::duplex(64 * 1024);

    let received = Arc::new(Mutex::new(Vec::new()));
    let seen = received.clone();

    let task = tokio::spawn(async move {
        let mut replies: VecDeque<Scripted> = replies.into();
        let mut out = Some(server_stdout);
        let mut lines = BufReader::new(server_stdin).lines();

        while let Ok(Some(incoming)) = lines.next_line().await {
            let is_request = serde_json::from_str::<serde_json::Value>(&incoming)
                .map(|v| v.get("id").is_some())
                .unwrap_or(true);
            seen.lock().unwrap().push(incoming);
            if !is_request {
                continue;
            }
            match replies.pop_front() {
                Some(Scripted::Line(text)) => {
                    if let Some(w) = out.as_mut() {
                        let _ = w.write_all(format!("{}\n", text).as_bytes()).await;
                    }
                }
                Some(Scripted::Bytes(mut bytes)) => {
                    bytes.push(b'\n');
                    if let Some(w) = out.as_mut() {
                        let _ = w.write_all(&bytes).await;
                    }
                }
                Some(Scripted::Close) | None => {
                    out = None;
                }
            }
        }
    });

    let session = Session::new(probe_stdout, probe_stdin, process, None);
    (session, FakeServer { received, task })
}

/// Config with every delay set to zero.
pub fn fast_config() -> ProbeConfig {
    ProbeConfig {
        startup_delay: Duration::ZERO,
        step_delay: Duration::ZERO,
        drain_delay: Duration::ZERO,
        terminate_grace: Duration::from_secs(2),
        ..ProbeConfig::default()
    }
}

pub fn canned_replies() -> Vec<Scripted> {
    vec![
        line(r#"{"jsonrpc":"2.0","id":0,"result":{"protocolVersion":"2024-11-05","capabilities":{}}}"#),
        line(
            r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"SystemInformation","description":"Host details"},{"name":"DomainAvailability","description":"Domain check"}]}}"#,
        ),
        line(r#"{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"os: fake"}]}}"#),
        line(
            r#"{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"digitalmatrix.com available: false"}]}}"#,
        ),
    ]
}
