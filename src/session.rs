// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request/response exchange with a running server.
//!
//! A `Session` owns both pipe ends and the process control. Every request is
//! written as one line, flushed, and answered by exactly one line read (or by
//! the stream ending). The session must be finished with `shutdown`, which
//! terminates the server at most once.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, warn};

use crate::errors::{ProbeError, ProbeResult};
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest};
use crate::mcp::codec::LineCodec;
use crate::mcp::process::{ProcessControl, Termination};

/// Result of one exchange.
#[derive(Debug)]
pub enum Reply {
    /// A line arrived and decoded as JSON
    Received { raw: String, value: Value },
    /// The stream ended, or the server wrote a blank line
    NoResponse,
    /// A line arrived but is not JSON
    Malformed {
        raw: String,
        error: serde_json::Error,
    },
}

impl Reply {
    fn from_line(line: &[u8]) -> Self {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Reply::NoResponse;
        }
        // Parsing the bytes rejects invalid UTF-8 along with invalid JSON
        let raw = String::from_utf8_lossy(line).into_owned();
        match serde_json::from_slice::<Value>(line) {
            Ok(value) => Reply::Received { raw, value },
            Err(error) => Reply::Malformed { raw, error },
        }
    }
}

pub struct Session<R, W, P> {
    reader: FramedRead<R, LineCodec>,
    writer: FramedWrite<W, LineCodec>,
    process: P,
    read_timeout: Option<Duration>,
    terminated: bool,
}

impl<R, W, P> Session<R, W, P>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    P: ProcessControl,
{
    pub fn new(stdout: R, stdin: W, process: P, read_timeout: Option<Duration>) -> Self {
        Self {
            reader: FramedRead::new(stdout, LineCodec::new()),
            writer: FramedWrite::new(stdin, LineCodec::new()),
            process,
            read_timeout,
            terminated: false,
        }
    }

    /// Write one request and read exactly one line back.
    pub async fn send_request(&mut self, request: &JsonRpcRequest) -> ProbeResult<Reply> {
        debug!(id = request.id, method = %request.method, "sending request");
        match self.writer.send(request).await {
            Ok(()) => {}
            Err(ProbeError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                warn!("Server closed its input before '{}'", request.method);
                return Ok(Reply::NoResponse);
            }
            Err(e) => return Err(e),
        }

        let next = match self.read_timeout {
            Some(after) => tokio::time::timeout(after, self.reader.next())
                .await
                .map_err(|_| ProbeError::Timeout {
                    method: request.method.clone(),
                    after,
                })?,
            None => self.reader.next().await,
        };

        match next {
            Some(line) => {
                let line = line?;
                debug!("Received: {}", String::from_utf8_lossy(&line));
                Ok(Reply::from_line(&line))
            }
            None => {
                debug!("Server output closed");
                Ok(Reply::NoResponse)
            }
        }
    }

    /// Write a notification. Nothing is read back.
    pub async fn notify(&mut self, notification: &JsonRpcNotification) -> ProbeResult<()> {
        debug!(method = %notification.method, "sending notification");
        match self.writer.send(notification).await {
            Err(ProbeError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                warn!("Server closed its input before '{}'", notification.method);
                Ok(())
            }
            other => other,
        }
    }

    /// Terminate and reap the server. Later calls are no-ops returning `None`.
    pub async fn shutdown(&mut self) -> ProbeResult<Option<Termination>> {
        if self.terminated {
            return Ok(None);
        }
        self.terminated = true;
        debug!("Terminating server pid {:?}", self.process.pid());
        self.process.terminate().await.map(Some)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<R, W, P> Drop for Session<R, W, P> {
    fn drop(&mut self) {
        if !self.terminated {
            // Real children are killed on drop by the process handle itself
            warn!("Session dropped without shutdown");
        }
    }
}
