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

//! The probe run.
//!
//! Spawn the server, give it time to boot, walk the plan one exchange at a
//! time, surface whatever it wrote to stderr, then terminate it. Termination
//! runs on every path out of the exchange phase, including errors.

use serde_json::Value;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{MalformedPolicy, ProbeConfig};
use crate::console::Console;
use crate::errors::{ProbeError, ProbeResult};
use crate::jsonrpc::{IdSequence, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::mcp::process::{ProcessControl, ServerProcess, Termination};
use crate::mcp::stderr::StderrCapture;
use crate::script::{Plan, Step};
use crate::session::{Reply, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Response(Value),
    NoResponse,
    /// Raw line that failed to decode (only with `MalformedPolicy::Continue`)
    Malformed(String),
    /// Notification sent, nothing expected back
    Notified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub method: String,
    pub id: Option<u64>,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct ProbeReport {
    pub exchanges: Vec<Exchange>,
    pub stderr: String,
    pub termination: Option<Termination>,
}

impl ProbeReport {
    pub fn responses(&self) -> impl Iterator<Item = &Value> {
        self.exchanges.iter().filter_map(|e| match &e.outcome {
            Outcome::Response(v) => Some(v),
            _ => None,
        })
    }
}

/// Launch the configured server and run the plan against it.
pub async fn run<C: Write>(
    config: &ProbeConfig,
    plan: &Plan,
    console: &mut Console<C>,
) -> ProbeResult<ProbeReport> {
    console.notice("Starting MCP server...")?;
    info!("Launching {} {:?}", config.command, config.args);

    let server = ServerProcess::spawn(&config.command, &config.args, config.terminate_grace)?;
    let stderr = StderrCapture::spawn(server.stderr);
    let session = Session::new(
        server.stdout,
        server.stdin,
        server.process,
        config.read_timeout,
    );

    drive(session, Some(stderr), config, plan, console).await
}

/// Run the plan over an established session and always shut it down.
pub async fn drive<R, W, P, C>(
    mut session: Session<R, W, P>,
    mut stderr: Option<StderrCapture>,
    config: &ProbeConfig,
    plan: &Plan,
    console: &mut Console<C>,
) -> ProbeResult<ProbeReport>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    P: ProcessControl,
    C: Write,
{
    let outcome = exchange(&mut session, stderr.as_mut(), config, plan, console).await;

    if let Err(e) = console.notice("\nTerminating server...") {
        warn!("console unavailable during shutdown: {}", e);
    }
    let termination = session.shutdown().await;

    match (outcome, termination) {
        (Ok(mut report), Ok(termination)) => {
            report.termination = termination;
            Ok(report)
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(shutdown_err)) => {
            warn!("Shutdown after failed run also failed: {}", shutdown_err);
            Err(e)
        }
    }
}

async fn exchange<R, W, P, C>(
    session: &mut Session<R, W, P>,
    stderr: Option<&mut StderrCapture>,
    config: &ProbeConfig,
    plan: &Plan,
    console: &mut Console<C>,
) -> ProbeResult<ProbeReport>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    P: ProcessControl,
    C: Write,
{
    let mut report = ProbeReport::default();
    let mut ids = IdSequence::new();
    let mut number = 0;

    sleep(config.startup_delay).await;

    for step in &plan.steps {
        // Only requests are numbered
        let record = if step.notify {
            console.heading(&step.title)?;
            let notification = JsonRpcNotification::new(&step.method, step.params.clone());
            console.sending(&serde_json::to_string(&notification)?)?;
            session.notify(&notification).await?;
            Exchange {
                method: step.method.clone(),
                id: None,
                outcome: Outcome::Notified,
            }
        } else {
            number += 1;
            console.step(number, &step.title)?;
            let request = JsonRpcRequest::new(ids.next_id(), &step.method, step.params.clone());
            console.sending(&serde_json::to_string(&request)?)?;
            let reply = session.send_request(&request).await?;
            Exchange {
                method: step.method.clone(),
                id: Some(request.id),
                outcome: handle_reply(reply, step, request.id, config, console)?,
            }
        };
        report.exchanges.push(record);

        sleep(config.step_delay).await;
    }

    sleep(config.drain_delay).await;

    if let Some(capture) = stderr {
        let text = capture.collect();
        if !text.is_empty() {
            console.stderr_output(&text)?;
        }
        report.stderr = text;
    }

    Ok(report)
}

fn handle_reply<C: Write>(
    reply: Reply,
    step: &Step,
    request_id: u64,
    config: &ProbeConfig,
    console: &mut Console<C>,
) -> ProbeResult<Outcome> {
    match reply {
        Reply::Received { raw, value } => {
            console.raw(&raw)?;
            console.received(&value)?;
            if let Some(response) = JsonRpcResponse::view(&value) {
                if !response.answers(request_id) {
                    warn!(
                        "Response id {} does not match request id {}",
                        response.id, request_id
                    );
                }
                if step.is_tool_listing() {
                    console.tool_listing(&response)?;
                } else if step.is_tool_call() {
                    console.tool_text(&response)?;
                }
            }
            Ok(Outcome::Response(value))
        }
        Reply::NoResponse => {
            console.no_response()?;
            Ok(Outcome::NoResponse)
        }
        Reply::Malformed { raw, error } => match config.on_malformed {
            MalformedPolicy::Abort => Err(ProbeError::Decode { raw, source: error }),
            MalformedPolicy::Continue => {
                console.malformed(&raw, &error)?;
                Ok(Outcome::Malformed(raw))
            }
        },
    }
}
