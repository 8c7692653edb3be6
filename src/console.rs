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

//! Human-readable trace of a probe run.
//!
//! This is the tool's actual output and goes to stdout. Diagnostics about the
//! probe itself go through `tracing` on stderr instead.

use serde_json::Value;
use std::io::{self, Stdout, Write};

use crate::jsonrpc::JsonRpcResponse;

pub struct Console<W: Write> {
    out: W,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }

    pub fn step(&mut self, number: usize, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n{}. {}", number, title)?;
        self.out.flush()
    }

    /// Unnumbered heading, used for notifications.
    pub fn heading(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n{}", title)?;
        self.out.flush()
    }

    pub fn sending(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "Sending: {}", line)?;
        self.out.flush()
    }

    pub fn raw(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "Raw: {}", line)?;
        self.out.flush()
    }

    pub fn received(&mut self, value: &Value) -> io::Result<()> {
        let pretty = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        writeln!(self.out, "Received: {}", pretty)?;
        self.out.flush()
    }

    pub fn no_response(&mut self) -> io::Result<()> {
        self.notice("No response received")
    }

    pub fn malformed(&mut self, raw: &str, error: &serde_json::Error) -> io::Result<()> {
        writeln!(self.out, "Malformed response ({}): {}", error, raw)?;
        self.out.flush()
    }

    /// One line per advertised tool from a `tools/list` result.
    pub fn tool_listing(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let Some(tools) = response
            .result
            .as_ref()
            .and_then(|r| r.get("tools"))
            .and_then(Value::as_array)
        else {
            return Ok(());
        };

        writeln!(self.out, "Found {} tools:", tools.len())?;
        for tool in tools {
            let name = tool.get("name").and_then(Value::as_str).unwrap_or("?");
            match tool.get("description").and_then(Value::as_str) {
                Some(desc) => writeln!(self.out, "  - {}: {}", name, desc)?,
                None => writeln!(self.out, "  - {}", name)?,
            }
        }
        self.out.flush()
    }

    /// Text items of a `tools/call` result, indented.
    pub fn tool_text(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let Some(content) = response
            .result
            .as_ref()
            .and_then(|r| r.get("content"))
            .and_then(Value::as_array)
        else {
            return Ok(());
        };

        for item in content {
            if item.get("type").and_then(Value::as_str) != Some("text") {
                continue;
            }
            if let Some(text) = item.get("text").and_then(Value::as_str) {
                for line in text.lines() {
                    writeln!(self.out, "    {}", line)?;
                }
            }
        }
        self.out.flush()
    }

    pub fn stderr_output(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\nStderr output:\n{}", text)?;
        self.out.flush()
    }
}
