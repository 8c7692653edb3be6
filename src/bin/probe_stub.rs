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

// Canned MCP server over stdio, used by the integration tests.
//
//   probe_stub [--replies N] [--garbage-at N] [--stderr TEXT]
//
// --replies N     answer N requests, then exit (closing stdout)
// --garbage-at N  answer request N (0-based) with a non-JSON line
// --stderr TEXT   write TEXT to stderr on startup

use clap::Parser;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    replies: Option<usize>,
    #[arg(long)]
    garbage_at: Option<usize>,
    #[arg(long)]
    stderr: Option<String>,
}

fn main() {
    let args = Args::parse();
    if let Some(text) = &args.stderr {
        eprintln!("{}", text);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut answered = 0usize;

    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let Ok(msg) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        // Notifications get no reply
        let Some(id) = msg.get("id").cloned() else {
            continue;
        };
        if args.replies.is_some_and(|max| answered >= max) {
            break;
        }

        if args.garbage_at == Some(answered) {
            let _ = writeln!(stdout, "this is not json");
        } else {
            let _ = writeln!(stdout, "{}", respond(&msg, id));
        }
        let _ = stdout.flush();
        answered += 1;
    }
}

fn respond(msg: &Value, id: Value) -> Value {
    let method = msg.get("method").and_then(Value::as_str).unwrap_or_default();
    match method {
        "initialize" => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "probe-stub", "version": "0.1.0"}
            }
        }),
        "tools/list" => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "tools": [
                    {"name": "SystemInformation", "description": "Reports host details"},
                    {"name": "DomainAvailability", "description": "Checks whether a domain is free"}
                ]
            }
        }),
        "tools/call" => {
            let params = msg.get("params").cloned().unwrap_or(Value::Null);
            let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
            let text = match name {
                "SystemInformation" => "os: stub\ncpus: 1".to_string(),
                "DomainAvailability" => {
                    let domain = params
                        .pointer("/arguments/value")
                        .and_then(Value::as_str)
                        .unwrap_or("?");
                    format!("{} available: false", domain)
                }
                other => format!("unknown tool {}", other),
            };
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {"content": [{"type": "text", "text": text}]}
            })
        }
        _ => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": "Method not found"}
        }),
    }
}
