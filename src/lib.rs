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

//! mcp-probe: a stdio smoke check for MCP servers.
//!
//! Launches a server as a child process, sends a fixed sequence of JSON-RPC
//! requests over its stdin, prints every reply line from its stdout, and
//! terminates it when done.

pub mod config;
pub mod console;
pub mod constants;
pub mod errors;
pub mod jsonrpc;
pub mod logging;
pub mod mcp;
pub mod probe;
pub mod script;
pub mod session;
