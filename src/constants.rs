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

//! mcp-probe Constants - Single source of truth for literals and defaults.
//!
//! Wire literals, default timings and environment variable names live here
//! so the fixed exchange plan and the configuration layer agree.

/// JSON-RPC 2.0 wire literals
pub mod jsonrpc {
    /// Value of the `jsonrpc` field on every outbound message
    pub const VERSION: &str = "2.0";
    /// First id handed out by the sequencer
    pub const FIRST_ID: u64 = 0;
}

/// MCP Protocol Methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Values sent by the built-in exchange plan
pub mod handshake {
    pub const PROTOCOL_VERSION: &str = "2024-11-05";
    pub const CLIENT_NAME: &str = "test";
    pub const CLIENT_VERSION: &str = "1.0";
}

/// Tools invoked by the built-in exchange plan
pub mod tools {
    pub const SYSTEM_INFORMATION: &str = "SystemInformation";
    pub const DOMAIN_AVAILABILITY: &str = "DomainAvailability";
    /// Argument key carrying the domain name
    pub const DOMAIN_ARGUMENT: &str = "value";
    pub const DEFAULT_DOMAIN: &str = "digitalmatrix.com";
}

/// Default timings in milliseconds
pub mod timing {
    /// Wait after spawn before the first message
    pub const STARTUP_DELAY_MS: u64 = 2000;
    /// Wait after each exchange
    pub const STEP_DELAY_MS: u64 = 1000;
    /// Wait before collecting stderr
    pub const DRAIN_DELAY_MS: u64 = 2000;
    /// Grace period between SIGTERM and SIGKILL
    pub const TERMINATE_GRACE_MS: u64 = 5000;
}

/// Default server launch command
pub mod server {
    pub const DEFAULT_COMMAND: &str = "java";
    pub const DEFAULT_ARGS: &[&str] = &["-jar", "build/libs/ultraRAG-1.0-SNAPSHOT.jar"];
}

/// Configuration Environment Variables
pub mod config {
    pub const ENV_LOG_LEVEL: &str = "MCP_PROBE_LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "MCP_PROBE_LOG_FORMAT";
    pub const ENV_STARTUP_DELAY_MS: &str = "MCP_PROBE_STARTUP_DELAY_MS";
    pub const ENV_STEP_DELAY_MS: &str = "MCP_PROBE_STEP_DELAY_MS";
    pub const ENV_DRAIN_DELAY_MS: &str = "MCP_PROBE_DRAIN_DELAY_MS";
    pub const ENV_READ_TIMEOUT_MS: &str = "MCP_PROBE_READ_TIMEOUT_MS";
    pub const ENV_TERMINATE_GRACE_MS: &str = "MCP_PROBE_TERMINATE_GRACE_MS";
    pub const ENV_PROTOCOL_VERSION: &str = "MCP_PROBE_PROTOCOL_VERSION";
}

/// Transport Limits
pub mod limits {
    /// Maximum accepted response line (10 MB)
    pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;
}
