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

// Main entry point for mcp-probe
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use mcp_probe::config::{MalformedPolicy, ProbeConfig};
use mcp_probe::console::Console;
use mcp_probe::logging::{init_tracing, install_panic_hook};
use mcp_probe::probe;
use mcp_probe::script::Plan;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Milliseconds to wait after spawning before the first message
    #[arg(long)]
    startup_delay_ms: Option<u64>,

    /// Milliseconds to wait after each exchange
    #[arg(long)]
    step_delay_ms: Option<u64>,

    /// Milliseconds to wait before collecting the server's stderr
    #[arg(long)]
    drain_delay_ms: Option<u64>,

    /// Give up on a reply after this many milliseconds (default: wait forever)
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Milliseconds between SIGTERM and SIGKILL at shutdown
    #[arg(long)]
    terminate_grace_ms: Option<u64>,

    /// MCP protocol version sent in the handshake
    #[arg(long)]
    protocol_version: Option<String>,

    /// clientInfo.name sent in the handshake
    #[arg(long)]
    client_name: Option<String>,

    /// clientInfo.version sent in the handshake
    #[arg(long)]
    client_version: Option<String>,

    /// Domain passed to the DomainAvailability tool
    #[arg(long)]
    domain: Option<String>,

    /// Print undecodable reply lines and keep going instead of aborting
    #[arg(long)]
    continue_on_malformed: bool,

    /// Send notifications/initialized after the handshake
    #[arg(long)]
    send_initialized: bool,

    /// YAML exchange plan replacing the built-in one
    #[arg(long)]
    script: Option<PathBuf>,

    /// Log filter (e.g. "debug"); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: "text" or "json"
    #[arg(long)]
    log_format: Option<String>,

    /// Server command and arguments (default: java -jar build/libs/ultraRAG-1.0-SNAPSHOT.jar)
    #[arg(last = true)]
    server: Vec<String>,
}

impl Cli {
    fn apply(self, mut config: ProbeConfig) -> ProbeConfig {
        if let Some(ms) = self.startup_delay_ms {
            config.startup_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.step_delay_ms {
            config.step_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.drain_delay_ms {
            config.drain_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.terminate_grace_ms {
            config.terminate_grace = Duration::from_millis(ms);
        }
        if let Some(v) = self.protocol_version {
            config.protocol_version = v;
        }
        if let Some(v) = self.client_name {
            config.client_name = v;
        }
        if let Some(v) = self.client_version {
            config.client_version = v;
        }
        if let Some(v) = self.domain {
            config.domain = v;
        }
        if self.continue_on_malformed {
            config.on_malformed = MalformedPolicy::Continue;
        }
        if self.send_initialized {
            config.send_initialized = true;
        }
        if let Some(p) = self.script {
            config.script = Some(p);
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        if let Some(v) = self.log_format {
            config.log_format = v;
        }
        config.with_server_command(self.server)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    install_panic_hook();

    let config = ProbeConfig::from_env().context("Failed to load config from env")?;
    let config = cli.apply(config);

    if !init_tracing(&config) {
        eprintln!("Warning: tracing subscriber already installed");
    }

    let plan = Plan::for_config(&config)?;
    info!("Running {} step plan", plan.steps.len());

    let mut console = Console::stdout();
    match probe::run(&config, &plan, &mut console).await {
        Ok(report) => {
            info!(
                "Probe finished: {} exchanges, server exit {:?}",
                report.exchanges.len(),
                report.termination
            );
            Ok(())
        }
        Err(e) => {
            if e.is_server_fault() {
                error!("Server misbehaved: {}", e);
            } else {
                error!("Probe failed: {}", e);
            }
            Err(e.into())
        }
    }
}
