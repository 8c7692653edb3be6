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

use crate::constants::{config as env_names, handshake, server, timing, tools};
use crate::errors::ProbeError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// What to do with a response line that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Stop the run (after cleanup) with a decode error
    #[default]
    Abort,
    /// Print the failure and carry on with the next step
    Continue,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub command: String,
    pub args: Vec<String>,
    pub log_level: String,
    pub log_format: String, // "json" or "text"
    pub startup_delay: Duration,
    pub step_delay: Duration,
    pub drain_delay: Duration,
    pub read_timeout: Option<Duration>,
    pub terminate_grace: Duration,
    pub protocol_version: String,
    pub client_name: String,
    pub client_version: String,
    pub domain: String,
    pub on_malformed: MalformedPolicy,
    pub send_initialized: bool,
    pub script: Option<PathBuf>,
}

impl ProbeConfig {
    pub fn from_env() -> Result<Self, ProbeError> {
        let defaults = Self::default();
        Ok(Self {
            log_level: env::var(env_names::ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_format: env::var(env_names::ENV_LOG_FORMAT).unwrap_or(defaults.log_format),
            startup_delay: millis_from_env(env_names::ENV_STARTUP_DELAY_MS)?
                .unwrap_or(defaults.startup_delay),
            step_delay: millis_from_env(env_names::ENV_STEP_DELAY_MS)?
                .unwrap_or(defaults.step_delay),
            drain_delay: millis_from_env(env_names::ENV_DRAIN_DELAY_MS)?
                .unwrap_or(defaults.drain_delay),
            read_timeout: millis_from_env(env_names::ENV_READ_TIMEOUT_MS)?,
            terminate_grace: millis_from_env(env_names::ENV_TERMINATE_GRACE_MS)?
                .unwrap_or(defaults.terminate_grace),
            protocol_version: env::var(env_names::ENV_PROTOCOL_VERSION)
                .unwrap_or(defaults.protocol_version),
            ..defaults
        })
    }

    /// Replace the launch command; an empty list keeps the default server.
    pub fn with_server_command(mut self, command_line: Vec<String>) -> Self {
        let mut parts = command_line.into_iter();
        if let Some(cmd) = parts.next() {
            self.command = cmd;
            self.args = parts.collect();
        }
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            command: server::DEFAULT_COMMAND.to_string(),
            args: server::DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            startup_delay: Duration::from_millis(timing::STARTUP_DELAY_MS),
            step_delay: Duration::from_millis(timing::STEP_DELAY_MS),
            drain_delay: Duration::from_millis(timing::DRAIN_DELAY_MS),
            read_timeout: None,
            terminate_grace: Duration::from_millis(timing::TERMINATE_GRACE_MS),
            protocol_version: handshake::PROTOCOL_VERSION.to_string(),
            client_name: handshake::CLIENT_NAME.to_string(),
            client_version: handshake::CLIENT_VERSION.to_string(),
            domain: tools::DEFAULT_DOMAIN.to_string(),
            on_malformed: MalformedPolicy::default(),
            send_initialized: false,
            script: None,
        }
    }
}

fn millis_from_env(name: &str) -> Result<Option<Duration>, ProbeError> {
    match env::var(name) {
        Ok(raw) => parse_millis(name, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

pub fn parse_millis(name: &str, raw: &str) -> Result<Duration, ProbeError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ProbeError::Config(format!("{} must be milliseconds, got '{}'", name, raw)))
}
