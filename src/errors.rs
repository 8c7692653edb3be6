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

// Error taxonomy for a probe run

use std::time::Duration;
use thiserror::Error;

/// Main error type for the probe
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The server process could not be launched
    #[error("Failed to spawn server process: {0}")]
    Spawn(String),

    /// Signalling or reaping the server process failed
    #[error("Process error: {0}")]
    Process(String),

    /// A stdio pipe was not captured at spawn time
    #[error("Server {0} pipe is not available")]
    PipeUnavailable(&'static str),

    /// I/O Error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound message could not be serialized
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// A response line was not valid JSON
    #[error("Malformed response {raw:?}: {source}")]
    Decode {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// No line arrived within the configured read timeout
    #[error("No response to '{method}' within {after:?}")]
    Timeout { method: String, after: Duration },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProbeError {
    /// Whether the error came from the server's output rather than from the probe.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, ProbeError::Decode { .. } | ProbeError::Timeout { .. })
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
