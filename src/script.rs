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

//! Exchange plans.
//!
//! A plan is the ordered list of messages a run sends. The built-in plan is
//! the four-step MCP smoke check (`initialize`, `tools/list`, and two
//! `tools/call`s); alternative plans can be loaded from YAML.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::config::ProbeConfig;
use crate::constants::{methods, tools};
use crate::errors::ProbeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Heading printed before the message is sent
    pub title: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Send as a notification: no id, no reply is read
    #[serde(default)]
    pub notify: bool,
}

impl Step {
    pub fn request(title: impl Into<String>, method: &str, params: Option<Value>) -> Self {
        Self {
            title: title.into(),
            method: method.to_string(),
            params,
            notify: false,
        }
    }

    pub fn notification(title: impl Into<String>, method: &str) -> Self {
        Self {
            title: title.into(),
            method: method.to_string(),
            params: None,
            notify: true,
        }
    }

    pub fn is_tool_listing(&self) -> bool {
        self.method == methods::TOOLS_LIST
    }

    pub fn is_tool_call(&self) -> bool {
        self.method == methods::TOOLS_CALL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    /// The built-in four-request smoke check.
    pub fn standard(config: &ProbeConfig) -> Self {
        let mut steps = vec![Step::request(
            "Sending initialize request...",
            methods::INITIALIZE,
            Some(json!({
                "protocolVersion": config.protocol_version,
                "capabilities": {},
                "clientInfo": {
                    "name": config.client_name,
                    "version": config.client_version
                }
            })),
        )];

        if config.send_initialized {
            steps.push(Step::notification(
                "Sending initialized notification...",
                methods::INITIALIZED,
            ));
        }

        steps.push(Step::request("Listing tools...", methods::TOOLS_LIST, None));
        steps.push(Step::request(
            format!("Calling {} tool...", tools::SYSTEM_INFORMATION),
            methods::TOOLS_CALL,
            Some(json!({
                "name": tools::SYSTEM_INFORMATION,
                "arguments": {}
            })),
        ));
        let mut domain_args = Map::new();
        domain_args.insert(
            tools::DOMAIN_ARGUMENT.to_string(),
            Value::String(config.domain.clone()),
        );
        steps.push(Step::request(
            format!("Calling {} tool...", tools::DOMAIN_AVAILABILITY),
            methods::TOOLS_CALL,
            Some(json!({
                "name": tools::DOMAIN_AVAILABILITY,
                "arguments": domain_args
            })),
        ));

        Self { steps }
    }

    pub fn from_yaml(text: &str) -> Result<Self, ProbeError> {
        let plan: Plan = serde_yaml_ng::from_str(text)
            .map_err(|e| ProbeError::Config(format!("invalid plan: {}", e)))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Config(format!("cannot read plan {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Plan from `--script` when given, otherwise the built-in one.
    pub fn for_config(config: &ProbeConfig) -> Result<Self, ProbeError> {
        match &config.script {
            Some(path) => Self::load(path),
            None => Ok(Self::standard(config)),
        }
    }

    fn validate(&self) -> Result<(), ProbeError> {
        if self.steps.is_empty() {
            return Err(ProbeError::Config("plan has no steps".to_string()));
        }
        if let Some(pos) = self.steps.iter().position(|s| s.method.trim().is_empty()) {
            return Err(ProbeError::Config(format!(
                "step {} has an empty method",
                pos + 1
            )));
        }
        Ok(())
    }
}
