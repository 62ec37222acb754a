//! Line-delimited JSON protocol spoken with an engine bridge process.
//!
//! Each request is one JSON object on one line of the bridge's stdin; each response is one JSON
//! object on one line of its stdout.
//!
//! ```text
//! -> {"op":"hello","protocol":1}
//! <- {"status":0,"output":"engine ready"}
//! -> {"op":"load_case","path":"case_data/case_NRE/ieee9.sav"}
//! <- {"status":0,"output":"Case loaded ..."}
//! -> {"op":"advance","to":1.0}
//! <- {"status":0,"output":"..."}
//! -> {"op":"read_channels","output":"results/.../run.outx"}
//! <- {"status":0,"output":"","channels":{"labels":[...],"samples":[[...]]}}
//! -> {"op":"shutdown"}
//! ```
//!
//! A response carrying `fault` means the engine raised; `output` is still forwarded to the
//! diagnostic buffer first.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stabsim_core::ChannelDump;
use std::path::PathBuf;

use crate::error::EngineFault;
use crate::session::{EngineCommand, EngineStatus};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeRequest {
    Hello { protocol: u32 },
    Command(EngineCommand),
    ReadChannels { output: PathBuf },
    Shutdown,
}

impl BridgeRequest {
    pub fn op(&self) -> &'static str {
        match self {
            BridgeRequest::Hello { .. } => "hello",
            BridgeRequest::Command(command) => command.op(),
            BridgeRequest::ReadChannels { .. } => "read_channels",
            BridgeRequest::Shutdown => "shutdown",
        }
    }

    /// Serializes the request as a single protocol line (no trailing newline).
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let value = match self {
            BridgeRequest::Hello { protocol } => json!({ "op": "hello", "protocol": protocol }),
            BridgeRequest::Command(command) => serde_json::to_value(command)?,
            BridgeRequest::ReadChannels { output } => {
                json!({ "op": "read_channels", "output": output })
            }
            BridgeRequest::Shutdown => json!({ "op": "shutdown" }),
        };
        serde_json::to_string(&value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub channels: Option<ChannelDump>,
    #[serde(default)]
    pub fault: Option<String>,
}

impl BridgeResponse {
    pub fn parse(line: &str) -> Result<Self, EngineFault> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(EngineFault::Protocol("empty response line".to_string()));
        }
        let response: BridgeResponse = serde_json::from_str(trimmed)?;
        if response.status.is_none() && response.fault.is_none() {
            return Err(EngineFault::Protocol(format!(
                "response has neither status nor fault: {trimmed}"
            )));
        }
        Ok(response)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus(self.status.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stabsim_core::Seconds;

    #[test]
    fn command_requests_are_single_lines() {
        let request = BridgeRequest::Command(EngineCommand::Advance { to: Seconds(20.0) });
        let line = request.to_line().unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["op"], "advance");
    }

    #[test]
    fn read_channels_request_names_output() {
        let request = BridgeRequest::ReadChannels {
            output: PathBuf::from("results/run.outx"),
        };
        let value: serde_json::Value = serde_json::from_str(&request.to_line().unwrap()).unwrap();
        assert_eq!(value["op"], "read_channels");
        assert_eq!(value["output"], "results/run.outx");
    }

    #[test]
    fn response_with_channels_parses() {
        let response = BridgeResponse::parse(
            r#"{"status":0,"output":"","channels":{"labels":["Time(s)","VOLT 5 [BUS5 230.00]"],"samples":[[0.0],[0.99]]}}"#,
        )
        .unwrap();
        let dump = response.channels.unwrap();
        assert_eq!(dump.channel_count(), 1);
        assert_eq!(dump.title, "");
    }

    #[test]
    fn response_without_status_or_fault_is_rejected() {
        assert!(BridgeResponse::parse(r#"{"output":"hello"}"#).is_err());
        assert!(BridgeResponse::parse("   ").is_err());
        assert!(BridgeResponse::parse("not json").is_err());
    }

    #[test]
    fn nonzero_status_is_preserved() {
        let response = BridgeResponse::parse(r#"{"status":4,"output":"Network not converged"}"#)
            .unwrap();
        assert_eq!(response.status(), EngineStatus(4));
    }
}
